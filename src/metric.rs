use crate::constants::{MAPD_DENOMINATOR_FLOOR, REGRESSION_KEY, TARGET_COLUMN};
use crate::data::Row;
use crate::errors::ArborError;
use crate::node::Prediction;
use crate::utils::{first_max_by, items_to_strings};
use crate::value::{Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type MetricFn = fn(&[Row], &[Prediction]) -> Result<f64, ArborError>;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Recall,
    MeanAbsolutePercentageDeviation,
}

impl Metric {
    /// Metric used to score predictions of a target of the given kind.
    pub fn for_kind(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Category => Metric::Recall,
            ValueKind::Measurement => Metric::MeanAbsolutePercentageDeviation,
        }
    }
}

impl FromStr for Metric {
    type Err = ArborError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "recall" | "accuracy" => Ok(Metric::Recall),
            "mapd" | "meanabsolutepercentagedeviation" => Ok(Metric::MeanAbsolutePercentageDeviation),
            _ => Err(ArborError::ParseString(
                s.to_string(),
                "Metric".to_string(),
                items_to_strings(vec!["recall", "accuracy", "mapd"]),
            )),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Metric::Recall => write!(f, "REC"),
            Metric::MeanAbsolutePercentageDeviation => write!(f, "MAPD"),
        }
    }
}

pub fn metric_callables(metric_type: &Metric) -> (MetricFn, bool) {
    match metric_type {
        Metric::Recall => (RecallMetric::calculate_metric, RecallMetric::maximize()),
        Metric::MeanAbsolutePercentageDeviation => (
            MeanAbsolutePercentageDeviationMetric::calculate_metric,
            MeanAbsolutePercentageDeviationMetric::maximize(),
        ),
    }
}

pub trait EvaluationMetric {
    fn calculate_metric(rows: &[Row], preds: &[Prediction]) -> Result<f64, ArborError>;
    fn maximize() -> bool;
}

pub struct RecallMetric {}
impl EvaluationMetric for RecallMetric {
    fn calculate_metric(rows: &[Row], preds: &[Prediction]) -> Result<f64, ArborError> {
        recall(rows, preds)
    }
    fn maximize() -> bool {
        true
    }
}

pub struct MeanAbsolutePercentageDeviationMetric {}
impl EvaluationMetric for MeanAbsolutePercentageDeviationMetric {
    fn calculate_metric(rows: &[Row], preds: &[Prediction]) -> Result<f64, ArborError> {
        mean_absolute_percentage_deviation(rows, preds)
    }
    fn maximize() -> bool {
        false
    }
}

/// Class with the highest probability, the lowest class id on ties.
/// `None` for an empty prediction.
pub fn arg_max(pred: &Prediction) -> Option<i64> {
    let entries: Vec<(&i64, &f64)> = pred.iter().collect();
    first_max_by(&entries, |(_, p)| **p).map(|i| *entries[i].0)
}

fn check_lengths(rows: &[Row], preds: &[Prediction]) -> Result<(), ArborError> {
    if rows.len() != preds.len() {
        return Err(ArborError::InvalidParameter(
            "predictions".to_string(),
            format!("one prediction for each of the {} rows", rows.len()),
            preds.len().to_string(),
        ));
    }
    if rows.is_empty() {
        return Err(ArborError::InsufficientData);
    }
    Ok(())
}

fn target(row_idx: usize, row: &[Value]) -> Result<&Value, ArborError> {
    row.get(TARGET_COLUMN).ok_or_else(|| ArborError::MalformedRow {
        row: row_idx,
        reason: "row has no target column".to_string(),
    })
}

/// Fraction of rows whose most probable class is the class in the target column.
pub fn recall(rows: &[Row], preds: &[Prediction]) -> Result<f64, ArborError> {
    check_lengths(rows, preds)?;
    let mut hits = 0usize;
    for (k, (row, pred)) in rows.iter().zip(preds).enumerate() {
        let y = target(k, row)?.category()?;
        if arg_max(pred) == Some(y) {
            hits += 1;
        }
    }
    Ok(hits as f64 / rows.len() as f64)
}

/// Mean of `|prediction - y| / max(floor, y)` over all rows.
pub fn mean_absolute_percentage_deviation(rows: &[Row], preds: &[Prediction]) -> Result<f64, ArborError> {
    check_lengths(rows, preds)?;
    let mut total = 0.0;
    for (k, (row, pred)) in rows.iter().zip(preds).enumerate() {
        let y = target(k, row)?.measurement()?;
        let yhat = pred.get(&REGRESSION_KEY).ok_or_else(|| ArborError::MalformedRow {
            row: k,
            reason: "prediction holds no regression value".to_string(),
        })?;
        total += (yhat - y).abs() / y.max(MAPD_DENOMINATOR_FLOOR);
    }
    Ok(total / rows.len() as f64)
}

/// Score predictions with the metric matching the kind of the rows' target column.
pub fn evaluate_predictions(rows: &[Row], preds: &[Prediction]) -> Result<(Metric, f64), ArborError> {
    check_lengths(rows, preds)?;
    let metric = Metric::for_kind(target(0, &rows[0])?.kind());
    let (metric_fn, _) = metric_callables(&metric);
    Ok((metric, metric_fn(rows, preds)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::precision_round;
    use std::collections::BTreeMap;

    #[test]
    fn test_arg_max() {
        assert_eq!(arg_max(&BTreeMap::from([(0, 0.2), (3, 0.5), (7, 0.3)])), Some(3));
        assert_eq!(arg_max(&BTreeMap::from([(4, 0.5), (2, 0.5)])), Some(2));
        assert_eq!(arg_max(&BTreeMap::new()), None);
    }

    #[test]
    fn test_recall() {
        let rows: Vec<Row> = vec![0, 1, 1, 2]
            .into_iter()
            .map(|c| vec![Value::Category(c), Value::Measurement(0.0)])
            .collect();
        let preds = vec![
            BTreeMap::from([(0, 1.0)]),
            BTreeMap::from([(0, 0.4), (1, 0.6)]),
            BTreeMap::from([(0, 0.5), (1, 0.5)]),
            BTreeMap::from([(2, 1.0)]),
        ];
        assert_eq!(recall(&rows, &preds).unwrap(), 0.75);
        assert!(matches!(
            mean_absolute_percentage_deviation(&rows, &preds),
            Err(ArborError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_mean_absolute_percentage_deviation() {
        let rows: Vec<Row> = vec![100.0, 200.0, 0.0]
            .into_iter()
            .map(|y| vec![Value::Measurement(y)])
            .collect();
        let preds = vec![
            BTreeMap::from([(0, 110.0)]),
            BTreeMap::from([(0, 150.0)]),
            BTreeMap::from([(0, 0.0)]),
        ];
        let res = mean_absolute_percentage_deviation(&rows, &preds).unwrap();
        assert_eq!(precision_round(res, 6), 0.116667);

        let near_zero = vec![vec![Value::Measurement(0.0)]];
        let res = mean_absolute_percentage_deviation(&near_zero, &[BTreeMap::from([(0, 1e-5)])]).unwrap();
        assert_eq!(precision_round(res, 6), 1.0);
    }

    #[test]
    fn test_metric_input_checks() {
        let rows = vec![vec![Value::Measurement(1.0)]];
        assert!(matches!(recall(&[], &[]), Err(ArborError::InsufficientData)));
        assert!(matches!(
            mean_absolute_percentage_deviation(&rows, &[]),
            Err(ArborError::InvalidParameter(..))
        ));
        assert!(matches!(
            mean_absolute_percentage_deviation(&rows, &[BTreeMap::from([(1, 1.0)])]),
            Err(ArborError::MalformedRow { row: 0, .. })
        ));
    }

    #[test]
    fn test_evaluate_predictions() {
        let rows = vec![vec![Value::Category(1)], vec![Value::Category(0)]];
        let preds = vec![BTreeMap::from([(1, 1.0)]), BTreeMap::from([(1, 1.0)])];
        let (metric, score) = evaluate_predictions(&rows, &preds).unwrap();
        assert_eq!(metric, Metric::Recall);
        assert_eq!(score, 0.5);

        let rows = vec![vec![Value::Measurement(10.0)]];
        let preds = vec![BTreeMap::from([(0, 12.0)])];
        let (metric, score) = evaluate_predictions(&rows, &preds).unwrap();
        assert_eq!(metric, Metric::MeanAbsolutePercentageDeviation);
        assert_eq!(precision_round(score, 6), 0.2);
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!(Metric::from_str("accuracy").unwrap(), Metric::Recall);
        assert_eq!(Metric::from_str("MAPD").unwrap(), Metric::MeanAbsolutePercentageDeviation);
        assert!(Metric::from_str("AUC").is_err());
        let (_, maximize) = metric_callables(&Metric::Recall);
        assert!(maximize);
    }
}
