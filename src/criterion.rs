//! Criterion
//!
//! Impurity and dispersion measures used to score a node and the gain of a candidate
//! partition. Classification targets are scored with Gini impurity, regression targets
//! with the population standard deviation.
use crate::errors::ArborError;
use crate::node::LeafValue;
use crate::utils::items_to_strings;
use crate::value::ValueKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// Rounding steps allowed per accumulated value before a variance counts as spread.
const VARIANCE_ROUNDING: f64 = 4.0;

/// Splitting criterion for growing the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    /// Gini impurity of the class labels.
    Gini,
    /// Standard deviation of the target measurements.
    Variance,
}

impl Criterion {
    /// The criterion matching a target column of the given kind.
    pub fn for_kind(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Category => Criterion::Gini,
            ValueKind::Measurement => Criterion::Variance,
        }
    }

    /// The target kind this criterion scores.
    pub fn target_kind(&self) -> ValueKind {
        match self {
            Criterion::Gini => ValueKind::Category,
            Criterion::Variance => ValueKind::Measurement,
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Criterion::Gini => write!(f, "gini"),
            Criterion::Variance => write!(f, "variance"),
        }
    }
}

impl FromStr for Criterion {
    type Err = ArborError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gini" => Ok(Criterion::Gini),
            "variance" => Ok(Criterion::Variance),
            _ => Err(ArborError::ParseString(
                s.to_string(),
                "Criterion".to_string(),
                items_to_strings(vec!["gini", "variance"]),
            )),
        }
    }
}

/// Gini impurity `1 - sum(p_c^2)` of a set of class counts.
pub fn gini_impurity(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    let correct = counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>();
    (1.0 - correct).max(0.0)
}

/// Population standard deviation from running sums.
///
/// A variance within the rounding error of the sums is reported as exactly `0`.
pub fn standard_deviation(count: usize, sum: f64, sum_sq: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let n = count as f64;
    let mean = sum / n;
    let mean_sq = sum_sq / n;
    let variance = mean_sq - mean * mean;
    if variance <= VARIANCE_ROUNDING * n * f64::EPSILON * mean_sq {
        0.0
    } else {
        variance.sqrt()
    }
}

/// Population standard deviation of a slice of values.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// Reduction of the criterion achieved by partitioning a node.
///
/// * `parent` - Criterion value of the node being split.
/// * `n_left`, `left` - Size and criterion value of the left subset.
/// * `n_right`, `right` - Size and criterion value of the right subset.
#[inline]
pub fn split_gain(parent: f64, n_left: usize, left: f64, n_right: usize, right: f64) -> f64 {
    let n = (n_left + n_right) as f64;
    if n == 0.0 {
        return 0.0;
    }
    parent - (n_left as f64 / n * left + n_right as f64 / n * right)
}

/// Running statistics of the target values reaching a node.
///
/// Implementations are chosen once per training run, so split search
/// is monomorphised for the target kind instead of dispatching per row.
pub trait TargetStats: Clone + Send + Sync {
    /// Target value in the representation the accumulator works with.
    type Target: Copy + Send + Sync;

    /// An empty accumulator shaped like this one.
    fn empty(&self) -> Self;
    fn add(&mut self, target: Self::Target);
    /// Fold the rows accumulated in `other` into `self`.
    fn merge(&mut self, other: &Self);
    fn count(&self) -> usize;
    /// Impurity or dispersion of the accumulated targets.
    fn criterion_value(&self) -> f64;
    /// Aggregated prediction of the accumulated targets.
    ///
    /// * `classes` - Class id of every dense class index, empty for regression.
    fn leaf_value(&self, classes: &[i64]) -> LeafValue;

    /// Accumulate the targets of the rows in `index`.
    fn collect(&self, targets: &[Self::Target], index: &[usize]) -> Self {
        let mut stats = self.empty();
        for i in index {
            stats.add(targets[*i]);
        }
        stats
    }
}

/// Class frequencies over dense class indices.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassCounts {
    counts: Vec<usize>,
    total: usize,
}

impl ClassCounts {
    pub fn new(n_classes: usize) -> Self {
        ClassCounts {
            counts: vec![0; n_classes],
            total: 0,
        }
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }
}

impl TargetStats for ClassCounts {
    type Target = usize;

    fn empty(&self) -> Self {
        ClassCounts::new(self.counts.len())
    }

    #[inline]
    fn add(&mut self, target: usize) {
        self.counts[target] += 1;
        self.total += 1;
    }

    fn merge(&mut self, other: &Self) {
        for (a, b) in self.counts.iter_mut().zip(other.counts.iter()) {
            *a += b;
        }
        self.total += other.total;
    }

    #[inline]
    fn count(&self) -> usize {
        self.total
    }

    #[inline]
    fn criterion_value(&self) -> f64 {
        gini_impurity(&self.counts)
    }

    fn leaf_value(&self, classes: &[i64]) -> LeafValue {
        let total = self.total as f64;
        let distribution: BTreeMap<i64, f64> = self
            .counts
            .iter()
            .zip(classes.iter())
            .filter(|(c, _)| **c > 0)
            .map(|(c, class)| (*class, *c as f64 / total))
            .collect();
        LeafValue::Distribution(distribution)
    }
}

/// Count, sum and sum of squares of the target measurements.
///
/// Sums are taken relative to a reference target, the first one of the node
/// the statistics were collected for, so they stay on the scale of the spread
/// rather than of the targets.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Moments {
    count: usize,
    shift: f64,
    sum: f64,
    sum_sq: f64,
}

impl Moments {
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.shift + self.sum / self.count as f64
        }
    }
}

impl TargetStats for Moments {
    type Target = f64;

    fn empty(&self) -> Self {
        Moments {
            shift: self.shift,
            ..Moments::default()
        }
    }

    #[inline]
    fn add(&mut self, target: f64) {
        let d = target - self.shift;
        self.count += 1;
        self.sum += d;
        self.sum_sq += d * d;
    }

    fn merge(&mut self, other: &Self) {
        if self.count == 0 {
            *self = *other;
            return;
        }
        // Move the other sums onto this reference first.
        let delta = other.shift - self.shift;
        let n = other.count as f64;
        self.count += other.count;
        self.sum += other.sum + n * delta;
        self.sum_sq += other.sum_sq + 2.0 * delta * other.sum + n * delta * delta;
    }

    #[inline]
    fn count(&self) -> usize {
        self.count
    }

    #[inline]
    fn criterion_value(&self) -> f64 {
        standard_deviation(self.count, self.sum, self.sum_sq)
    }

    fn leaf_value(&self, _classes: &[i64]) -> LeafValue {
        LeafValue::Mean(self.mean())
    }

    fn collect(&self, targets: &[f64], index: &[usize]) -> Self {
        let mut stats = Moments {
            shift: index.first().map_or(0.0, |&i| targets[i]),
            ..Moments::default()
        };
        for &i in index {
            stats.add(targets[i]);
        }
        stats
    }
}
