//! Data
//!
//! Rows of typed values and the per-column schema every row of a dataset shares.
use crate::constants::TARGET_COLUMN;
use crate::errors::ArborError;
use crate::value::{Value, ValueKind};
use serde::{Deserialize, Serialize};

/// An ordered, fixed-length sequence of values. Column `0` holds the target.
pub type Row = Vec<Value>;

/// Column kinds shared by every row of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub kinds: Vec<ValueKind>,
}

impl Schema {
    /// Establish the schema from a single row.
    pub fn from_row(row: &[Value]) -> Result<Self, ArborError> {
        if row.is_empty() {
            return Err(ArborError::MalformedRow {
                row: 0,
                reason: "a row needs at least the target column".to_string(),
            });
        }
        Ok(Schema {
            kinds: row.iter().map(|v| v.kind()).collect(),
        })
    }

    /// Establish the schema from the first row and check all others against it.
    pub fn from_rows(rows: &[Row]) -> Result<Self, ArborError> {
        let first = rows.first().ok_or(ArborError::InsufficientData)?;
        let schema = Schema::from_row(first)?;
        for (i, row) in rows.iter().enumerate().skip(1) {
            schema.check(i, row)?;
        }
        Ok(schema)
    }

    /// Check a row's arity and column kinds against the schema.
    ///
    /// * `index` - Position of the row, used in the error message.
    /// * `row` - The row to check.
    pub fn check(&self, index: usize, row: &[Value]) -> Result<(), ArborError> {
        if row.len() != self.n_columns() {
            return Err(ArborError::MalformedRow {
                row: index,
                reason: format!("expected {} columns, found {}", self.n_columns(), row.len()),
            });
        }
        for (col, (v, k)) in row.iter().zip(self.kinds.iter()).enumerate() {
            if v.kind() != *k {
                return Err(ArborError::MalformedRow {
                    row: index,
                    reason: format!("column {} should hold a {} value, found {}", col, k, v.kind()),
                });
            }
        }
        Ok(())
    }

    pub fn target_kind(&self) -> ValueKind {
        self.kinds[TARGET_COLUMN]
    }

    /// Number of columns, the target included.
    pub fn n_columns(&self) -> usize {
        self.kinds.len()
    }

    pub fn n_features(&self) -> usize {
        self.kinds.len() - 1
    }

    /// Indices of the feature columns, in ascending order.
    pub fn feature_columns(&self) -> Vec<usize> {
        (0..self.kinds.len()).filter(|c| *c != TARGET_COLUMN).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(target: i64, x: f64, c: i64) -> Row {
        vec![Value::Category(target), Value::Measurement(x), Value::Category(c)]
    }

    #[test]
    fn test_schema_from_rows() {
        let rows = vec![row(0, 1.0, 2), row(1, 2.0, 3)];
        let schema = Schema::from_rows(&rows).unwrap();
        assert_eq!(schema.target_kind(), ValueKind::Category);
        assert_eq!(schema.n_columns(), 3);
        assert_eq!(schema.n_features(), 2);
        assert_eq!(schema.feature_columns(), vec![1, 2]);
    }

    #[test]
    fn test_schema_empty() {
        let rows: Vec<Row> = Vec::new();
        assert!(matches!(Schema::from_rows(&rows), Err(ArborError::InsufficientData)));
        assert!(matches!(Schema::from_row(&[]), Err(ArborError::MalformedRow { .. })));
    }

    #[test]
    fn test_schema_rejects_wrong_arity() {
        let rows = vec![row(0, 1.0, 2), vec![Value::Category(1), Value::Measurement(1.0)]];
        match Schema::from_rows(&rows) {
            Err(ArborError::MalformedRow { row, .. }) => assert_eq!(row, 1),
            other => panic!("Unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_schema_rejects_wrong_kind() {
        let rows = vec![
            row(0, 1.0, 2),
            row(1, 2.0, 3),
            vec![Value::Category(1), Value::Category(1), Value::Category(3)],
        ];
        match Schema::from_rows(&rows) {
            Err(ArborError::MalformedRow { row, reason }) => {
                assert_eq!(row, 2);
                assert!(reason.contains("column 1"));
            }
            other => panic!("Unexpected result {:?}", other),
        }
    }
}
