//! Tree Prediction Methods
//!
//! Traversal of a trained tree, from the root down to the leaf each row falls in.
use super::tree::DecisionTree;
use crate::data::Row;
use crate::errors::ArborError;
use crate::node::{Node, Prediction};
use crate::value::Value;
use rayon::prelude::*;

impl DecisionTree {
    fn find_leaf(&self, row_idx: usize, row: &[Value]) -> Result<&Node, ArborError> {
        let mut node_idx = 0;
        loop {
            let node = &self.nodes[node_idx];
            match node.get_child_idx(row_idx, row)? {
                Some(child_idx) => node_idx = child_idx,
                None => return Ok(node),
            }
        }
    }

    fn predict_row(&self, row_idx: usize, row: &[Value]) -> Result<Prediction, ArborError> {
        Ok(self.find_leaf(row_idx, row)?.value.prediction())
    }

    /// Predict every row, in input order.
    ///
    /// Classification trees return each leaf's class distribution, regression
    /// trees a single entry `{0: mean}`.
    pub fn evaluate(&self, rows: &[Row]) -> Result<Vec<Prediction>, ArborError> {
        self.check_trained()?;
        rows.iter()
            .enumerate()
            .map(|(i, row)| self.predict_row(i, row))
            .collect()
    }

    /// Same as `evaluate`, with the rows spread over the rayon thread pool.
    pub fn evaluate_parallel(&self, rows: &[Row]) -> Result<Vec<Prediction>, ArborError> {
        self.check_trained()?;
        rows.par_iter()
            .enumerate()
            .map(|(i, row)| self.predict_row(i, row))
            .collect()
    }

    /// Predict a single row.
    pub fn evaluate_row(&self, row: &[Value]) -> Result<Prediction, ArborError> {
        self.check_trained()?;
        self.predict_row(0, row)
    }

    /// Number of the leaf a row falls in.
    pub fn leaf_index(&self, row: &[Value]) -> Result<usize, ArborError> {
        self.check_trained()?;
        Ok(self.find_leaf(0, row)?.num)
    }
}

#[cfg(test)]
mod tests {
    use crate::criterion::Criterion;
    use crate::data::Row;
    use crate::errors::ArborError;
    use crate::param::TrainParam;
    use crate::tree::tree::DecisionTree;
    use crate::value::Value;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::thread;

    fn class_rows(data: &[(i64, f64)]) -> Vec<Row> {
        data.iter()
            .map(|(y, x)| vec![Value::Category(*y), Value::Measurement(*x)])
            .collect()
    }

    #[test]
    fn test_evaluate_classification() {
        let rows = class_rows(&[(0, 0.0), (0, 0.0), (1, 1.0), (1, 1.0)]);
        let mut tree = DecisionTree::new();
        tree.train(&rows, &TrainParam::default().set_max_depth(1)).unwrap();

        let queries = class_rows(&[(0, 0.0), (1, 1.0)]);
        let preds = tree.evaluate(&queries).unwrap();
        assert_eq!(preds[0], BTreeMap::from([(0, 1.0)]));
        assert_eq!(preds[1], BTreeMap::from([(1, 1.0)]));
    }

    #[test]
    fn test_evaluate_regression() {
        let rows: Vec<Row> = [(10.0, 1.0), (10.0, 2.0), (20.0, 3.0), (20.0, 4.0)]
            .iter()
            .map(|(y, x)| vec![Value::Measurement(*y), Value::Measurement(*x)])
            .collect();
        let mut tree = DecisionTree::new();
        let param = TrainParam::default().set_criterion(Criterion::Variance).set_max_depth(1);
        tree.train(&rows, &param).unwrap();

        let preds = tree.evaluate(&rows).unwrap();
        assert_eq!(preds[0], BTreeMap::from([(0, 10.0)]));
        assert_eq!(preds[1], BTreeMap::from([(0, 10.0)]));
        assert_eq!(preds[2], BTreeMap::from([(0, 20.0)]));
        assert_eq!(preds[3], BTreeMap::from([(0, 20.0)]));
    }

    #[test]
    fn test_evaluate_not_trained() {
        let tree = DecisionTree::new();
        let rows = class_rows(&[(0, 0.0)]);
        assert!(matches!(tree.evaluate(&rows), Err(ArborError::NotTrained)));
        assert!(matches!(tree.evaluate_parallel(&rows), Err(ArborError::NotTrained)));
        assert!(matches!(tree.evaluate_row(&rows[0]), Err(ArborError::NotTrained)));
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let rows = class_rows(&[(0, 0.0), (1, 0.3), (0, 0.7), (1, 1.0), (2, 1.4), (2, 2.0)]);
        let mut tree = DecisionTree::new();
        tree.train(&rows, &TrainParam::default().set_max_depth(3)).unwrap();
        let first = tree.evaluate(&rows).unwrap();
        let second = tree.evaluate(&rows).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, tree.evaluate_parallel(&rows).unwrap());
    }

    #[test]
    fn test_evaluate_empty_rows() {
        let rows = class_rows(&[(0, 0.0), (1, 1.0)]);
        let mut tree = DecisionTree::new();
        tree.train(&rows, &TrainParam::default()).unwrap();
        assert!(tree.evaluate(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_evaluate_malformed_rows() {
        let rows = class_rows(&[(0, 0.0), (0, 0.0), (1, 1.0), (1, 1.0)]);
        let mut tree = DecisionTree::new();
        tree.train(&rows, &TrainParam::default()).unwrap();

        let short = vec![vec![Value::Category(0), Value::Measurement(0.0)], vec![Value::Category(0)]];
        assert!(matches!(
            tree.evaluate(&short),
            Err(ArborError::MalformedRow { row: 1, .. })
        ));
        let wrong_kind = vec![vec![Value::Category(0), Value::Category(0)]];
        assert!(matches!(
            tree.evaluate(&wrong_kind),
            Err(ArborError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_leaf_index() {
        let rows = class_rows(&[(0, 0.0), (0, 0.0), (1, 1.0), (1, 1.0)]);
        let mut tree = DecisionTree::new();
        tree.train(&rows, &TrainParam::default()).unwrap();
        assert_eq!(tree.leaf_index(&rows[0]).unwrap(), 1);
        assert_eq!(tree.leaf_index(&rows[3]).unwrap(), 2);
        assert_eq!(tree.evaluate_row(&rows[3]).unwrap(), BTreeMap::from([(1, 1.0)]));
    }

    #[test]
    fn test_evaluate_shared_across_threads() {
        let rows = class_rows(&[(0, 0.0), (1, 0.3), (0, 0.7), (1, 1.0), (2, 1.4), (2, 2.0)]);
        let mut tree = DecisionTree::new();
        tree.train(&rows, &TrainParam::default()).unwrap();
        let expected = tree.evaluate(&rows).unwrap();

        let tree = Arc::new(tree);
        let rows = Arc::new(rows);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let tree = Arc::clone(&tree);
                let rows = Arc::clone(&rows);
                thread::spawn(move || tree.evaluate(&rows).unwrap())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    }
}
