use crate::constants::REGRESSION_KEY;
use crate::errors::ArborError;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Prediction for one row: class id to probability, or `{0: mean}` for regression.
pub type Prediction = BTreeMap<i64, f64>;

/// Rule an internal node applies to its split feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SplitRule {
    /// `feature <= threshold` goes left, everything else right.
    Threshold(f64),
    /// `feature == category` goes left, every other category right.
    Equals(i64),
}

impl SplitRule {
    /// Whether a value is sent to the left child.
    #[inline]
    pub fn goes_left(&self, v: &Value) -> Result<bool, ArborError> {
        match self {
            SplitRule::Threshold(t) => Ok(v.measurement()? <= *t),
            SplitRule::Equals(c) => Ok(v.category()? == *c),
        }
    }
}

impl fmt::Display for SplitRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SplitRule::Threshold(t) => write!(f, "<= {}", t),
            SplitRule::Equals(c) => write!(f, "== {}", c),
        }
    }
}

/// Aggregated target statistics of the training rows reaching a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LeafValue {
    /// Relative class frequencies, summing to one.
    Distribution(BTreeMap<i64, f64>),
    /// Arithmetic mean of the target measurements.
    Mean(f64),
}

impl LeafValue {
    /// The leaf statistics in the uniform prediction shape.
    pub fn prediction(&self) -> Prediction {
        match self {
            LeafValue::Distribution(d) => d.clone(),
            LeafValue::Mean(m) => BTreeMap::from([(REGRESSION_KEY, *m)]),
        }
    }
}

impl fmt::Display for LeafValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LeafValue::Distribution(d) => {
                let parts: Vec<String> = d.iter().map(|(c, p)| format!("{}:{:.4}", c, p)).collect();
                write!(f, "{{{}}}", parts.join(","))
            }
            LeafValue::Mean(m) => write!(f, "{:.4}", m),
        }
    }
}

/// Why growth stopped at a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    MaxDepth,
    MinDispersion,
    TooFewRows,
    NoUsableSplit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            StopReason::MaxDepth => "max depth reached",
            StopReason::MinDispersion => "dispersion below minimum",
            StopReason::TooFewRows => "fewer than two rows",
            StopReason::NoUsableSplit => "no usable split",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Leaf {
        stopper: StopReason,
    },
    Internal {
        feature: usize,
        rule: SplitRule,
        gain: f64,
        left_child: usize,
        right_child: usize,
    },
}

/// A node of a trained tree.
///
/// Every node keeps the statistics of the rows that reached it; only
/// leaves are used for prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub num: usize,
    pub depth: usize,
    pub count: usize,
    pub dispersion: f64,
    pub value: LeafValue,
    pub kind: NodeKind,
}

impl Node {
    /// Create a leaf, nodes start as leaves until they are split.
    pub fn leaf(num: usize, depth: usize, count: usize, dispersion: f64, value: LeafValue, stopper: StopReason) -> Self {
        Node {
            num,
            depth,
            count,
            dispersion,
            value,
            kind: NodeKind::Leaf { stopper },
        }
    }

    /// Turn this node into an internal node with the given split and children.
    pub fn make_parent_node(&mut self, feature: usize, rule: SplitRule, gain: f64, left_child: usize, right_child: usize) {
        self.kind = NodeKind::Internal {
            feature,
            rule,
            gain,
            left_child,
            right_child,
        };
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    /// Get the path that should be traveled down, given a row.
    /// Returns `None` when this node is a leaf.
    ///
    /// * `row_idx` - Position of the row, reported if it is too short.
    /// * `row` - The row being traversed.
    pub fn get_child_idx(&self, row_idx: usize, row: &[Value]) -> Result<Option<usize>, ArborError> {
        match &self.kind {
            NodeKind::Leaf { .. } => Ok(None),
            NodeKind::Internal {
                feature,
                rule,
                left_child,
                right_child,
                ..
            } => {
                let v = row.get(*feature).ok_or_else(|| ArborError::MalformedRow {
                    row: row_idx,
                    reason: format!("feature column {} is out of range for a row of {} columns", feature, row.len()),
                })?;
                if rule.goes_left(v)? {
                    Ok(Some(*left_child))
                } else {
                    Ok(Some(*right_child))
                }
            }
        }
    }
}

impl fmt::Display for Node {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            NodeKind::Leaf { .. } => write!(f, "{}:leaf={},count={}", self.num, self.value, self.count),
            NodeKind::Internal {
                feature,
                rule,
                gain,
                left_child,
                right_child,
            } => write!(
                f,
                "{}:[{} {}] yes={},no={},gain={:.6},count={}",
                self.num, feature, rule, left_child, right_child, gain, self.count
            ),
        }
    }
}
