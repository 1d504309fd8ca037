use crate::constants::TARGET_COLUMN;
use crate::criterion::{ClassCounts, Criterion, Moments, TargetStats};
use crate::data::{Row, Schema};
use crate::errors::ArborError;
use crate::node::{Node, NodeKind, StopReason};
use crate::param::{JsonIO, TrainParam};
use crate::splitter::{find_best_split, partition, SplitContext};
use crate::value::ValueKind;
use hashbrown::HashMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A CART decision tree.
///
/// A tree starts untrained; `train` grows it from a dataset and may be
/// called again to replace it. Once trained the tree is only read, so it
/// can be evaluated from many threads at once.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct DecisionTree {
    /// Nodes in depth-first order, the root at index `0`.
    pub nodes: Vec<Node>,
    pub schema: Option<Schema>,
    pub criterion: Option<Criterion>,
    pub depth: usize,
    pub n_leaves: usize,
}

impl DecisionTree {
    pub fn new() -> Self {
        DecisionTree::default()
    }

    /// Grow the tree on a dataset, replacing any previously trained tree.
    ///
    /// Column `0` of every row is the target; its kind picks the criterion,
    /// Gini impurity for categories and standard deviation for measurements.
    /// On error the previous tree is left as it was.
    ///
    /// * `dataset` - Training rows, all sharing the arity and column kinds of the first row.
    /// * `param` - Training parameters.
    pub fn train(&mut self, dataset: &[Row], param: &TrainParam) -> Result<(), ArborError> {
        param.validate()?;
        if dataset.is_empty() {
            return Err(ArborError::InsufficientData);
        }
        let schema = Schema::from_rows(dataset)?;
        let target_kind = schema.target_kind();
        let criterion = Criterion::for_kind(target_kind);
        if criterion != param.criterion {
            warn!(
                "Criterion {} does not fit a {} target, training with {} instead.",
                param.criterion, target_kind, criterion
            );
        }
        let features: Vec<(usize, ValueKind)> = schema
            .feature_columns()
            .into_iter()
            .map(|c| (c, schema.kinds[c]))
            .collect();

        info!(
            "Training on {} rows with {} features, criterion {}, max depth {}.",
            dataset.len(),
            schema.n_features(),
            criterion,
            param.max_depth
        );

        let nodes = match param.num_threads {
            Some(num_threads) if param.parallel => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build()
                    .map_err(|e| {
                        ArborError::InvalidParameter(
                            "num_threads".to_string(),
                            "a thread count the pool can be built with".to_string(),
                            e.to_string(),
                        )
                    })?;
                pool.install(|| grow_nodes(dataset, &features, criterion, param))?
            }
            _ => grow_nodes(dataset, &features, criterion, param)?,
        };

        let depth = nodes.iter().map(|n| n.depth).max().unwrap_or(0);
        let n_leaves = nodes.iter().filter(|n| n.is_leaf()).count();
        *self = DecisionTree {
            nodes,
            schema: Some(schema),
            criterion: Some(criterion),
            depth,
            n_leaves,
        };
        info!(
            "Trained tree with {} nodes, {} leaves and depth {}.",
            self.nodes.len(),
            self.n_leaves,
            self.depth
        );
        Ok(())
    }

    pub fn is_trained(&self) -> bool {
        !self.nodes.is_empty()
    }

    pub(crate) fn check_trained(&self) -> Result<(), ArborError> {
        if self.is_trained() {
            Ok(())
        } else {
            Err(ArborError::NotTrained)
        }
    }

    pub fn root(&self) -> Result<&Node, ArborError> {
        self.nodes.first().ok_or(ArborError::NotTrained)
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Kind of the target column the tree was trained on.
    pub fn target_kind(&self) -> Result<ValueKind, ArborError> {
        self.schema
            .as_ref()
            .map(|s| s.target_kind())
            .ok_or(ArborError::NotTrained)
    }

    pub fn leaves(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_leaf())
    }

    /// Count weighted mean of the leaves' impurity or dispersion,
    /// the criterion measured over the whole training set.
    pub fn training_dispersion(&self) -> Result<f64, ArborError> {
        self.check_trained()?;
        let (weighted, count) = self
            .leaves()
            .fold((0.0, 0usize), |(w, c), n| (w + n.dispersion * n.count as f64, c + n.count));
        Ok(weighted / count as f64)
    }

    /// Check child links point forward and inside the node list,
    /// which rules out cycles and dangling children.
    fn check_structure(&self) -> Result<(), ArborError> {
        for (i, node) in self.nodes.iter().enumerate() {
            if node.num != i {
                return Err(ArborError::UnableToRead(format!(
                    "node {} is stored at position {}",
                    node.num, i
                )));
            }
            if let NodeKind::Internal {
                feature,
                left_child,
                right_child,
                ..
            } = node.kind
            {
                let in_range = |c: usize| c > i && c < self.nodes.len();
                if feature == TARGET_COLUMN || !in_range(left_child) || !in_range(right_child) {
                    return Err(ArborError::UnableToRead(format!("node {} has an invalid split", i)));
                }
            }
        }
        Ok(())
    }
}

impl JsonIO for DecisionTree {
    fn json_dump(&self) -> Result<String, ArborError> {
        self.check_trained()?;
        serde_json::to_string(self).map_err(|e| ArborError::UnableToWrite(e.to_string()))
    }

    fn from_json(json_str: &str) -> Result<Self, ArborError> {
        let tree = serde_json::from_str::<Self>(json_str).map_err(|e| ArborError::UnableToRead(e.to_string()))?;
        tree.check_structure()?;
        Ok(tree)
    }
}

impl Display for DecisionTree {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut print_buffer: Vec<usize> = if self.nodes.is_empty() { Vec::new() } else { vec![0] };
        let mut r = String::new();
        while let Some(idx) = print_buffer.pop() {
            let node = &self.nodes[idx];
            r += format!("{}{}\n", "      ".repeat(node.depth).as_str(), node).as_str();
            if let NodeKind::Internal {
                left_child,
                right_child,
                ..
            } = node.kind
            {
                print_buffer.push(right_child);
                print_buffer.push(left_child);
            }
        }
        write!(f, "{}", r)
    }
}

/// Encode class ids as dense indices into the sorted list of distinct classes.
fn encode_classes(rows: &[Row]) -> Result<(Vec<usize>, Vec<i64>), ArborError> {
    let ids = rows
        .iter()
        .map(|r| r[TARGET_COLUMN].category())
        .collect::<Result<Vec<i64>, ArborError>>()?;
    let mut classes = ids.clone();
    classes.sort_unstable();
    classes.dedup();
    let lookup: HashMap<i64, usize> = classes.iter().enumerate().map(|(i, c)| (*c, i)).collect();
    Ok((ids.iter().map(|c| lookup[c]).collect(), classes))
}

fn grow_nodes(
    rows: &[Row],
    features: &[(usize, ValueKind)],
    criterion: Criterion,
    param: &TrainParam,
) -> Result<Vec<Node>, ArborError> {
    let index: Vec<usize> = (0..rows.len()).collect();
    match criterion {
        Criterion::Gini => {
            let (targets, classes) = encode_classes(rows)?;
            let proto = ClassCounts::new(classes.len());
            TreeGrower::new(rows, &targets, features, classes, proto, param).grow_all(index)
        }
        Criterion::Variance => {
            let targets = rows
                .iter()
                .map(|r| r[TARGET_COLUMN].measurement())
                .collect::<Result<Vec<f64>, ArborError>>()?;
            TreeGrower::new(rows, &targets, features, Vec::new(), Moments::default(), param).grow_all(index)
        }
    }
}

/// Depth-first tree growth for one target kind.
struct TreeGrower<'a, S: TargetStats> {
    ctx: SplitContext<'a, S>,
    classes: Vec<i64>,
    proto: S,
    max_depth: usize,
    min_dispersion: f64,
    nodes: Vec<Node>,
}

impl<'a, S: TargetStats> TreeGrower<'a, S> {
    fn new(
        rows: &'a [Row],
        targets: &'a [S::Target],
        features: &'a [(usize, ValueKind)],
        classes: Vec<i64>,
        proto: S,
        param: &TrainParam,
    ) -> Self {
        TreeGrower {
            ctx: SplitContext {
                rows,
                targets,
                features,
                parallel: param.parallel,
            },
            classes,
            proto,
            max_depth: param.max_depth,
            min_dispersion: param.min_dispersion,
            nodes: Vec::new(),
        }
    }

    fn grow_all(mut self, index: Vec<usize>) -> Result<Vec<Node>, ArborError> {
        self.grow(index, 0)?;
        Ok(self.nodes)
    }

    /// Grow the subtree over `index`, returning the number of its root node.
    fn grow(&mut self, index: Vec<usize>, depth: usize) -> Result<usize, ArborError> {
        let stats = self.proto.collect(self.ctx.targets, &index);
        let num = self.nodes.len();
        let dispersion = stats.criterion_value();
        // Nodes start as leaves and are turned into parents once both children exist.
        self.nodes.push(Node::leaf(
            num,
            depth,
            stats.count(),
            dispersion,
            stats.leaf_value(&self.classes),
            StopReason::NoUsableSplit,
        ));

        if depth >= self.max_depth {
            return Ok(self.finish_leaf(num, StopReason::MaxDepth));
        }
        if dispersion <= self.min_dispersion {
            return Ok(self.finish_leaf(num, StopReason::MinDispersion));
        }
        if index.len() < 2 {
            return Ok(self.finish_leaf(num, StopReason::TooFewRows));
        }

        let split = match find_best_split(&self.ctx, &index, &stats)? {
            Some(split) => split,
            None => return Ok(self.finish_leaf(num, StopReason::NoUsableSplit)),
        };
        let (left, right) = partition(self.ctx.rows, &index, split.feature, &split.rule)?;
        if left.is_empty() || right.is_empty() {
            return Ok(self.finish_leaf(num, StopReason::NoUsableSplit));
        }
        drop(index);

        debug!(
            "Split node {} at depth {} on feature {} {} with gain {}.",
            num, depth, split.feature, split.rule, split.gain
        );
        let left_child = self.grow(left, depth + 1)?;
        let right_child = self.grow(right, depth + 1)?;
        self.nodes[num].make_parent_node(split.feature, split.rule, split.gain, left_child, right_child);
        Ok(num)
    }

    fn finish_leaf(&mut self, num: usize, stopper: StopReason) -> usize {
        let node = &mut self.nodes[num];
        debug!("Leaf {} at depth {} with {} rows: {}.", num, node.depth, node.count, stopper);
        node.kind = NodeKind::Leaf { stopper };
        num
    }
}
