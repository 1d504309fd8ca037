mod node;

// Modules
pub mod constants;
pub mod criterion;
pub mod data;
pub mod errors;
pub mod loader;
pub mod metric;
pub mod param;
pub mod splitter;
pub mod tree;
pub mod utils;
pub mod value;

// Individual classes, and functions
pub use criterion::Criterion;
pub use data::{Row, Schema};
pub use errors::ArborError;
pub use loader::{ColumnSpec, DataConfig};
pub use node::{LeafValue, Node, NodeKind, Prediction, SplitRule, StopReason};
pub use param::{JsonIO, TrainParam};
pub use tree::tree::DecisionTree;
pub use value::{Value, ValueKind};
