//! Training Parameters
//!
//! Defines `TrainParam`, the configuration of a training run, and the JSON
//! IO shared by parameters, data configurations and trained trees.
use crate::constants::DEFAULT_MAX_DEPTH;
use crate::criterion::Criterion;
use crate::errors::ArborError;
use crate::utils::validate_positive_float_parameter;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_min_dispersion() -> f64 {
    0.0
}
fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}
fn default_parallel() -> bool {
    true
}
fn default_num_threads() -> Option<usize> {
    None
}

/// Configuration of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainParam {
    /// Split criterion. The target column's kind takes precedence when they disagree.
    pub criterion: Criterion,
    /// Stop splitting once the node's impurity or standard deviation is at or below this.
    #[serde(default = "default_min_dispersion")]
    pub min_dispersion: f64,
    /// Maximum depth of the tree, `0` gives a single leaf.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Search feature columns in parallel.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Number of threads for the parallel search, rayon's global pool when unset.
    #[serde(default = "default_num_threads")]
    pub num_threads: Option<usize>,
}

impl Default for TrainParam {
    fn default() -> Self {
        TrainParam {
            criterion: Criterion::Gini,
            min_dispersion: default_min_dispersion(),
            max_depth: default_max_depth(),
            parallel: default_parallel(),
            num_threads: default_num_threads(),
        }
    }
}

impl TrainParam {
    // Set methods for paramters

    /// Set the criterion.
    /// * `criterion` - Gini impurity for classification, standard deviation for regression.
    pub fn set_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the minimum dispersion.
    /// * `min_dispersion` - Nodes at or below this impurity or standard deviation become leaves.
    pub fn set_min_dispersion(mut self, min_dispersion: f64) -> Self {
        self.min_dispersion = min_dispersion;
        self
    }

    /// Set the maximum depth.
    /// * `max_depth` - Depth limit of the tree.
    pub fn set_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set whether split search runs in parallel.
    pub fn set_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the number of threads on the training pool.
    /// * `num_threads` - Set the number of threads to be used during training.
    pub fn set_num_threads(mut self, num_threads: Option<usize>) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn validate(&self) -> Result<(), ArborError> {
        validate_positive_float_parameter(self.min_dispersion, "min_dispersion")?;
        if self.min_dispersion.is_infinite() {
            return Err(ArborError::InvalidParameter(
                "min_dispersion".to_string(),
                "a finite value".to_string(),
                self.min_dispersion.to_string(),
            ));
        }
        if let Some(0) = self.num_threads {
            return Err(ArborError::InvalidParameter(
                "num_threads".to_string(),
                "at least one thread".to_string(),
                "0".to_string(),
            ));
        }
        Ok(())
    }
}

/// IO
pub trait JsonIO: Serialize + DeserializeOwned + Sized {
    /// Save as a json object to a file.
    ///
    /// * `path` - Path to save to.
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ArborError> {
        fs::write(path, self.json_dump()?).map_err(|e| ArborError::UnableToWrite(e.to_string()))
    }

    /// Dump as a json object.
    fn json_dump(&self) -> Result<String, ArborError> {
        serde_json::to_string(self).map_err(|e| ArborError::UnableToWrite(e.to_string()))
    }

    /// Load from Json string
    ///
    /// * `json_str` - String object, which can be serialized to json.
    fn from_json(json_str: &str) -> Result<Self, ArborError> {
        serde_json::from_str::<Self>(json_str).map_err(|e| ArborError::UnableToRead(e.to_string()))
    }

    /// Load from a path to a json object.
    ///
    /// * `path` - Path to load from.
    fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArborError> {
        let json_str = fs::read_to_string(path).map_err(|e| ArborError::UnableToRead(e.to_string()))?;
        Self::from_json(&json_str)
    }
}

impl JsonIO for TrainParam {}
