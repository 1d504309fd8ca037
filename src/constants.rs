/// Column reserved for the target value of every row.
pub const TARGET_COLUMN: usize = 0;
/// Gain a candidate split must exceed to be usable.
pub const MIN_SPLIT_GAIN: f64 = 1e-12;
/// Floor applied to the denominator of the percentage deviation metric.
pub const MAPD_DENOMINATOR_FLOOR: f64 = 1e-5;
/// Maximum depth used when none is configured.
pub const DEFAULT_MAX_DEPTH: usize = 5;
/// Key under which a regression prediction is reported.
pub const REGRESSION_KEY: i64 = 0;
/// File names of the training and test sets in a dataset directory.
pub const TRAIN_FILE: &str = "train.csv";
pub const TEST_FILE: &str = "test.csv";
