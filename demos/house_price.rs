//! House Prices – Regression at Increasing Depths
//! ==============================================
//! Predict the sale price of a house from a handful of numeric and
//! categorical columns, training three trees of increasing maximum depth
//! and reporting the mean absolute percentage deviation (MAPD) on the
//! training and test sets.
//!
//! The dataset directory must hold `train.csv` and `test.csv`. It is read
//! from the first argument, or from `$DATASET_ROOT_DIR/house_price`.
//!
//! ```bash
//! RUST_LOG=arbor=info cargo run --release --example house_price -- /data/house_price
//! ```

use arbor::loader::load_train_test;
use arbor::metric::evaluate_predictions;
use arbor::{Criterion, DataConfig, DecisionTree, Row, TrainParam};
use std::env;
use std::error::Error;
use std::path::PathBuf;

const DEPTHS: [usize; 3] = [3, 10, 50];

fn dataset_dir() -> Result<PathBuf, Box<dyn Error>> {
    if let Some(dir) = env::args().nth(1) {
        return Ok(PathBuf::from(dir));
    }
    let root = env::var("DATASET_ROOT_DIR")
        .map_err(|_| "pass the dataset directory as an argument or set DATASET_ROOT_DIR")?;
    Ok(PathBuf::from(root).join("house_price"))
}

fn report(tree: &DecisionTree, name: &str, rows: &[Row]) -> Result<(), Box<dyn Error>> {
    let preds = tree.evaluate(rows)?;
    let (metric, score) = evaluate_predictions(rows, &preds)?;
    println!("  {:<5} {}: {:.4}", name, metric, score);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "arbor=info".into()),
        )
        .init();

    let config = DataConfig::house_price();
    let (train, test) = load_train_test(dataset_dir()?, &config)?;
    println!("Loaded {} training rows and {} test rows.", train.len(), test.len());

    let base = TrainParam::default()
        .set_criterion(Criterion::for_kind(config.target_kind()?))
        .set_min_dispersion(0.1);

    for depth in DEPTHS {
        let mut tree = DecisionTree::new();
        tree.train(&train, &base.clone().set_max_depth(depth))?;
        println!(
            "max_depth {}: {} nodes, {} leaves, depth {}",
            depth,
            tree.n_nodes(),
            tree.n_leaves,
            tree.depth
        );
        report(&tree, "train", &train)?;
        report(&tree, "test", &test)?;
    }
    Ok(())
}
