//! Splitter
//!
//! Exhaustive search for the best binary partition of a node's rows. Measurement
//! features are split at midpoints between consecutive distinct values, category
//! features one-vs-rest.
use crate::constants::MIN_SPLIT_GAIN;
use crate::criterion::{split_gain, TargetStats};
use crate::data::Row;
use crate::errors::ArborError;
use crate::node::SplitRule;
use crate::value::ValueKind;
use hashbrown::HashMap;
use rayon::prelude::*;

/// Everything split search needs to know about the training data.
pub struct SplitContext<'a, S: TargetStats> {
    /// Training rows, addressed through node indices.
    pub rows: &'a [Row],
    /// Encoded target of every training row.
    pub targets: &'a [S::Target],
    /// Feature columns and their kinds, in ascending column order.
    pub features: &'a [(usize, ValueKind)],
    /// Search the features on the rayon thread pool.
    pub parallel: bool,
}

/// The best partition found for a node.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitInfo {
    pub feature: usize,
    pub rule: SplitRule,
    pub gain: f64,
    pub n_left: usize,
    pub n_right: usize,
}

#[inline]
fn is_better(gain: f64, best: &Option<SplitInfo>) -> bool {
    gain > MIN_SPLIT_GAIN && best.as_ref().map_or(true, |b| gain > b.gain)
}

/// Threshold halfway between two consecutive distinct values,
/// always satisfying `lower <= t < upper`.
#[inline]
pub fn midpoint(lower: f64, upper: f64) -> f64 {
    let m = lower / 2.0 + upper / 2.0;
    if m < lower || m >= upper {
        lower
    } else {
        m
    }
}

/// Find the best split of the rows in `index` over every feature.
///
/// Returns `None` when no candidate has positive gain, which tells the
/// trainer to emit a leaf. Ties go to the lowest feature column, then to
/// the first candidate in ascending threshold or category order.
///
/// * `ctx` - Training rows, targets and features.
/// * `index` - Rows reaching the node.
/// * `node_stats` - Target statistics of those rows.
pub fn find_best_split<S: TargetStats>(
    ctx: &SplitContext<S>,
    index: &[usize],
    node_stats: &S,
) -> Result<Option<SplitInfo>, ArborError> {
    if index.len() < 2 {
        return Ok(None);
    }
    let parent = node_stats.criterion_value();
    let per_feature: Vec<Option<SplitInfo>> = if ctx.parallel {
        ctx.features
            .par_iter()
            .map(|&(feature, kind)| best_feature_split(ctx, index, node_stats, parent, feature, kind))
            .collect::<Result<Vec<_>, ArborError>>()?
    } else {
        ctx.features
            .iter()
            .map(|&(feature, kind)| best_feature_split(ctx, index, node_stats, parent, feature, kind))
            .collect::<Result<Vec<_>, ArborError>>()?
    };

    let mut best: Option<SplitInfo> = None;
    for info in per_feature.into_iter().flatten() {
        if is_better(info.gain, &best) {
            best = Some(info);
        }
    }
    Ok(best)
}

fn best_feature_split<S: TargetStats>(
    ctx: &SplitContext<S>,
    index: &[usize],
    node_stats: &S,
    parent: f64,
    feature: usize,
    kind: ValueKind,
) -> Result<Option<SplitInfo>, ArborError> {
    match kind {
        ValueKind::Measurement => best_threshold_split(ctx, index, node_stats, parent, feature),
        ValueKind::Category => best_category_split(ctx, index, node_stats, parent, feature),
    }
}

fn best_threshold_split<S: TargetStats>(
    ctx: &SplitContext<S>,
    index: &[usize],
    node_stats: &S,
    parent: f64,
    feature: usize,
) -> Result<Option<SplitInfo>, ArborError> {
    let mut pairs = index
        .iter()
        .map(|&i| -> Result<(f64, S::Target), ArborError> {
            Ok((ctx.rows[i][feature].measurement()?, ctx.targets[i]))
        })
        .collect::<Result<Vec<_>, ArborError>>()?;
    // Stable, so equal values keep the node's row order. NaN never goes left
    // under a threshold rule, so every NaN sorts after the numbers.
    pairs.sort_by(|a, b| a.0.is_nan().cmp(&b.0.is_nan()).then(a.0.total_cmp(&b.0)));

    // suffix[k] holds the targets of pairs[k..].
    let mut suffix = Vec::with_capacity(pairs.len());
    let mut acc = node_stats.empty();
    for &(_, t) in pairs.iter().rev() {
        acc.add(t);
        suffix.push(acc.clone());
    }
    suffix.reverse();

    let mut left = node_stats.empty();
    let mut best = None;
    for k in 0..pairs.len() - 1 {
        let (v, t) = pairs[k];
        left.add(t);
        let next = pairs[k + 1].0;
        if v == next || v.is_nan() || next.is_nan() {
            continue;
        }
        let right = &suffix[k + 1];
        let gain = split_gain(
            parent,
            left.count(),
            left.criterion_value(),
            right.count(),
            right.criterion_value(),
        );
        if is_better(gain, &best) {
            best = Some(SplitInfo {
                feature,
                rule: SplitRule::Threshold(midpoint(v, next)),
                gain,
                n_left: left.count(),
                n_right: right.count(),
            });
        }
    }
    Ok(best)
}

fn best_category_split<S: TargetStats>(
    ctx: &SplitContext<S>,
    index: &[usize],
    node_stats: &S,
    parent: f64,
    feature: usize,
) -> Result<Option<SplitInfo>, ArborError> {
    let mut groups: HashMap<i64, S> = HashMap::new();
    for &i in index {
        let c = ctx.rows[i][feature].category()?;
        groups
            .entry(c)
            .or_insert_with(|| node_stats.empty())
            .add(ctx.targets[i]);
    }
    // A single category can't be partitioned.
    if groups.len() < 2 {
        return Ok(None);
    }
    let mut categories: Vec<i64> = groups.keys().copied().collect();
    categories.sort_unstable();
    let stats: Vec<&S> = categories.iter().map(|c| &groups[c]).collect();

    // Every category but one, built from the groups before and after it.
    let mut after = vec![node_stats.empty(); stats.len()];
    for i in (0..stats.len() - 1).rev() {
        let mut acc = after[i + 1].clone();
        acc.merge(stats[i + 1]);
        after[i] = acc;
    }

    let mut before = node_stats.empty();
    let mut best = None;
    for (i, c) in categories.iter().enumerate() {
        let left = stats[i];
        let mut right = before.clone();
        right.merge(&after[i]);
        let gain = split_gain(
            parent,
            left.count(),
            left.criterion_value(),
            right.count(),
            right.criterion_value(),
        );
        if is_better(gain, &best) {
            best = Some(SplitInfo {
                feature,
                rule: SplitRule::Equals(*c),
                gain,
                n_left: left.count(),
                n_right: right.count(),
            });
        }
        before.merge(left);
    }
    Ok(best)
}

/// Partition `index` by a split rule, keeping the original order on each side.
pub fn partition(
    rows: &[Row],
    index: &[usize],
    feature: usize,
    rule: &SplitRule,
) -> Result<(Vec<usize>, Vec<usize>), ArborError> {
    let mut left = Vec::with_capacity(index.len());
    let mut right = Vec::with_capacity(index.len());
    for &i in index {
        if rule.goes_left(&rows[i][feature])? {
            left.push(i);
        } else {
            right.push(i);
        }
    }
    Ok((left, right))
}
