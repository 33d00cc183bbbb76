//! Variation scoring and ranking of numeric columns.
//!
//! Each eligible column gets a [`VariationScore`]:
//!
//! - `std` - sample standard deviation of the present values
//! - `range` - `max - min`
//! - `combined_score` - `std * range`
//!
//! Columns are ranked by `combined_score`, highest first. Equal scores
//! keep the table's column order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::Table;

/// Variation metrics of one column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct VariationScore {
    pub std: f64,
    pub range: f64,
    pub combined_score: f64,
}

impl VariationScore {
    /// Score of the given values, `None` when there is no value at all.
    ///
    /// A single value has zero spread.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let n = values.len();
        if n == 0 {
            return None;
        }

        let mean = values.iter().sum::<f64>() / n as f64;
        let std = if n > 1 {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        } else {
            0.0
        };

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;

        Some(Self {
            std,
            range,
            combined_score: std * range,
        })
    }
}

/// Scores of every eligible column, in column order.
///
/// Eligible: numeric, not in `exclude`, at least one present finite value.
/// Non-finite values are ignored.
pub fn column_variations(table: &Table, exclude: &[&str]) -> Vec<(String, VariationScore)> {
    table
        .columns()
        .iter()
        .filter(|c| !exclude.contains(&c.name()))
        .filter_map(|c| {
            let present: Vec<f64> = c
                .as_numeric()?
                .iter()
                .flatten()
                .copied()
                .filter(|v| v.is_finite())
                .collect();
            VariationScore::from_values(&present).map(|score| (c.name().to_string(), score))
        })
        .collect()
}

/// Sort scored columns by `combined_score`, highest first, keep `top_n`.
///
/// The sort is stable. NaN scores rank after every other score.
pub fn rank_variations(
    mut variations: Vec<(String, VariationScore)>,
    top_n: usize,
) -> Vec<(String, VariationScore)> {
    variations.sort_by(|(_, a), (_, b)| descending(a.combined_score, b.combined_score));
    variations.truncate(top_n);
    variations
}

/// The `top_n` most varying column names of `table`.
pub fn rank_columns(table: &Table, exclude: &[&str], top_n: usize) -> Vec<String> {
    rank_variations(column_variations(table, exclude), top_n)
        .into_iter()
        .map(|(name, _)| name)
        .collect()
}

fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => b.total_cmp(&a),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (true, true) => Ordering::Equal,
    }
}
