//! Gap-based segmentation of a table into contiguous runs.
//!
//! # Algorithm
//!
//! ```text
//! timestamps:  0   0.05 | 0.2  0.25 | 1.0          threshold = 0.1
//!              └──────┘   └───────┘   └─┘
//!              segment    segment     singleton, discarded
//! ```
//!
//! Rows are stably sorted by the timestamp column. A new segment opens
//! wherever the step between consecutive rows exceeds the threshold.
//! Segments with fewer than two rows are dropped.

use std::cmp::Ordering;
use std::ops::Range;

use crate::error::{SegmentError, SegmentResult};
use crate::models::{ColumnData, Table};

/// Contiguous run of rows of the timestamp-sorted table.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Row range in the sorted table.
    pub rows: Range<usize>,
    /// Copy of those rows, all columns, original column order.
    pub table: Table,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Split `table` at timestamp gaps larger than `threshold`.
///
/// `threshold` is in the units of the timestamp column; seconds for
/// calendar timestamps. Rows with a missing timestamp sort last and
/// never open a new segment.
pub fn segment(
    table: &Table,
    timestamp_column: &str,
    threshold: f64,
) -> SegmentResult<Vec<Segment>> {
    if !(threshold.is_finite() && threshold > 0.0) {
        return Err(SegmentError::InvalidThreshold(threshold));
    }

    let column = table
        .column(timestamp_column)
        .ok_or_else(|| SegmentError::ColumnNotFound(timestamp_column.to_string()))?;
    if !column.kind().is_temporal() {
        return Err(SegmentError::NotTemporal(timestamp_column.to_string()));
    }

    let order = sorted_order(column.data());
    let steps = column.time_steps(&order);
    let sorted = table.take_rows(&order);

    let segments = split_points(&steps, threshold)
        .into_iter()
        .filter(|rows| rows.len() >= 2)
        .map(|rows| Segment {
            table: sorted.slice(rows.clone()),
            rows,
        })
        .collect();

    Ok(segments)
}

/// Stable ascending order of the timestamp cells, missing values last.
fn sorted_order(data: &ColumnData) -> Vec<usize> {
    let mut order: Vec<usize> = (0..data.len()).collect();
    match data {
        ColumnData::Numeric(t) => {
            order.sort_by(|&a, &b| missing_last(t[a], t[b], f64::total_cmp))
        }
        ColumnData::Timestamp(t) => {
            order.sort_by(|&a, &b| missing_last(t[a], t[b], |x, y| x.cmp(y)))
        }
        ColumnData::Other(_) => {}
    }
    order
}

fn missing_last<T>(a: Option<T>, b: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(&x, &y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Every run of the sorted rows, including ones too short to keep.
///
/// `steps[i]` is the step from row `i - 1` to row `i`.
fn split_points(steps: &[Option<f64>], threshold: f64) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = 0;

    for (i, step) in steps.iter().enumerate().skip(1) {
        if matches!(step, Some(gap) if *gap > threshold) {
            runs.push(start..i);
            start = i;
        }
    }
    if start < steps.len() {
        runs.push(start..steps.len());
    }

    runs
}
