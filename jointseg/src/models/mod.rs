//! Typed table model shared by every pipeline stage.
//!
//! - [`Table`] - ordered columns of equal length
//! - [`Column`] - a named, typed vector of cells
//! - [`ColumnData`] - the cell storage, one variant per [`ColumnKind`]
//! - [`ColumnKind`] - type tag decided once at load time
//!
//! Tables are never mutated in place by the transforms. Each stage builds
//! a new table from the previous one.

use std::ops::Range;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::TableError;

/// Format used when rendering calendar timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

// =============================================================================
// Column Kind
// =============================================================================

/// Type tag of a column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Floating point values.
    Numeric,
    /// Calendar timestamps.
    Timestamp,
    /// Anything else, kept as text.
    Other,
}

impl ColumnKind {
    /// Whether the column can serve as a time axis.
    pub fn is_temporal(self) -> bool {
        matches!(self, ColumnKind::Numeric | ColumnKind::Timestamp)
    }
}

// =============================================================================
// Column Data
// =============================================================================

/// Cell storage of a column. `None` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Timestamp(Vec<Option<NaiveDateTime>>),
    Other(Vec<Option<String>>),
}

impl ColumnData {
    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Numeric(_) => ColumnKind::Numeric,
            ColumnData::Timestamp(_) => ColumnKind::Timestamp,
            ColumnData::Other(_) => ColumnKind::Other,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Timestamp(v) => v.len(),
            ColumnData::Other(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the cell at `row` is missing.
    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            ColumnData::Numeric(v) => v[row].is_none(),
            ColumnData::Timestamp(v) => v[row].is_none(),
            ColumnData::Other(v) => v[row].is_none(),
        }
    }

    /// Number of cells that hold a value.
    pub fn present_count(&self) -> usize {
        (0..self.len()).filter(|&i| !self.is_missing(i)).count()
    }

    /// Gather the given rows, in the given order.
    pub fn take(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(rows.iter().map(|&i| v[i]).collect()),
            ColumnData::Timestamp(v) => {
                ColumnData::Timestamp(rows.iter().map(|&i| v[i]).collect())
            }
            ColumnData::Other(v) => ColumnData::Other(rows.iter().map(|&i| v[i].clone()).collect()),
        }
    }

    /// Render the cell at `row` as CSV text. Missing cells render empty.
    pub fn render(&self, row: usize) -> String {
        match self {
            ColumnData::Numeric(v) => v[row].map(format_number).unwrap_or_default(),
            ColumnData::Timestamp(v) => v[row].map(format_timestamp).unwrap_or_default(),
            ColumnData::Other(v) => v[row].clone().unwrap_or_default(),
        }
    }
}

/// Shortest text that parses back to the same `f64`.
pub fn format_number(value: f64) -> String {
    value.to_string()
}

pub fn format_timestamp(value: NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Elapsed seconds from `start` to `end`.
pub fn seconds_between(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    let delta = end - start;
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1e9,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

// =============================================================================
// Column
// =============================================================================

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Numeric(values))
    }

    pub fn timestamp(name: impl Into<String>, values: Vec<Option<NaiveDateTime>>) -> Self {
        Self::new(name, ColumnData::Timestamp(values))
    }

    pub fn other(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self::new(name, ColumnData::Other(values))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn kind(&self) -> ColumnKind {
        self.data.kind()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Numeric cells, or `None` for non-numeric columns.
    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match &self.data {
            ColumnData::Numeric(v) => Some(v),
            _ => None,
        }
    }

    /// Steps between consecutive rows visited in `order`.
    ///
    /// `steps[k]` is `t[order[k]] - t[order[k-1]]`, in raw units for numeric
    /// columns and in seconds for timestamps. Calendar steps are taken from
    /// the exact `chrono` difference. `None` at `k = 0`, next to a missing
    /// cell, and everywhere for columns that are not temporal.
    pub fn time_steps(&self, order: &[usize]) -> Vec<Option<f64>> {
        (0..order.len())
            .map(|k| {
                let prev = *order.get(k.checked_sub(1)?)?;
                let cur = order[k];
                match &self.data {
                    ColumnData::Numeric(t) => Some(t[cur]? - t[prev]?),
                    ColumnData::Timestamp(t) => Some(seconds_between(t[prev]?, t[cur]?)),
                    ColumnData::Other(_) => None,
                }
            })
            .collect()
    }
}

// =============================================================================
// Table
// =============================================================================

/// Ordered set of equally long, uniquely named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table, checking lengths and name uniqueness.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, TableError> {
        let mut table = Self::new();
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// Append a column at the end. The first column fixes the row count.
    pub fn push_column(&mut self, column: Column) -> Result<(), TableError> {
        if self.column(column.name()).is_some() {
            return Err(TableError::DuplicateColumn(column.name().to_string()));
        }
        if self.columns.is_empty() {
            self.rows = column.len();
        } else if column.len() != self.rows {
            return Err(TableError::LengthMismatch {
                name: column.name().to_string(),
                expected: self.rows,
                actual: column.len(),
            });
        }
        self.columns.push(column);
        Ok(())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Whether any cell of `row` is missing.
    pub fn row_has_missing(&self, row: usize) -> bool {
        self.columns.iter().any(|c| c.data().is_missing(row))
    }

    /// New table holding the given rows, in the given order.
    pub fn take_rows(&self, rows: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name(), c.data().take(rows)))
                .collect(),
            rows: rows.len(),
        }
    }

    /// New table holding the contiguous row range.
    pub fn slice(&self, range: Range<usize>) -> Table {
        let rows: Vec<usize> = range.collect();
        self.take_rows(&rows)
    }

    /// New table without the rows that have a missing cell, re-indexed from 0.
    pub fn complete_rows(&self) -> Table {
        let keep: Vec<usize> = (0..self.rows).filter(|&i| !self.row_has_missing(i)).collect();
        self.take_rows(&keep)
    }

    /// Cells of `row` rendered as CSV text, in column order.
    pub fn render_row(&self, row: usize) -> Vec<String> {
        self.columns.iter().map(|c| c.data().render(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32, s: u32, milli: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_milli_opt(h, m, s, milli)
            .unwrap()
    }

    fn sample() -> Table {
        Table::from_columns(vec![
            Column::numeric("t", vec![Some(0.0), Some(0.5), Some(1.0)]),
            Column::numeric("joint_1", vec![Some(1.0), None, Some(3.0)]),
            Column::other("label", vec![Some("a".into()), Some("b".into()), Some("c".into())]),
        ])
        .unwrap()
    }

    #[test]
    fn test_push_column_rejects_length_mismatch() {
        let mut table = sample();
        let err = table
            .push_column(Column::numeric("short", vec![Some(1.0)]))
            .unwrap_err();
        assert_eq!(
            err,
            TableError::LengthMismatch {
                name: "short".into(),
                expected: 3,
                actual: 1
            }
        );
    }

    #[test]
    fn test_push_column_rejects_duplicate() {
        let mut table = sample();
        let err = table
            .push_column(Column::numeric("t", vec![None, None, None]))
            .unwrap_err();
        assert_eq!(err, TableError::DuplicateColumn("t".into()));
    }

    #[test]
    fn test_take_rows_keeps_column_order() {
        let table = sample();
        let picked = table.take_rows(&[2, 0]);

        assert_eq!(picked.len(), 2);
        assert_eq!(picked.column_names(), vec!["t", "joint_1", "label"]);
        assert_eq!(
            picked.column("t").unwrap().as_numeric().unwrap(),
            &[Some(1.0), Some(0.0)]
        );
        assert_eq!(picked.render_row(0), vec!["1", "3", "c"]);
    }

    #[test]
    fn test_complete_rows_drops_missing() {
        let table = sample().complete_rows();
        assert_eq!(table.len(), 2);
        assert_eq!(table.render_row(1), vec!["1", "3", "c"]);
    }

    #[test]
    fn test_time_steps_for_timestamps() {
        let col = Column::timestamp(
            "ts",
            vec![Some(ts(0, 0, 0, 0)), Some(ts(0, 0, 1, 250)), None, Some(ts(0, 0, 1, 950))],
        );

        let steps = col.time_steps(&[0, 1, 2, 3]);
        assert_eq!(steps, vec![None, Some(1.25), None, None]);

        // exact millisecond gaps compare equal to the decimal literal
        let steps = col.time_steps(&[1, 3, 0]);
        assert_eq!(steps[1], Some(0.7));
        assert_eq!(steps[2], Some(-1.95));
    }

    #[test]
    fn test_time_steps_numeric_and_other() {
        let col = Column::numeric("t", vec![Some(0.5), Some(2.0), None]);
        assert_eq!(col.time_steps(&[0, 1, 2]), vec![None, Some(1.5), None]);
        assert_eq!(col.time_steps(&[1, 0]), vec![None, Some(-1.5)]);

        let other = Column::other("x", vec![Some("a".into()), Some("b".into())]);
        assert_eq!(other.time_steps(&[0, 1]), vec![None, None]);
    }

    #[test]
    fn test_temporal_kinds() {
        assert!(ColumnKind::Numeric.is_temporal());
        assert!(ColumnKind::Timestamp.is_temporal());
        assert!(!ColumnKind::Other.is_temporal());
    }

    #[test]
    fn test_render_formats() {
        assert_eq!(format_number(0.05), "0.05");
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_timestamp(ts(12, 30, 5, 0)), "2024-03-01 12:30:05");
        assert_eq!(format_timestamp(ts(12, 30, 5, 250)), "2024-03-01 12:30:05.250");
    }
}
