//! Persistence of tables, segments and run metadata.
//!
//! Output layout for a base name `run`:
//!
//! ```text
//! <output_dir>/
//!   run_segment_001.csv
//!   run_segment_002.csv
//!   run_metadata.json
//! ```
//!
//! Existing files with the same names are overwritten.

pub mod metadata;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{WriteError, WriteResult};
use crate::logs::{log_info_indent, log_success};
use crate::models::{format_number, format_timestamp, seconds_between, ColumnData, Table};
use crate::transform::ranker::{column_variations, rank_variations};
use crate::transform::segmenter::Segment;

pub use metadata::{ColumnVariations, RunMetadata, SegmentMetadata};

/// Default number of dominant columns kept per segment.
pub const DEFAULT_METADATA_TOP_N: usize = 5;

/// Write `table` as CSV with a header row, original column order.
pub fn write_table_csv(table: &Table, path: &Path) -> WriteResult<()> {
    let csv_err = |source| WriteError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer.write_record(table.column_names()).map_err(csv_err)?;
    for row in 0..table.len() {
        writer.write_record(table.render_row(row)).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// `<base>_segment_NNN.csv` for the 1-based `segment_id`.
pub fn segment_filename(base: &str, segment_id: usize) -> String {
    format!("{base}_segment_{segment_id:03}.csv")
}

/// `<base>_metadata.json`
pub fn metadata_filename(base: &str) -> String {
    format!("{base}_metadata.json")
}

/// Writes segment files and the aggregated metadata document.
#[derive(Debug, Clone)]
pub struct SegmentWriter {
    output_dir: PathBuf,
    base_name: String,
    timestamp_column: String,
    top_n: usize,
}

impl SegmentWriter {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        base_name: impl Into<String>,
        timestamp_column: impl Into<String>,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            base_name: base_name.into(),
            timestamp_column: timestamp_column.into(),
            top_n: DEFAULT_METADATA_TOP_N,
        }
    }

    /// Number of dominant columns recorded per segment.
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.output_dir.join(metadata_filename(&self.base_name))
    }

    /// Write every segment, then the metadata document.
    ///
    /// Creates the output directory if needed.
    pub fn write_all(&self, segments: &[Segment]) -> WriteResult<RunMetadata> {
        fs::create_dir_all(&self.output_dir).map_err(|source| WriteError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let mut run = RunMetadata {
            total_segments: segments.len(),
            segments: Vec::with_capacity(segments.len()),
        };

        for (i, segment) in segments.iter().enumerate() {
            let segment_id = i + 1;
            let filename = segment_filename(&self.base_name, segment_id);
            let meta = self.describe(segment, segment_id, filename);

            write_table_csv(&segment.table, &self.output_dir.join(&meta.filename))?;

            log_success(format!(
                "Segment {}: {} samples, {:.3}s duration",
                segment_id, meta.sample_count, meta.duration_seconds
            ));
            log_info_indent(
                format!("Dominant columns: {}", meta.dominant_columns.join(", ")),
                1,
            );
            log_info_indent(format!("Saved to: {}", meta.filename), 1);

            run.segments.push(meta);
        }

        let metadata_path = self.metadata_path();
        let json = serde_json::to_string_pretty(&run)?;
        fs::write(&metadata_path, json).map_err(|source| WriteError::Io {
            path: metadata_path.clone(),
            source,
        })?;
        log_success(format!("Metadata saved to: {}", metadata_path.display()));

        Ok(run)
    }

    /// Metadata record of one segment.
    pub fn describe(
        &self,
        segment: &Segment,
        segment_id: usize,
        filename: String,
    ) -> SegmentMetadata {
        let bounds = time_bounds(&segment.table, &self.timestamp_column);
        let ranked = rank_variations(
            column_variations(&segment.table, &[self.timestamp_column.as_str()]),
            self.top_n,
        );

        SegmentMetadata {
            segment_id,
            filename,
            start_time: bounds.start,
            end_time: bounds.end,
            duration_seconds: bounds.duration,
            sample_count: segment.table.len(),
            dominant_columns: ranked.iter().map(|(name, _)| name.clone()).collect(),
            column_variations: ColumnVariations(ranked),
        }
    }
}

struct TimeBounds {
    start: String,
    end: String,
    duration: f64,
}

/// First and last present timestamp of `table`, with the elapsed time
/// between them (seconds for calendar timestamps, raw units otherwise).
fn time_bounds(table: &Table, timestamp_column: &str) -> TimeBounds {
    let empty = TimeBounds {
        start: String::new(),
        end: String::new(),
        duration: 0.0,
    };

    match table.column(timestamp_column).map(|c| c.data()) {
        Some(ColumnData::Numeric(values)) => {
            let mut present = values.iter().flatten();
            match (present.next(), present.last()) {
                (Some(&first), last) => {
                    let last = last.copied().unwrap_or(first);
                    TimeBounds {
                        start: format_number(first),
                        end: format_number(last),
                        duration: last - first,
                    }
                }
                (None, _) => empty,
            }
        }
        Some(ColumnData::Timestamp(values)) => {
            let mut present = values.iter().flatten();
            match (present.next(), present.last()) {
                (Some(&first), last) => {
                    let last = last.copied().unwrap_or(first);
                    TimeBounds {
                        start: format_timestamp(first),
                        end: format_timestamp(last),
                        duration: seconds_between(first, last),
                    }
                }
                (None, _) => empty,
            }
        }
        Some(ColumnData::Other(_)) | None => empty,
    }
}
