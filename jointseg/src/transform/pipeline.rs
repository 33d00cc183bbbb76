//! High-level pipeline API.
//!
//! Two independent pipelines share the loader:
//!
//! ```text
//! CSV ──▶ Loader ──▶ Derivative Transformer ──▶ CSV
//! CSV ──▶ Loader ──▶ Segmenter ──▶ Ranker ──▶ Segment Writer ──▶ CSVs + JSON
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use jointseg::{run_segmentation, SegmentOptions};
//! use std::path::Path;
//!
//! let run = run_segmentation(Path::new("robot_data.csv"), &SegmentOptions::default())?;
//! println!("Wrote {} segments", run.total_segments);
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{PipelineError, PipelineResult};
use crate::logs::{log_info, log_success};
use crate::models::ColumnKind;
use crate::parser::{parse_csv_file, LoadOptions, ParseResult};
use crate::transform::derivative::{compute_derivatives, SuffixExclusion};
use crate::transform::ranker::{column_variations, rank_variations, VariationScore};
use crate::transform::segmenter::segment;
use crate::writer::{write_table_csv, RunMetadata, SegmentWriter};

// =============================================================================
// Options
// =============================================================================

/// Options for the derivative pipeline
#[derive(Debug, Clone)]
pub struct DerivativeOptions {
    /// Column holding the sample time
    pub time_column: String,

    /// Columns ending with this suffix get no derivative
    pub exclude_suffix: String,

    pub load: LoadOptions,
}

impl Default for DerivativeOptions {
    fn default() -> Self {
        Self {
            time_column: "timestamp".to_string(),
            exclude_suffix: "_hat".to_string(),
            load: LoadOptions::default(),
        }
    }
}

/// Options for the segmentation pipeline
#[derive(Debug, Clone)]
pub struct SegmentOptions {
    /// Column holding the sample time
    pub timestamp_column: String,

    /// Largest step between consecutive samples inside one segment
    pub threshold: f64,

    /// Directory receiving segment files and metadata
    pub output_dir: PathBuf,

    /// Dominant columns recorded per segment
    pub metadata_top_n: usize,

    pub load: LoadOptions,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            timestamp_column: "timestamp".to_string(),
            threshold: 0.1,
            output_dir: PathBuf::from("segments"),
            metadata_top_n: 5,
            load: LoadOptions::default(),
        }
    }
}

/// Options for whole-table ranking
#[derive(Debug, Clone)]
pub struct RankOptions {
    /// Column left out of the ranking
    pub timestamp_column: String,

    /// Number of columns returned
    pub top_n: usize,

    pub load: LoadOptions,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            timestamp_column: "timestamp".to_string(),
            top_n: 3,
            load: LoadOptions::default(),
        }
    }
}

// =============================================================================
// Results
// =============================================================================

/// Outcome of the derivative pipeline
#[derive(Debug, Clone, Serialize)]
pub struct DerivativeReport {
    pub rows_in: usize,
    pub rows_out: usize,
    /// Names of the appended columns
    pub derived_columns: Vec<String>,
    pub output: PathBuf,
}

/// One ranked column
#[derive(Debug, Clone, Serialize)]
pub struct RankedColumn {
    pub column: String,
    #[serde(flatten)]
    pub score: VariationScore,
}

/// Inferred schema of one input column
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub kind: ColumnKind,
    pub present: usize,
    pub missing: usize,
}

// =============================================================================
// Pipelines
// =============================================================================

/// Load `input`, append derivative columns and write the result to `output`.
pub fn run_derivatives(
    input: &Path,
    output: &Path,
    options: &DerivativeOptions,
) -> PipelineResult<DerivativeReport> {
    let loaded = load(input, &options.load)?;
    let table = loaded.table;

    let exclusion = SuffixExclusion::new(options.exclude_suffix.as_str());
    let derived = compute_derivatives(&table, &options.time_column, &exclusion)?;

    let derived_columns: Vec<String> = derived
        .column_names()
        .into_iter()
        .skip(table.width())
        .map(str::to_string)
        .collect();
    log_success(format!(
        "Computed {} derivative columns, {} rows kept",
        derived_columns.len(),
        derived.len()
    ));

    write_table_csv(&derived, output)?;
    log_success(format!("Output written to: {}", output.display()));

    Ok(DerivativeReport {
        rows_in: table.len(),
        rows_out: derived.len(),
        derived_columns,
        output: output.to_path_buf(),
    })
}

/// Load `input`, split it at timestamp gaps and write every segment.
///
/// Segment files are named after the input's file stem.
pub fn run_segmentation(input: &Path, options: &SegmentOptions) -> PipelineResult<RunMetadata> {
    let loaded = load(input, &options.load)?;

    let segments = segment(&loaded.table, &options.timestamp_column, options.threshold)?;
    log_info(format!("Found {} motion segments", segments.len()));

    if segments.is_empty() {
        return Err(PipelineError::NoSegmentsFound {
            threshold: options.threshold,
        });
    }

    let base_name = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "segments".to_string());

    let run = SegmentWriter::new(&options.output_dir, base_name, &options.timestamp_column)
        .with_top_n(options.metadata_top_n)
        .write_all(&segments)?;

    log_success(format!(
        "Processing complete! Created {} segment files.",
        run.total_segments
    ));
    Ok(run)
}

/// Rank the columns of the whole input by variation.
pub fn run_ranking(input: &Path, options: &RankOptions) -> PipelineResult<Vec<RankedColumn>> {
    let loaded = load(input, &options.load)?;

    let ranked = rank_variations(
        column_variations(&loaded.table, &[options.timestamp_column.as_str()]),
        options.top_n,
    );

    Ok(ranked
        .into_iter()
        .map(|(column, score)| RankedColumn { column, score })
        .collect())
}

/// Inferred column types of the input.
pub fn inspect(input: &Path, options: &LoadOptions) -> PipelineResult<Vec<ColumnSummary>> {
    let loaded = load(input, options)?;
    let rows = loaded.table.len();

    Ok(loaded
        .table
        .columns()
        .iter()
        .map(|c| {
            let present = c.data().present_count();
            ColumnSummary {
                name: c.name().to_string(),
                kind: c.kind(),
                present,
                missing: rows - present,
            }
        })
        .collect())
}

fn load(input: &Path, options: &LoadOptions) -> PipelineResult<ParseResult> {
    let loaded = parse_csv_file(input, options)?;
    log_info(format!(
        "Loaded {} rows from {} (encoding {}, delimiter '{}')",
        loaded.table.len(),
        input.display(),
        loaded.encoding,
        format_delimiter(loaded.delimiter)
    ));
    Ok(loaded)
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}
