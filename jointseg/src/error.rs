//! Error types for the jointseg pipelines.
//!
//! Each stage owns its error enum:
//!
//! - [`TableError`] - schema violations when assembling a table
//! - [`LoadError`] - reading and parsing the input table
//! - [`DerivativeError`] - time-derivative computation
//! - [`SegmentError`] - gap segmentation
//! - [`WriteError`] - persisting segments and metadata
//! - [`PipelineError`] - top-level orchestration
//!
//! Conversion into [`PipelineError`] is automatic via `From`,
//! so `?` works across stage boundaries.

use std::path::PathBuf;
use std::process::ExitCode;

use thiserror::Error;

// =============================================================================
// Table Errors
// =============================================================================

/// Schema violations when building a [`crate::models::Table`].
#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    /// Column length differs from the table's row count.
    #[error("Column '{name}' has {actual} rows, table has {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// A column with this name already exists.
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),
}

// =============================================================================
// Load Errors
// =============================================================================

/// Errors while reading the input table.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read file.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input has no content at all.
    #[error("Input file is empty")]
    EmptyFile,

    /// First row is missing or contains no column names.
    #[error("No headers found in input")]
    NoHeaders,

    /// Header and columns do not form a valid table.
    #[error("Invalid table: {0}")]
    Schema(#[from] TableError),

    /// Delimiter is not a single-byte character.
    #[error("Delimiter must be an ASCII character, got '{0}'")]
    InvalidDelimiter(char),

    /// Malformed CSV record.
    #[error("Line {line}: {message}")]
    Parse { line: u64, message: String },
}

// =============================================================================
// Derivative Errors
// =============================================================================

/// Errors while computing time derivatives.
#[derive(Debug, Error)]
pub enum DerivativeError {
    /// Designated time column does not exist.
    #[error("Time column '{0}' not found in data")]
    ColumnNotFound(String),

    /// Designated time column holds neither numbers nor timestamps.
    #[error("Time column '{0}' is not numeric or a timestamp")]
    NotTemporal(String),

    /// A derivative column could not be appended.
    #[error("Cannot append derivative column: {0}")]
    Table(#[from] TableError),
}

// =============================================================================
// Segment Errors
// =============================================================================

/// Errors while segmenting a table.
#[derive(Debug, Error)]
pub enum SegmentError {
    /// Timestamp column does not exist.
    #[error("Timestamp column '{0}' not found in data")]
    ColumnNotFound(String),

    /// Timestamp column holds neither numbers nor timestamps.
    #[error("Timestamp column '{0}' is not numeric or a timestamp")]
    NotTemporal(String),

    /// Threshold must be a positive, finite gap.
    #[error("Gap threshold must be positive and finite, got {0}")]
    InvalidThreshold(f64),
}

// =============================================================================
// Write Errors
// =============================================================================

/// Errors while persisting output files.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Output directory could not be created.
    #[error("Cannot create output directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output file could not be created or flushed.
    #[error("Cannot write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV serialization failed.
    #[error("CSV write error for '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Metadata serialization failed.
    #[error("Metadata JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// Returned by [`crate::transform::pipeline::run_segmentation`] and
/// [`crate::transform::pipeline::run_derivatives`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reading the input failed.
    #[error("Error reading file: {0}")]
    Load(#[from] LoadError),

    /// Derivative computation failed.
    #[error("Error computing derivatives: {0}")]
    Derivative(#[from] DerivativeError),

    /// Segmentation failed.
    #[error("Error segmenting data: {0}")]
    Segment(#[from] SegmentError),

    /// Writing output failed.
    #[error("Error saving output: {0}")]
    Write(#[from] WriteError),

    /// Segmentation produced no segment with two or more rows.
    #[error("No segments found with threshold {threshold}. Try adjusting the threshold.")]
    NoSegmentsFound { threshold: f64 },
}

impl PipelineError {
    /// Process exit code for this failure class.
    ///
    /// | code | meaning                                  |
    /// |------|------------------------------------------|
    /// | 2    | input could not be read                  |
    /// | 3    | missing column or invalid argument       |
    /// | 4    | no segments found                        |
    /// | 5    | output could not be written              |
    pub fn exit_status(&self) -> u8 {
        match self {
            PipelineError::Load(_) => 2,
            PipelineError::Derivative(_) | PipelineError::Segment(_) => 3,
            PipelineError::NoSegmentsFound { .. } => 4,
            PipelineError::Write(_) => 5,
        }
    }

    /// [`Self::exit_status`] as a process [`ExitCode`].
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for derivative operations.
pub type DerivativeResult<T> = Result<T, DerivativeError>;

/// Result type for segmentation.
pub type SegmentResult<T> = Result<T, SegmentError>;

/// Result type for write operations.
pub type WriteResult<T> = Result<T, WriteError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
