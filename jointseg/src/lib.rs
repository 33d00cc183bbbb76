//! # Jointseg - segmentation and derivatives for robot joint telemetry
//!
//! Jointseg reads timestamped joint logs (CSV) and runs one of two
//! independent batch transformations over them.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌─────────────┐    ┌──────────┐    ┌────────────────┐
//! │ CSV File │───▶│  Loader  │───▶│  Segmenter  │───▶│  Ranker  │───▶│ Segment Writer │
//! └──────────┘    └──────────┘    └─────────────┘    └──────────┘    └────────────────┘
//!                      │
//!                      └────────▶ Derivative Transformer ───▶ CSV File
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jointseg::{run_segmentation, SegmentOptions};
//! use std::path::Path;
//!
//! let run = run_segmentation(Path::new("robot_data.csv"), &SegmentOptions::default())?;
//! for seg in &run.segments {
//!     println!("{}: {:?}", seg.filename, seg.dominant_columns);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Per-stage error types
//! - [`models`] - Typed table model
//! - [`parser`] - CSV loading with type inference
//! - [`transform`] - Derivatives, segmentation, ranking and pipelines
//! - [`writer`] - Segment files and metadata
//! - [`logs`] - Progress reporting

// Core modules
pub mod error;
pub mod logs;
pub mod models;

// Loading
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod writer;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    DerivativeError, LoadError, PipelineError, PipelineResult, SegmentError, TableError, WriteError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Column, ColumnData, ColumnKind, Table};

// =============================================================================
// Re-exports - Loading
// =============================================================================

pub use parser::{parse_bytes, parse_csv_file, parse_str, LoadOptions, ParseResult};

// =============================================================================
// Re-exports - Transforms
// =============================================================================

pub use transform::{
    compute_derivatives, rank_columns, segment, ExclusionPolicy, NoExclusion, Segment,
    SuffixExclusion, VariationScore,
};

// =============================================================================
// Re-exports - Pipelines
// =============================================================================

pub use transform::pipeline::{
    inspect, run_derivatives, run_ranking, run_segmentation, ColumnSummary, DerivativeOptions,
    DerivativeReport, RankOptions, RankedColumn, SegmentOptions,
};

// =============================================================================
// Re-exports - Writer
// =============================================================================

pub use writer::{write_table_csv, RunMetadata, SegmentMetadata, SegmentWriter};
