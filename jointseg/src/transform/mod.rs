//! Transformation module.
//!
//! - Derivative: per-column time derivatives
//! - Segmenter: gap-based segmentation
//! - Ranker: variation scoring and dominant columns
//! - Pipeline: end-to-end runs over files

pub mod derivative;
pub mod pipeline;
pub mod ranker;
pub mod segmenter;

pub use derivative::{
    compute_derivatives, derivative_name, ExclusionPolicy, NoExclusion, SuffixExclusion,
};
pub use pipeline::*;
pub use ranker::{column_variations, rank_columns, rank_variations, VariationScore};
pub use segmenter::{segment, Segment};
