//! Serializable metadata written next to the segment files.
//!
//! ```json
//! {
//!   "total_segments": 2,
//!   "segments": [
//!     {
//!       "segment_id": 1,
//!       "filename": "run_segment_001.csv",
//!       "start_time": "0",
//!       "end_time": "0.05",
//!       "duration_seconds": 0.05,
//!       "sample_count": 2,
//!       "dominant_columns": ["joint_2", "joint_1"],
//!       "column_variations": {
//!         "joint_2": { "std": 0.7, "range": 1.0, "combined_score": 0.7 },
//!         "joint_1": { "std": 0.1, "range": 0.1, "combined_score": 0.01 }
//!       }
//!     }
//!   ]
//! }
//! ```

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::transform::ranker::VariationScore;

/// Aggregated metadata of one segmentation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunMetadata {
    pub total_segments: usize,
    pub segments: Vec<SegmentMetadata>,
}

/// Metadata of one written segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentMetadata {
    /// 1-based position in the run.
    pub segment_id: usize,
    pub filename: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_seconds: f64,
    pub sample_count: usize,
    /// Highest variation first.
    pub dominant_columns: Vec<String>,
    pub column_variations: ColumnVariations,
}

/// Scores of the dominant columns, serialized as a JSON object whose
/// keys keep ranking order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnVariations(pub Vec<(String, VariationScore)>);

impl ColumnVariations {
    pub fn get(&self, column: &str) -> Option<&VariationScore> {
        self.0.iter().find(|(name, _)| name == column).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }
}

impl Serialize for ColumnVariations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, score) in &self.0 {
            map.serialize_entry(name, score)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ColumnVariations {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = ColumnVariations;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of column name to variation score")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, score)) = access.next_entry::<String, VariationScore>()? {
                    entries.push((name, score));
                }
                Ok(ColumnVariations(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(v: f64) -> VariationScore {
        VariationScore {
            std: v,
            range: 1.0,
            combined_score: v,
        }
    }

    #[test]
    fn test_variations_keep_rank_order_in_json() {
        let variations = ColumnVariations(vec![
            ("zeta".into(), score(2.0)),
            ("alpha".into(), score(1.0)),
        ]);
        let json = serde_json::to_string(&variations).unwrap();

        assert!(json.find("zeta").unwrap() < json.find("alpha").unwrap());

        let back: ColumnVariations = serde_json::from_str(&json).unwrap();
        assert_eq!(back.names().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        assert_eq!(back.get("alpha"), Some(&score(1.0)));
    }

    #[test]
    fn test_segment_metadata_field_names() {
        let meta = SegmentMetadata {
            segment_id: 1,
            filename: "run_segment_001.csv".into(),
            start_time: "0".into(),
            end_time: "0.05".into(),
            duration_seconds: 0.05,
            sample_count: 2,
            dominant_columns: vec!["q1".into()],
            column_variations: ColumnVariations(vec![("q1".into(), score(0.5))]),
        };
        let value = serde_json::to_value(&meta).unwrap();

        for key in [
            "segment_id",
            "filename",
            "start_time",
            "end_time",
            "duration_seconds",
            "sample_count",
            "dominant_columns",
            "column_variations",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["column_variations"]["q1"]["combined_score"], 0.5);
    }
}
