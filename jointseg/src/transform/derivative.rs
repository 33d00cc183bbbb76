//! Per-column finite-difference derivatives with respect to time.
//!
//! For every numeric column `c` that is neither the time column nor
//! excluded by the [`ExclusionPolicy`], a column `d_c_dt` is appended:
//!
//! ```text
//! d_c_dt[i] = (c[i] - c[i-1]) / (t[i] - t[i-1])     for i >= 1
//! ```
//!
//! Row 0 has no derivative. A zero time step, a missing operand or a
//! rate too large for `f64` also leaves the cell undefined. Every row with an undefined or missing cell
//! is dropped from the result, which is re-indexed from 0.

use crate::error::{DerivativeError, DerivativeResult};
use crate::models::{Column, Table};

// =============================================================================
// Exclusion Policy
// =============================================================================

/// Decides which columns are left without a derivative.
pub trait ExclusionPolicy {
    fn excludes(&self, column: &str) -> bool;
}

/// Excludes columns whose name ends with a marker suffix.
///
/// The default suffix `_hat` marks estimated / reference signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixExclusion {
    suffix: String,
}

impl SuffixExclusion {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }
}

impl Default for SuffixExclusion {
    fn default() -> Self {
        Self::new("_hat")
    }
}

impl ExclusionPolicy for SuffixExclusion {
    fn excludes(&self, column: &str) -> bool {
        !self.suffix.is_empty() && column.ends_with(&self.suffix)
    }
}

/// Excludes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExclusion;

impl ExclusionPolicy for NoExclusion {
    fn excludes(&self, _column: &str) -> bool {
        false
    }
}

impl<F> ExclusionPolicy for F
where
    F: Fn(&str) -> bool,
{
    fn excludes(&self, column: &str) -> bool {
        self(column)
    }
}

// =============================================================================
// Transformer
// =============================================================================

/// Name of the derivative column for `column`.
pub fn derivative_name(column: &str) -> String {
    format!("d_{column}_dt")
}

/// Append derivative columns and drop incomplete rows.
///
/// The time column may be numeric (raw units) or a calendar timestamp
/// (seconds). Non-numeric columns are carried through untouched.
pub fn compute_derivatives<P>(
    table: &Table,
    time_column: &str,
    exclusion: &P,
) -> DerivativeResult<Table>
where
    P: ExclusionPolicy + ?Sized,
{
    let time = table
        .column(time_column)
        .ok_or_else(|| DerivativeError::ColumnNotFound(time_column.to_string()))?;
    if !time.kind().is_temporal() {
        return Err(DerivativeError::NotTemporal(time_column.to_string()));
    }
    let rows: Vec<usize> = (0..table.len()).collect();
    let dt = time.time_steps(&rows);

    let mut derived = table.clone();
    for column in table.columns() {
        if column.name() == time_column || exclusion.excludes(column.name()) {
            continue;
        }
        let Some(values) = column.as_numeric() else {
            continue;
        };

        let rates = (0..values.len())
            .map(|i| {
                if i == 0 {
                    return None;
                }
                match (values[i], values[i - 1], dt[i]) {
                    (Some(cur), Some(prev), Some(step)) if step != 0.0 => {
                        Some((cur - prev) / step).filter(|rate| rate.is_finite())
                    }
                    _ => None,
                }
            })
            .collect();

        derived.push_column(Column::numeric(derivative_name(column.name()), rates))?;
    }

    Ok(derived.complete_rows())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;

    #[test]
    fn test_exact_finite_differences() {
        let csv = "timestamp,a,b\n0,1,10\n0.5,2,7\n2,5,7\n2.25,4,8";
        let table = parse_str(csv, ',').unwrap();

        let out = compute_derivatives(&table, "timestamp", &NoExclusion).unwrap();

        assert_eq!(out.len(), 3);
        assert_eq!(out.column_names(), vec!["timestamp", "a", "b", "d_a_dt", "d_b_dt"]);
        assert_eq!(
            out.column("d_a_dt").unwrap().as_numeric().unwrap(),
            &[Some(2.0), Some(2.0), Some(-4.0)]
        );
        assert_eq!(
            out.column("d_b_dt").unwrap().as_numeric().unwrap(),
            &[Some(-6.0), Some(0.0), Some(4.0)]
        );
        // original columns re-indexed from row 1
        assert_eq!(
            out.column("timestamp").unwrap().as_numeric().unwrap(),
            &[Some(0.5), Some(2.0), Some(2.25)]
        );
    }

    #[test]
    fn test_suffix_exclusion() {
        let csv = "timestamp,q1,q1_hat\n0,0,0\n1,1,1";
        let table = parse_str(csv, ',').unwrap();

        let out = compute_derivatives(&table, "timestamp", &SuffixExclusion::default()).unwrap();
        assert!(out.column("d_q1_dt").is_some());
        assert!(out.column("d_q1_hat_dt").is_none());
        assert!(out.column("d_timestamp_dt").is_none());
    }

    #[test]
    fn test_closure_policy() {
        let csv = "t,ref_x,x\n0,0,0\n1,1,1";
        let table = parse_str(csv, ',').unwrap();

        let out = compute_derivatives(&table, "t", &|name: &str| name.starts_with("ref_")).unwrap();
        assert_eq!(out.column_names(), vec!["t", "ref_x", "x", "d_x_dt"]);
    }

    #[test]
    fn test_zero_time_step_drops_row() {
        let csv = "timestamp,a\n0,0\n1,1\n1,5\n2,6";
        let table = parse_str(csv, ',').unwrap();

        let out = compute_derivatives(&table, "timestamp", &NoExclusion).unwrap();
        let rates = out.column("d_a_dt").unwrap().as_numeric().unwrap();
        assert_eq!(rates, &[Some(1.0), Some(1.0)]);
        assert!(rates.iter().flatten().all(|r| r.is_finite()));
    }

    #[test]
    fn test_overflowing_rate_drops_row() {
        let csv = "timestamp,a\n0,-1e308\n0.5,1e308\n1,1e308";
        let table = parse_str(csv, ',').unwrap();

        let out = compute_derivatives(&table, "timestamp", &NoExclusion).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.column("d_a_dt").unwrap().as_numeric().unwrap(), &[Some(0.0)]);
        assert_eq!(out.column("timestamp").unwrap().as_numeric().unwrap(), &[Some(1.0)]);
    }

    #[test]
    fn test_non_numeric_columns_carried() {
        let csv = "timestamp,mode,a\n0,idle,0\n1,run,2";
        let table = parse_str(csv, ',').unwrap();

        let out = compute_derivatives(&table, "timestamp", &NoExclusion).unwrap();
        assert_eq!(out.column_names(), vec!["timestamp", "mode", "a", "d_a_dt"]);
        assert_eq!(out.column("mode").unwrap().data().render(0), "run");
    }

    #[test]
    fn test_missing_value_drops_rows() {
        let csv = "timestamp,a\n0,0\n1,\n2,4\n3,5";
        let table = parse_str(csv, ',').unwrap();

        let out = compute_derivatives(&table, "timestamp", &NoExclusion).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.column("d_a_dt").unwrap().as_numeric().unwrap(), &[Some(1.0)]);
    }

    #[test]
    fn test_calendar_time_column() {
        let csv = "timestamp,a\n2024-01-01 00:00:00,0\n2024-01-01 00:00:00.500,1";
        let table = parse_str(csv, ',').unwrap();

        let out = compute_derivatives(&table, "timestamp", &NoExclusion).unwrap();
        assert_eq!(out.column("d_a_dt").unwrap().as_numeric().unwrap(), &[Some(2.0)]);
    }

    #[test]
    fn test_time_column_errors() {
        let table = parse_str("a,label\n1,x\n2,y", ',').unwrap();

        assert!(matches!(
            compute_derivatives(&table, "timestamp", &NoExclusion),
            Err(DerivativeError::ColumnNotFound(_))
        ));
        assert!(matches!(
            compute_derivatives(&table, "label", &NoExclusion),
            Err(DerivativeError::NotTemporal(_))
        ));
    }

    #[test]
    fn test_name_collision() {
        let csv = "timestamp,a,d_a_dt\n0,0,0\n1,1,1";
        let table = parse_str(csv, ',').unwrap();

        let err = compute_derivatives(&table, "timestamp", &NoExclusion).unwrap_err();
        assert!(matches!(err, DerivativeError::Table(_)));
    }
}
