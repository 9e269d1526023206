//! Record contract checks run before the fold

use super::error::ConsolidationError;
use crate::models::RawDetection;

/// Slack for float noise in segment boundaries
const BOUNDARY_EPSILON: f64 = 1e-6;

/// Check one backend's records: same source, well-formed, ordered, disjoint
pub fn validate_records(backend: &str, records: &[RawDetection]) -> Result<(), ConsolidationError> {
    let mut previous: Option<&RawDetection> = None;

    for (index, record) in records.iter().enumerate() {
        if record.source != backend {
            return Err(ConsolidationError::SourceMismatch {
                expected: backend.to_string(),
                found: record.source.clone(),
                index,
            });
        }

        let (start, end) = (record.segment_start, record.segment_end);
        if !start.is_finite() || !end.is_finite() || start < 0.0 || end <= start {
            return Err(ConsolidationError::MalformedSegment {
                backend: backend.to_string(),
                index,
                start,
                end,
            });
        }

        if let Some(prev) = previous {
            if start < prev.segment_start {
                return Err(ConsolidationError::OutOfOrder {
                    backend: backend.to_string(),
                    index,
                    start,
                    previous_start: prev.segment_start,
                });
            }
            if start + BOUNDARY_EPSILON < prev.segment_end {
                return Err(ConsolidationError::Overlapping {
                    backend: backend.to_string(),
                    index,
                    start,
                    previous_end: prev.segment_end,
                });
            }
        }

        previous = Some(record);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(start: f64, end: f64) -> RawDetection {
        RawDetection::matched("acoustid", start, end, "T", "A")
    }

    #[test]
    fn test_contiguous_records_pass() {
        let records = vec![rec(0.0, 30.0), rec(30.0, 60.0), rec(90.0, 120.0)];
        assert!(validate_records("acoustid", &records).is_ok());
        assert!(validate_records("acoustid", &[]).is_ok());
    }

    #[test]
    fn test_empty_segment_rejected() {
        let err = validate_records("acoustid", &[rec(0.0, 30.0), rec(30.0, 30.0)]).unwrap_err();
        assert_eq!(
            err,
            ConsolidationError::MalformedSegment {
                backend: "acoustid".to_string(),
                index: 1,
                start: 30.0,
                end: 30.0,
            }
        );
    }

    #[test]
    fn test_negative_and_nan_rejected() {
        assert!(validate_records("acoustid", &[rec(-1.0, 30.0)]).is_err());
        assert!(validate_records("acoustid", &[rec(f64::NAN, 30.0)]).is_err());
    }

    #[test]
    fn test_out_of_order_rejected() {
        let err = validate_records("acoustid", &[rec(30.0, 60.0), rec(0.0, 30.0)]).unwrap_err();
        assert!(matches!(err, ConsolidationError::OutOfOrder { index: 1, .. }));
        assert!(err.is_data_integrity());
    }

    #[test]
    fn test_overlap_rejected() {
        let err = validate_records("acoustid", &[rec(0.0, 30.0), rec(20.0, 50.0)]).unwrap_err();
        assert!(matches!(err, ConsolidationError::Overlapping { index: 1, .. }));
    }

    #[test]
    fn test_foreign_source_rejected() {
        let foreign = RawDetection::unrecognized("executable", 30.0, 60.0);
        let err = validate_records("acoustid", &[rec(0.0, 30.0), foreign]).unwrap_err();
        assert!(matches!(err, ConsolidationError::SourceMismatch { index: 1, .. }));
    }
}
