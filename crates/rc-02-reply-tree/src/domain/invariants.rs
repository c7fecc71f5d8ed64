//! # Domain Invariants
//!
//! Rules a finished measurement must satisfy.

use super::entities::ReplyTreeMeasurement;

/// Per-relay publish timeout when the caller does not pick one.
pub const DEFAULT_PUBLISH_TIMEOUT_SECS: u64 = 5;

/// Deadline for a whole measurement when the caller does not pick one.
pub const DEFAULT_MEASURE_TIMEOUT_SECS: u64 = 30;

/// Invariant: every counted round contributes at least one reply, so the
/// descendant total can never be smaller than the depth.
pub fn invariant_leaves_cover_depth(measurement: &ReplyTreeMeasurement) -> bool {
    measurement.leaves >= u64::from(measurement.depth)
}

/// Invariant: depth equals the number of non-empty rounds and leaves equals
/// their sum.
pub fn invariant_matches_rounds(measurement: &ReplyTreeMeasurement, rounds: &[usize]) -> bool {
    let non_empty: Vec<usize> = rounds.iter().copied().filter(|r| *r > 0).collect();
    measurement.depth as usize == non_empty.len()
        && measurement.leaves == non_empty.iter().map(|r| *r as u64).sum::<u64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_measurement_holds() {
        let m = ReplyTreeMeasurement::default();
        assert!(invariant_leaves_cover_depth(&m));
        assert!(invariant_matches_rounds(&m, &[]));
    }

    #[test]
    fn test_rounds_mismatch_detected() {
        let m = ReplyTreeMeasurement { depth: 2, leaves: 4 };
        assert!(invariant_matches_rounds(&m, &[3, 1]));
        assert!(!invariant_matches_rounds(&m, &[3, 2]));
    }

    #[test]
    fn test_leaves_below_depth_detected() {
        let m = ReplyTreeMeasurement { depth: 3, leaves: 2 };
        assert!(!invariant_leaves_cover_depth(&m));
    }
}
