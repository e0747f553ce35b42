//! Point-in-time copy of throttler counters.

use serde::Serialize;

/// Cumulative throttler counters at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ThrottleTotals {
    pub submitted: u64,
    pub queued: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub abandoned: u64,
    pub peak_active: usize,
}

impl ThrottleTotals {
    /// Requests that reached a terminal state.
    pub fn completed(&self) -> u64 {
        self.succeeded + self.failed + self.timed_out + self.abandoned
    }

    /// Fraction of completed requests that succeeded (1.0 when nothing completed).
    pub fn success_ratio(&self) -> f64 {
        let completed = self.completed();
        if completed == 0 {
            1.0
        } else {
            self.succeeded as f64 / completed as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_ratio() {
        let totals = ThrottleTotals {
            succeeded: 3,
            failed: 1,
            ..Default::default()
        };
        assert!((totals.success_ratio() - 0.75).abs() < f64::EPSILON);
        assert_eq!(ThrottleTotals::default().success_ratio(), 1.0);
    }

    #[test]
    fn test_serializes_to_json() {
        let totals = ThrottleTotals {
            submitted: 7,
            ..Default::default()
        };
        let json = serde_json::to_value(totals).unwrap();
        assert_eq!(json["submitted"], 7);
        assert_eq!(json["peak_active"], 0);
    }
}
