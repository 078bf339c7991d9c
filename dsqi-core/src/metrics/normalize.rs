//! Threshold normalization of raw metrics onto `[0, 1]`.
//!
//! Each measurable metric has a "worst case" anchor. A raw value at or above
//! its anchor scores 1.0 (maximally costly); zero scores 0.0. Disposable
//! software is expected to sit near zero on every axis.
//!
//! | Metric | Threshold | Reading |
//! |--------|-----------|---------|
//! | dependency count | 20 | 0 deps = 0.0, 20+ = 1.0 |
//! | average complexity | 15 | avg CC 1 ≈ 0.07, 15+ = 1.0 |
//! | deployment steps | 10 | 0 steps = 0.0, 10+ = 1.0 |
//! | lines of code | 5000 | 5000+ = 1.0 |
//! | development minutes | 480 | 8 hours+ = 1.0 |

/// Worst-case anchors for normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub dependency_count: f64,
    pub complexity_avg: f64,
    pub deployment_steps: f64,
    pub lines_of_code: f64,
    pub dev_time_minutes: f64,
}

/// The fixed DSQI anchors.
pub const THRESHOLDS: Thresholds = Thresholds {
    dependency_count: 20.0,
    complexity_avg: 15.0,
    deployment_steps: 10.0,
    lines_of_code: 5000.0,
    dev_time_minutes: 480.0,
};

impl Default for Thresholds {
    fn default() -> Self {
        THRESHOLDS
    }
}

/// Map `value` onto `[0, 1]` relative to `threshold`.
///
/// A zero threshold yields 0.0 for any value.
pub fn normalize(value: f64, threshold: f64) -> f64 {
    if threshold == 0.0 {
        return 0.0;
    }
    (value / threshold).clamp(0.0, 1.0)
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [f64; 5] = [
        THRESHOLDS.dependency_count,
        THRESHOLDS.complexity_avg,
        THRESHOLDS.deployment_steps,
        THRESHOLDS.lines_of_code,
        THRESHOLDS.dev_time_minutes,
    ];

    #[test]
    fn test_normalize_stays_in_unit_interval() {
        for threshold in ALL {
            for step in 0..200 {
                let value = step as f64 * threshold / 50.0;
                let n = normalize(value, threshold);
                assert!((0.0..=1.0).contains(&n), "{value}/{threshold} -> {n}");
            }
        }
    }

    #[test]
    fn test_normalize_is_monotonic() {
        for threshold in ALL {
            let mut previous = 0.0;
            for step in 0..500 {
                let n = normalize(step as f64 * 0.37, threshold);
                assert!(n >= previous);
                previous = n;
            }
        }
    }

    #[test]
    fn test_normalize_saturates_at_threshold() {
        for threshold in ALL {
            assert_eq!(normalize(threshold, threshold), 1.0);
            assert_eq!(normalize(threshold * 3.5, threshold), 1.0);
            assert_eq!(normalize(0.0, threshold), 0.0);
        }
        assert_eq!(normalize(10.0, 20.0), 0.5);
    }

    #[test]
    fn test_zero_threshold_is_zero() {
        for value in [0.0, 1.0, 42.0, 1e9] {
            assert_eq!(normalize(value, 0.0), 0.0);
        }
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(130.0 / 150.0, 4), 0.8667);
        assert_eq!(round_to(1.0 / 45.0, 4), 0.0222);
        assert_eq!(round_to(2.375, 2), 2.38);
        assert_eq!(round_to(3.0, 2), 3.0);
    }
}
