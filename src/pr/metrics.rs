//! Derived set metrics: effective reps, estimated 1RM, volume
//!
//! The estimated one-rep max always uses the Epley formula,
//! `weight * (1 + reps / 30)`. History aggregation, evaluation and display
//! share these functions so a set is never judged by two formulas.

use serde::Serialize;

use super::input::{MAX_HALF_REPS, SetInput};

/// Whole reps plus 0.5 per half rep (half reps clamped to 0..=5)
pub fn effective_reps(reps: u32, half_reps: u8) -> f64 {
    reps as f64 + 0.5 * half_reps.min(MAX_HALF_REPS) as f64
}

/// Epley estimated one-rep max
pub fn estimate_1rm(weight_kg: Option<f64>, reps: f64) -> Option<f64> {
    let w = weight_kg.filter(|w| w.is_finite())?;
    if !reps.is_finite() || reps <= 0.0 {
        return None;
    }
    Some(w * (1.0 + reps / 30.0))
}

/// Weight moved in one set
pub fn volume(weight_kg: Option<f64>, reps: f64) -> Option<f64> {
    weight_kg.map(|w| w * reps)
}

/// Everything the classifier compares for one set
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SetMetrics {
    pub weight_kg: Option<f64>,
    pub e1rm: Option<f64>,
    pub volume: Option<f64>,
    pub reps: f64,
}

impl SetMetrics {
    pub fn of(input: &SetInput) -> Self {
        let weight_kg = input.weight_kg();
        let reps = input.effective_reps();
        Self {
            weight_kg,
            e1rm: estimate_1rm(weight_kg, reps),
            volume: volume(weight_kg, reps),
            reps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::WeightUnit;

    #[test]
    fn test_effective_reps_counts_halves() {
        assert_eq!(effective_reps(5, 0), 5.0);
        assert_eq!(effective_reps(5, 1), 5.5);
        assert_eq!(effective_reps(0, 3), 1.5);
        assert_eq!(effective_reps(5, 200), 7.5);
    }

    #[test]
    fn test_e1rm_epley() {
        assert_eq!(estimate_1rm(Some(100.0), 30.0), Some(200.0));
        let e = estimate_1rm(Some(90.0), 3.0).unwrap();
        assert!((e - 99.0).abs() < 1e-9);
    }

    #[test]
    fn test_e1rm_missing_inputs() {
        assert_eq!(estimate_1rm(None, 5.0), None);
        assert_eq!(estimate_1rm(Some(100.0), 0.0), None);
        assert_eq!(estimate_1rm(Some(f64::NAN), 5.0), None);
        assert_eq!(estimate_1rm(Some(100.0), f64::INFINITY), None);
    }

    #[test]
    fn test_e1rm_defined_at_high_reps() {
        // No singular denominator at 37 reps with Epley
        let e = estimate_1rm(Some(20.0), 37.0).unwrap();
        assert!(e > 20.0);
        assert!(estimate_1rm(Some(20.0), 50.0).unwrap() > e);
    }

    #[test]
    fn test_volume() {
        assert_eq!(volume(Some(100.0), 5.0), Some(500.0));
        assert_eq!(volume(Some(100.0), 5.5), Some(550.0));
        assert_eq!(volume(None, 5.0), None);
    }

    #[test]
    fn test_monotonic_in_weight() {
        let mut prev_volume = f64::NEG_INFINITY;
        let mut prev_e1rm = f64::NEG_INFINITY;
        for step in 0..200 {
            let w = step as f64 * 2.5;
            let v = volume(Some(w), 8.0).unwrap();
            let e = estimate_1rm(Some(w), 8.0).unwrap();
            assert!(v >= prev_volume);
            assert!(e >= prev_e1rm);
            prev_volume = v;
            prev_e1rm = e;
        }
    }

    #[test]
    fn test_metrics_of_lbs_set() {
        let input = SetInput::new(10, 0, Some(100.0), WeightUnit::Lbs).unwrap();
        let m = SetMetrics::of(&input);
        let kg = 100.0 * 0.45359237;
        assert_eq!(m.weight_kg, Some(kg));
        assert_eq!(m.volume, Some(kg * 10.0));
        assert_eq!(m.reps, 10.0);
    }

    #[test]
    fn test_metrics_of_bodyweight_set() {
        let input = SetInput::new(15, 1, None, WeightUnit::Kg).unwrap();
        let m = SetMetrics::of(&input);
        assert_eq!(m.weight_kg, None);
        assert_eq!(m.e1rm, None);
        assert_eq!(m.volume, None);
        assert_eq!(m.reps, 15.5);
    }
}
