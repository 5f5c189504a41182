//! Weight units - everything is compared in kilograms

use std::fmt;

use serde::{Deserialize, Serialize};

/// Exact kilograms in one pound
pub const KG_PER_LB: f64 = 0.45359237;

/// Unit a weight was entered in
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lbs,
}

impl WeightUnit {
    /// Parse a stored or user supplied unit tag.
    ///
    /// Anything that isn't recognizably pounds is treated as kilograms, so
    /// legacy rows without a unit keep working.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(|t| t.trim().to_ascii_lowercase()).as_deref() {
            Some("lbs" | "lb" | "pound" | "pounds") => WeightUnit::Lbs,
            _ => WeightUnit::Kg,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lbs => "lbs",
        }
    }

    /// Convert a weight in this unit to kilograms
    pub fn to_kg(&self, weight: f64) -> f64 {
        match self {
            WeightUnit::Kg => weight,
            WeightUnit::Lbs => weight * KG_PER_LB,
        }
    }

    /// Convert kilograms back into this unit (for display)
    pub fn kg_in_unit(&self, kg: f64) -> f64 {
        match self {
            WeightUnit::Kg => kg,
            WeightUnit::Lbs => kg / KG_PER_LB,
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a nullable weight to kilograms.
///
/// Returns `None` for a missing or non-finite weight. No rounding is applied.
pub fn normalize_kg(weight: Option<f64>, unit: WeightUnit) -> Option<f64> {
    weight.filter(|w| w.is_finite()).map(|w| unit.to_kg(w))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kg_is_identity() {
        for w in [0.0, 1.0, 62.5, 100.0, 227.3] {
            assert_eq!(normalize_kg(Some(w), WeightUnit::Kg), Some(w));
        }
    }

    #[test]
    fn test_lbs_uses_exact_factor() {
        for w in [0.0, 1.0, 45.0, 220.0, 405.5] {
            assert_eq!(normalize_kg(Some(w), WeightUnit::Lbs), Some(w * 0.45359237));
        }
    }

    #[test]
    fn test_missing_or_non_finite_weight() {
        assert_eq!(normalize_kg(None, WeightUnit::Kg), None);
        assert_eq!(normalize_kg(Some(f64::NAN), WeightUnit::Lbs), None);
        assert_eq!(normalize_kg(Some(f64::INFINITY), WeightUnit::Kg), None);
    }

    #[test]
    fn test_unknown_tag_defaults_to_kg() {
        assert_eq!(WeightUnit::from_tag(None), WeightUnit::Kg);
        assert_eq!(WeightUnit::from_tag(Some("")), WeightUnit::Kg);
        assert_eq!(WeightUnit::from_tag(Some("stone")), WeightUnit::Kg);
        assert_eq!(WeightUnit::from_tag(Some("KG")), WeightUnit::Kg);
    }

    #[test]
    fn test_pound_aliases() {
        assert_eq!(WeightUnit::from_tag(Some("lbs")), WeightUnit::Lbs);
        assert_eq!(WeightUnit::from_tag(Some(" LB ")), WeightUnit::Lbs);
        assert_eq!(WeightUnit::from_tag(Some("pounds")), WeightUnit::Lbs);
    }

    #[test]
    fn test_round_trip_for_display() {
        let kg = WeightUnit::Lbs.to_kg(225.0);
        assert!((WeightUnit::Lbs.kg_in_unit(kg) - 225.0).abs() < 1e-9);
    }
}
