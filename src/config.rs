//! Settings - explicit context handed to every operation that needs it

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::pr::PrPolicy;
use crate::units::WeightUnit;

pub const DEFAULT_DB_PATH: &str = "strengthy.db";
pub const DEFAULT_OWNER: &str = "me";

/// User settings resolved once at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub db_path: PathBuf,
    /// Whose workouts are read and written
    pub owner: String,
    /// Unit used when none is given and for displaying bests
    pub weight_unit: WeightUnit,
    pub pr_policy: PrPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            owner: DEFAULT_OWNER.to_string(),
            weight_unit: WeightUnit::Kg,
            pr_policy: PrPolicy::default(),
        }
    }
}

impl Settings {
    /// Unit for an entry: explicit tag if given, otherwise the preference
    pub fn unit_or_default(&self, tag: Option<&str>) -> WeightUnit {
        match tag {
            Some(t) => WeightUnit::from_tag(Some(t)),
            None => self.weight_unit,
        }
    }

    /// Format a kilogram value in the preferred unit
    pub fn display_kg(&self, kg: f64) -> String {
        format!("{:.1} {}", self.weight_unit.kg_in_unit(kg), self.weight_unit)
    }
}
