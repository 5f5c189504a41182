//! Input boundary - loose records in, validated set inputs out
//!
//! Stored rows, JSON payloads and CLI arguments all pass through here.
//! Legacy field names and string-encoded numbers are accepted in this one
//! place; everything past the boundary works with [`SetInput`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::units::WeightUnit;

/// Highest half-rep count that is taken into account
pub const MAX_HALF_REPS: u8 = 5;

/// Rejected input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} is not a number: {value:?}")]
    NotANumber { field: &'static str, value: String },

    #[error("{field} is out of range (got {value})")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("unknown set type: {0:?}")]
    UnknownSetType(String),

    #[error("unknown cardio mode: {0:?}")]
    UnknownCardioMode(String),

    #[error("RPE must be between 0 and 10 (got {0})")]
    RpeOutOfRange(f64),
}

/// Kind of set as logged by the user
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SetType {
    #[serde(rename = "W")]
    Warmup,
    #[default]
    #[serde(rename = "S")]
    Standard,
    #[serde(rename = "F")]
    Failure,
    #[serde(rename = "D")]
    Drop,
}

impl SetType {
    pub fn parse(tag: &str) -> Result<Self, ValidationError> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "w" | "warmup" | "warm-up" => Ok(SetType::Warmup),
            "" | "s" | "standard" => Ok(SetType::Standard),
            "f" | "failure" => Ok(SetType::Failure),
            "d" | "drop" | "dropset" => Ok(SetType::Drop),
            _ => Err(ValidationError::UnknownSetType(tag.to_string())),
        }
    }

    /// Single-letter code used in storage
    pub fn code(&self) -> &'static str {
        match self {
            SetType::Warmup => "W",
            SetType::Standard => "S",
            SetType::Failure => "F",
            SetType::Drop => "D",
        }
    }

    /// Only working sets take part in PR detection
    pub fn is_working(&self) -> bool {
        matches!(self, SetType::Standard | SetType::Failure)
    }
}

/// Number that may arrive as JSON number or as decimal text ("100.00")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseNumber {
    Number(f64),
    Text(String),
}

impl LooseNumber {
    fn to_f64(&self, field: &'static str) -> Result<f64, ValidationError> {
        match self {
            LooseNumber::Number(n) => Ok(*n),
            LooseNumber::Text(s) => s.trim().parse::<f64>().map_err(|_| ValidationError::NotANumber {
                field,
                value: s.clone(),
            }),
        }
    }
}

/// Set record as it appears on the wire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSet {
    #[serde(default)]
    pub reps: i64,
    #[serde(default, alias = "halfReps")]
    pub half_reps: Option<i64>,
    #[serde(default)]
    pub weight: Option<LooseNumber>,
    #[serde(default, alias = "weight_unit", alias = "weightUnit")]
    pub unit: Option<String>,
    #[serde(default, alias = "type", alias = "setType")]
    pub set_type: Option<String>,
}

/// Validated strength set input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetInput {
    pub reps: u32,
    /// Already clamped to `0..=MAX_HALF_REPS`
    pub half_reps: u8,
    pub weight: Option<f64>,
    pub unit: WeightUnit,
    pub set_type: SetType,
}

impl SetInput {
    /// Validate raw numbers into a standard set
    pub fn new(
        reps: i64,
        half_reps: i64,
        weight: Option<f64>,
        unit: WeightUnit,
    ) -> Result<Self, ValidationError> {
        if reps < 0 {
            return Err(ValidationError::Negative { field: "reps", value: reps as f64 });
        }
        if half_reps < 0 {
            return Err(ValidationError::Negative { field: "half_reps", value: half_reps as f64 });
        }
        if let Some(w) = weight {
            if !w.is_finite() {
                return Err(ValidationError::NonFinite { field: "weight" });
            }
            if w < 0.0 {
                return Err(ValidationError::Negative { field: "weight", value: w });
            }
        }

        Ok(Self {
            reps: u32::try_from(reps)
                .map_err(|_| ValidationError::OutOfRange { field: "reps", value: reps as f64 })?,
            half_reps: half_reps.min(MAX_HALF_REPS as i64) as u8,
            weight,
            unit,
            set_type: SetType::Standard,
        })
    }

    pub fn with_set_type(mut self, set_type: SetType) -> Self {
        self.set_type = set_type;
        self
    }

    /// Weight in kilograms, if any
    pub fn weight_kg(&self) -> Option<f64> {
        crate::units::normalize_kg(self.weight, self.unit)
    }

    /// Whole reps plus half a rep per partial
    pub fn effective_reps(&self) -> f64 {
        super::metrics::effective_reps(self.reps, self.half_reps)
    }
}

impl TryFrom<RawSet> for SetInput {
    type Error = ValidationError;

    fn try_from(raw: RawSet) -> Result<Self, Self::Error> {
        let weight = raw.weight.as_ref().map(|w| w.to_f64("weight")).transpose()?;
        let set_type = match raw.set_type.as_deref() {
            Some(tag) => SetType::parse(tag)?,
            None => SetType::Standard,
        };

        Ok(SetInput::new(
            raw.reps,
            raw.half_reps.unwrap_or(0),
            weight,
            WeightUnit::from_tag(raw.unit.as_deref()),
        )?
        .with_set_type(set_type))
    }
}

/// RPE is optional; when given it must be on the 0-10 scale
pub fn validate_rpe(rpe: Option<f64>) -> Result<Option<f64>, ValidationError> {
    match rpe {
        Some(v) if !v.is_finite() => Err(ValidationError::NonFinite { field: "rpe" }),
        Some(v) if !(0.0..=10.0).contains(&v) => Err(ValidationError::RpeOutOfRange(v)),
        other => Ok(other),
    }
}
