//! Cardio records - distance, pace, ascent, intensity and rowing split

use std::fmt;

use serde::{Deserialize, Serialize};

use super::PrPolicy;
use super::input::ValidationError;

/// Cardio machine / activity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CardioMode {
    Treadmill,
    Bike,
    Elliptical,
    Stairs,
    Row,
}

impl CardioMode {
    pub fn parse(tag: &str) -> Result<Self, ValidationError> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "treadmill" => Ok(CardioMode::Treadmill),
            "bike" | "stationary bike" => Ok(CardioMode::Bike),
            "elliptical" => Ok(CardioMode::Elliptical),
            "stairs" | "stair climber" => Ok(CardioMode::Stairs),
            "row" | "rowing" | "rowing machine" => Ok(CardioMode::Row),
            _ => Err(ValidationError::UnknownCardioMode(tag.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CardioMode::Treadmill => "treadmill",
            CardioMode::Bike => "bike",
            CardioMode::Elliptical => "elliptical",
            CardioMode::Stairs => "stairs",
            CardioMode::Row => "row",
        }
    }
}

impl fmt::Display for CardioMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cardio entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardioInput {
    pub mode: CardioMode,
    pub duration_seconds: u32,
    pub distance_meters: Option<f64>,
    pub floors: Option<u32>,
    pub level: Option<f64>,
    /// Seconds per 500 m (rowing)
    pub split_seconds: Option<f64>,
    /// Strokes per minute (rowing)
    pub spm: Option<f64>,
}

impl CardioInput {
    pub fn new(mode: CardioMode, duration_seconds: u32) -> Self {
        Self {
            mode,
            duration_seconds,
            distance_meters: None,
            floors: None,
            level: None,
            split_seconds: None,
            spm: None,
        }
    }

    /// Reject negative or non-finite measurements
    pub fn validate(self) -> Result<Self, ValidationError> {
        let fields = [
            ("distance_meters", self.distance_meters),
            ("level", self.level),
            ("split_seconds", self.split_seconds),
            ("spm", self.spm),
        ];
        for (field, value) in fields {
            match value {
                Some(v) if !v.is_finite() => return Err(ValidationError::NonFinite { field }),
                Some(v) if v < 0.0 => return Err(ValidationError::Negative { field, value: v }),
                _ => {}
            }
        }
        Ok(self)
    }

    fn distance(&self) -> f64 {
        self.distance_meters.unwrap_or(0.0)
    }

    fn floors(&self) -> u32 {
        self.floors.unwrap_or(0)
    }

    /// Meters per second
    fn pace(&self) -> Option<f64> {
        (self.distance() > 0.0 && self.duration_seconds > 0)
            .then(|| self.distance() / self.duration_seconds as f64)
    }

    /// Floors per minute
    fn climb_rate(&self) -> Option<f64> {
        (self.floors() > 0 && self.duration_seconds > 0)
            .then(|| self.floors() as f64 / (self.duration_seconds as f64 / 60.0))
    }

    fn split(&self) -> Option<f64> {
        self.split_seconds.filter(|s| *s > 0.0)
    }
}

/// Cardio record flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardioFlags {
    pub is_distance_pr: bool,
    pub is_pace_pr: bool,
    pub is_ascent_pr: bool,
    pub is_intensity_pr: bool,
    pub is_split_pr: bool,
}

impl CardioFlags {
    pub fn is_pr(&self) -> bool {
        self.is_distance_pr
            || self.is_pace_pr
            || self.is_ascent_pr
            || self.is_intensity_pr
            || self.is_split_pr
    }
}

fn max_of(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, f64::max)
}

/// Evaluate a cardio entry against prior entries of the same owner and
/// exercise. Entries recorded in another mode are ignored.
pub fn evaluate_cardio(entry: &CardioInput, history: &[CardioInput], policy: PrPolicy) -> CardioFlags {
    let same_mode: Vec<&CardioInput> = history.iter().filter(|h| h.mode == entry.mode).collect();
    let mut flags = CardioFlags::default();

    if policy.needs_baseline(same_mode.is_empty()) {
        return flags;
    }

    match entry.mode {
        CardioMode::Treadmill | CardioMode::Bike | CardioMode::Elliptical => {
            if let Some(pace) = entry.pace() {
                let max_distance = max_of(same_mode.iter().map(|h| h.distance()));
                let max_pace = max_of(same_mode.iter().filter_map(|h| h.pace()));
                flags.is_distance_pr = entry.distance() > max_distance;
                flags.is_pace_pr = pace > max_pace;
            }
        }
        CardioMode::Stairs => {
            if let Some(rate) = entry.climb_rate() {
                let max_floors = same_mode.iter().map(|h| h.floors()).max().unwrap_or(0);
                let max_rate = max_of(same_mode.iter().filter_map(|h| h.climb_rate()));
                flags.is_ascent_pr = entry.floors() > max_floors;
                flags.is_intensity_pr = rate > max_rate;
            }
        }
        CardioMode::Row => {
            if entry.distance() > 0.0 {
                let max_distance = max_of(same_mode.iter().map(|h| h.distance()));
                flags.is_distance_pr = entry.distance() > max_distance;

                // Lower split is better
                let best_split = same_mode
                    .iter()
                    .filter_map(|h| h.split())
                    .fold(None, |best: Option<f64>, s| Some(best.map_or(s, |b| b.min(s))));
                if let Some(split) = entry.split() {
                    flags.is_split_pr = best_split.is_none_or(|b| split < b);
                }
            }
        }
    }

    flags
}
