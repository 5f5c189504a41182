//! Historical aggregation - running maxima over prior sets

use serde::Serialize;

use super::input::SetInput;
use super::metrics::SetMetrics;

/// Best values seen so far for one owner and exercise.
///
/// Every maximum starts at negative infinity; `qualifying_sets` tells
/// whether anything was aggregated at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoricalMaxima {
    pub weight_kg: f64,
    pub e1rm: f64,
    pub volume: f64,
    pub reps: f64,
    pub qualifying_sets: usize,
}

impl Default for HistoricalMaxima {
    fn default() -> Self {
        Self {
            weight_kg: f64::NEG_INFINITY,
            e1rm: f64::NEG_INFINITY,
            volume: f64::NEG_INFINITY,
            reps: f64::NEG_INFINITY,
            qualifying_sets: 0,
        }
    }
}

impl HistoricalMaxima {
    /// Aggregate over prior sets. Non-working sets are skipped.
    pub fn from_sets<'a, I>(sets: I) -> Self
    where
        I: IntoIterator<Item = &'a SetInput>,
    {
        let mut maxima = Self::default();
        for set in sets {
            maxima.push(set);
        }
        maxima
    }

    /// Fold one prior set into the maxima
    pub fn push(&mut self, set: &SetInput) {
        if !set.set_type.is_working() {
            return;
        }
        let m = SetMetrics::of(set);

        // Null weight only counts towards the rep maximum
        if let Some(w) = m.weight_kg {
            self.weight_kg = self.weight_kg.max(w);
        }
        if let Some(e) = m.e1rm {
            self.e1rm = self.e1rm.max(e);
        }
        if let Some(v) = m.volume {
            self.volume = self.volume.max(v);
        }
        self.reps = self.reps.max(m.reps);
        self.qualifying_sets += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.qualifying_sets == 0
    }

    /// Value for display, `None` while still at negative infinity
    pub fn best(value: f64) -> Option<f64> {
        value.is_finite().then_some(value)
    }
}
