//! PR module - personal record detection
//!
//! Features:
//! - Weight normalization to kilograms before any comparison
//! - Estimated 1RM (Epley), volume and effective reps per set
//! - Running maxima over prior working sets of the same owner and exercise
//! - Strict-inequality classification into weight, e1RM, volume and rep PRs
//! - Cardio records per cardio mode

pub mod cardio;
pub mod history;
pub mod input;
pub mod metrics;

pub use cardio::{CardioFlags, CardioInput, CardioMode};
pub use history::HistoricalMaxima;
pub use input::{RawSet, SetInput, SetType, ValidationError};
pub use metrics::SetMetrics;

use serde::{Deserialize, Serialize};

/// How records are granted when there is nothing to compare against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrPolicy {
    /// When false (default) a first-ever working set only sets a baseline
    pub first_set_counts_as_pr: bool,
}

impl PrPolicy {
    /// True when an empty history must yield no flags
    pub fn needs_baseline(&self, history_is_empty: bool) -> bool {
        history_is_empty && !self.first_set_counts_as_pr
    }
}

/// PR category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrCategory {
    AbsWeight,
    E1rm,
    Volume,
    Reps,
}

impl PrCategory {
    pub fn label(&self) -> &'static str {
        match self {
            PrCategory::AbsWeight => "heaviest weight",
            PrCategory::E1rm => "best estimated 1RM",
            PrCategory::Volume => "best set volume",
            PrCategory::Reps => "most reps",
        }
    }
}

/// Flags attached to a set after evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrFlags {
    pub is_abs_weight_pr: bool,
    pub is_e1rm_pr: bool,
    pub is_volume_pr: bool,
    pub is_rep_pr: bool,
}

impl PrFlags {
    /// Aggregate flag
    pub fn is_pr(&self) -> bool {
        self.is_abs_weight_pr || self.is_e1rm_pr || self.is_volume_pr || self.is_rep_pr
    }

    /// Every category that was broken
    pub fn categories(&self) -> Vec<PrCategory> {
        [
            (self.is_abs_weight_pr, PrCategory::AbsWeight),
            (self.is_e1rm_pr, PrCategory::E1rm),
            (self.is_volume_pr, PrCategory::Volume),
            (self.is_rep_pr, PrCategory::Reps),
        ]
        .into_iter()
        .filter_map(|(hit, category)| hit.then_some(category))
        .collect()
    }

    /// Categories worth celebrating; rep PRs are recorded but not shown
    pub fn celebrations(&self) -> Vec<PrCategory> {
        self.categories()
            .into_iter()
            .filter(|c| *c != PrCategory::Reps)
            .collect()
    }
}

/// Strict comparison of a set's metrics against historical maxima
pub fn classify(metrics: &SetMetrics, maxima: &HistoricalMaxima) -> PrFlags {
    let beats = |value: Option<f64>, best: f64| value.is_some_and(|v| v > best);

    PrFlags {
        is_abs_weight_pr: beats(metrics.weight_kg, maxima.weight_kg),
        is_e1rm_pr: beats(metrics.e1rm, maxima.e1rm),
        is_volume_pr: beats(metrics.volume, maxima.volume),
        is_rep_pr: metrics.reps > maxima.reps,
    }
}

/// Evaluate a new set against its already aggregated history
pub fn evaluate_against(set: &SetInput, maxima: &HistoricalMaxima, policy: PrPolicy) -> PrFlags {
    if !set.set_type.is_working() || policy.needs_baseline(maxima.is_empty()) {
        return PrFlags::default();
    }
    classify(&SetMetrics::of(set), maxima)
}

/// Evaluate a new set against prior sets of the same owner and exercise.
///
/// `history` must not contain the set being evaluated.
pub fn evaluate(set: &SetInput, history: &[SetInput], policy: PrPolicy) -> PrFlags {
    evaluate_against(set, &HistoricalMaxima::from_sets(history), policy)
}

/// Flags and metrics of one evaluated set, as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub is_pr: bool,
    #[serde(flatten)]
    pub flags: PrFlags,
    pub metrics: SetMetrics,
}

/// Validate wire records, then evaluate `set` against `history`
pub fn evaluate_raw(
    set: RawSet,
    history: Vec<RawSet>,
    policy: PrPolicy,
) -> Result<Evaluation, ValidationError> {
    let input = SetInput::try_from(set)?;
    let prior = history
        .into_iter()
        .map(SetInput::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let flags = evaluate(&input, &prior, policy);
    Ok(Evaluation { is_pr: flags.is_pr(), flags, metrics: SetMetrics::of(&input) })
}
