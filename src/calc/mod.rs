//! Calorie and muscle-balance calculations
//!
//! Both calculators are pure functions over a parsed workout and the
//! enrichment records aligned 1:1 with its exercises.

pub mod balance;
pub mod calories;

pub use balance::{MuscleBalanceResult, MuscleVolume, calculate_muscle_balance, load_from_equipment};
pub use calories::{
    CalculationMethod, CalorieResult, ExerciseCalories, MethodComparison, MuscleShare,
    NO_ENRICHMENT_DATA, calculate_workout_calories,
};

use serde::{Deserialize, Serialize};

/// Fallback constants used by both calculators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalcConstants {
    /// Reference body weight MET and cal-per-rep figures are calibrated to (kg)
    pub base_weight: f64,
    /// Average time per repetition when no duration is declared
    pub seconds_per_rep: f64,
    /// Used when an exercise has no calories-per-rep figure
    pub default_cal_per_rep: f64,
    /// MET assigned to exercises nobody could enrich
    pub default_met: f64,
    /// Mean MET below this is replaced by `high_intensity_met`
    pub min_mean_met: f64,
    pub high_intensity_met: f64,
    /// Added to rep-derived elapsed time for transitions between exercises
    pub transition_buffer_secs: u64,
    /// Load credited to bodyweight or unparsable equipment (kg)
    pub bodyweight_load_kg: f64,
    /// Reps assumed per exercise when muscle balance runs without an exercise list
    pub default_reps_without_list: u32,
}

impl Default for CalcConstants {
    fn default() -> Self {
        Self {
            base_weight: 70.0,
            seconds_per_rep: 3.0,
            default_cal_per_rep: 0.3,
            default_met: 8.0,
            min_mean_met: 3.0,
            high_intensity_met: 8.0,
            transition_buffer_secs: 60,
            bodyweight_load_kg: 30.0,
            default_reps_without_list: 10,
        }
    }
}

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
