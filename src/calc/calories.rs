//! Calorie estimation - volume-based vs time-based, the larger one wins

use serde::Serialize;

use super::{CalcConstants, round1};
use crate::enrich::EnrichmentRecord;
use crate::parser::{ExerciseEntry, WorkoutRecord};
use crate::vocabulary::{MuscleGroup, MuscleMap};

/// Error tag of a result computed without any enrichment
pub const NO_ENRICHMENT_DATA: &str = "no enrichment data";

/// Which estimate produced the total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    /// reps × calories per rep × weight factor
    RepsBased,
    /// mean MET × body weight × hours
    TimeBased,
    NoData,
}

impl CalculationMethod {
    pub fn label(&self) -> &'static str {
        match self {
            CalculationMethod::RepsBased => "по объёму",
            CalculationMethod::TimeBased => "по времени",
            CalculationMethod::NoData => "нет данных",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseCalories {
    pub name: String,
    pub equipment: String,
    pub reps: u32,
    pub calories: f64,
    pub met_base: f64,
    pub cal_per_rep: f64,
    pub method: CalculationMethod,
}

/// Both raw totals, kept for auditability
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MethodComparison {
    pub volume_based: f64,
    pub time_based: f64,
}

/// How many exercises hit a muscle group
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MuscleShare {
    pub count: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalorieResult {
    pub total_calories: f64,
    pub per_exercise: Vec<ExerciseCalories>,
    pub muscle_distribution: MuscleMap<MuscleShare>,
    pub total_reps: u32,
    pub total_sets: u32,
    pub total_time_seconds: u64,
    pub estimated_time_minutes: f64,
    /// Duration the time-based estimate used (minutes)
    pub duration_minutes: f64,
    /// Effective mean MET after the intensity floor
    pub average_met: f64,
    pub user_weight: f64,
    pub calculation_method: CalculationMethod,
    pub comparison: MethodComparison,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CalorieResult {
    /// Zeroed result tagged as "nothing to compute"
    pub fn no_data(user_weight: f64) -> Self {
        Self {
            total_calories: 0.0,
            per_exercise: Vec::new(),
            muscle_distribution: MuscleMap::default(),
            total_reps: 0,
            total_sets: 0,
            total_time_seconds: 0,
            estimated_time_minutes: 0.0,
            duration_minutes: 0.0,
            average_met: 0.0,
            user_weight,
            calculation_method: CalculationMethod::NoData,
            comparison: MethodComparison::default(),
            error: Some(NO_ENRICHMENT_DATA.to_string()),
        }
    }

    pub fn is_no_data(&self) -> bool {
        self.calculation_method == CalculationMethod::NoData
    }
}

/// Volume-based calories of one exercise, rounded to 0.1
fn volume_calories(reps: u32, record: &EnrichmentRecord, factor: f64, constants: &CalcConstants) -> f64 {
    let cal_per_rep = if record.cal_per_rep > 0.0 {
        record.cal_per_rep
    } else {
        constants.default_cal_per_rep
    };
    round1(cal_per_rep * f64::from(reps) * factor)
}

/// Mean MET with the floor applied
fn effective_met(records: &[&EnrichmentRecord], constants: &CalcConstants) -> f64 {
    if records.is_empty() {
        return constants.high_intensity_met;
    }
    let mean = records.iter().map(|r| r.met_base).sum::<f64>() / records.len() as f64;
    if !mean.is_finite() || mean < constants.min_mean_met {
        constants.high_intensity_met
    } else {
        mean
    }
}

/// Split `total` by `weights`, per-entry rounded; the rounding drift goes
/// to the largest entry so the parts add back up to `total`
fn redistribute(total: f64, weights: &[f64]) -> Vec<f64> {
    if weights.is_empty() {
        return Vec::new();
    }
    let sum: f64 = weights.iter().sum();
    let mut parts: Vec<f64> = if sum > 0.0 {
        weights.iter().map(|w| round1(total * w / sum)).collect()
    } else {
        let equal = total / weights.len() as f64;
        weights.iter().map(|_| round1(equal)).collect()
    };

    let drift = round1(total - parts.iter().sum::<f64>());
    if drift != 0.0 {
        let largest = parts
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);
        parts[largest] = round1(parts[largest] + drift);
    }
    parts
}

fn muscle_distribution(records: &[&EnrichmentRecord]) -> MuscleMap<MuscleShare> {
    let mut counts: MuscleMap<u32> = MuscleMap::default();
    for record in records {
        let mut seen: MuscleMap<bool> = MuscleMap::default();
        for group in &record.muscle_groups {
            if !seen[*group] {
                seen[*group] = true;
                counts[*group] += 1;
            }
        }
    }

    let n = records.len();
    MuscleMap::from_fn(|group: MuscleGroup| {
        let count = counts[group];
        let percentage = if n > 0 {
            round1(f64::from(count) / n as f64 * 100.0)
        } else {
            0.0
        };
        MuscleShare { count, percentage }
    })
}

/// Estimate calories for a workout
///
/// `enrichment` is aligned 1:1 with `workout.exercises`; extra entries on
/// either side are ignored. `user_weight` is the athlete's body weight.
pub fn calculate_workout_calories(
    workout: &WorkoutRecord,
    enrichment: &[EnrichmentRecord],
    user_weight: f64,
    constants: &CalcConstants,
) -> CalorieResult {
    let pairs: Vec<(&ExerciseEntry, &EnrichmentRecord)> =
        workout.exercises.iter().zip(enrichment.iter()).collect();
    if pairs.is_empty() {
        return CalorieResult::no_data(user_weight);
    }

    let factor = if constants.base_weight > 0.0 {
        user_weight / constants.base_weight
    } else {
        1.0
    };
    let records: Vec<&EnrichmentRecord> = pairs.iter().map(|(_, r)| *r).collect();

    let total_reps = pairs.iter().fold(0u32, |acc, (ex, _)| acc.saturating_add(ex.reps));
    let seconds_per_rep = workout
        .scheme
        .time_per_rep_secs
        .map(f64::from)
        .unwrap_or(constants.seconds_per_rep);

    let duration_minutes = if workout.duration > 0.0 {
        workout.duration
    } else {
        f64::from(total_reps) * seconds_per_rep / 60.0
    };

    // Объёмный расчёт
    let volume: Vec<f64> = pairs
        .iter()
        .map(|(ex, record)| volume_calories(ex.reps, record, factor, constants))
        .collect();
    let volume_total = round1(volume.iter().sum());

    // Расчёт по времени
    let average_met = effective_met(&records, constants);
    let time_total = round1(average_met * user_weight * duration_minutes / 60.0);

    let (method, total_calories, calories) = if volume_total >= time_total {
        (CalculationMethod::RepsBased, volume_total, volume)
    } else {
        let weights: Vec<f64> = if volume.iter().sum::<f64>() > 0.0 {
            volume
        } else {
            pairs.iter().map(|(ex, _)| f64::from(ex.reps)).collect()
        };
        (CalculationMethod::TimeBased, time_total, redistribute(time_total, &weights))
    };

    let per_exercise = pairs
        .iter()
        .zip(calories)
        .map(|((ex, record), calories)| ExerciseCalories {
            name: ex.name.clone(),
            equipment: ex.equipment.clone().unwrap_or_else(|| record.equipment.clone()),
            reps: ex.reps,
            calories,
            met_base: record.met_base,
            cal_per_rep: record.cal_per_rep,
            method,
        })
        .collect();

    let total_time_seconds = if workout.duration > 0.0 {
        (workout.duration * 60.0).round() as u64
    } else {
        (f64::from(total_reps) * seconds_per_rep).round() as u64 + constants.transition_buffer_secs
    };

    CalorieResult {
        total_calories,
        per_exercise,
        muscle_distribution: muscle_distribution(&records),
        total_reps,
        total_sets: workout.scheme.rounds,
        total_time_seconds,
        estimated_time_minutes: round1(total_time_seconds as f64 / 60.0),
        duration_minutes: round1(duration_minutes),
        average_met: round1(average_met),
        user_weight,
        calculation_method: method,
        comparison: MethodComparison {
            volume_based: volume_total,
            time_based: time_total,
        },
        error: None,
    }
}
