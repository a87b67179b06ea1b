//! Muscle balance - work volume per muscle group

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::{CalcConstants, round1};
use crate::enrich::EnrichmentRecord;
use crate::parser::{ExerciseEntry, SchemeRecord};
use crate::vocabulary::{MuscleGroup, MuscleMap};

static COUNT_TIMES_WEIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\s*[xXхХ×]\s*([0-9]+)").expect("valid load regex"));
static WEIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([0-9]+(?:[.,][0-9]+)?)\s*(?:кг|kg)").expect("valid weight regex"));

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MuscleVolume {
    pub volume: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MuscleBalanceResult {
    pub balance: MuscleMap<MuscleVolume>,
    pub primary_muscle: Option<MuscleGroup>,
    pub total_volume: f64,
}

impl MuscleBalanceResult {
    /// Groups with nonzero share, largest first
    pub fn ranked(&self) -> Vec<(MuscleGroup, MuscleVolume)> {
        let mut ranked: Vec<_> = self
            .balance
            .iter()
            .filter(|(_, v)| v.percentage > 0.0)
            .map(|(g, v)| (g, *v))
            .collect();
        ranked.sort_by(|a, b| b.1.percentage.total_cmp(&a.1.percentage));
        ranked
    }
}

/// Load in kg described by an equipment string
///
/// `2x24кг` gives 48, `24kg` gives 24. Bodyweight and anything unparsable
/// give 0.
pub fn load_from_equipment(equipment: &str) -> f64 {
    let lower = equipment.to_lowercase();
    if lower.trim().is_empty() || lower.contains("body") || lower.contains("собств") {
        return 0.0;
    }
    if let Some(caps) = COUNT_TIMES_WEIGHT_RE.captures(&lower) {
        let count: f64 = caps[1].parse().unwrap_or(0.0);
        let weight: f64 = caps[2].parse().unwrap_or(0.0);
        return count * weight;
    }
    WEIGHT_RE
        .captures(&lower)
        .and_then(|caps| caps[1].replace(',', ".").parse().ok())
        .unwrap_or(0.0)
}

/// Aggregate work volume per muscle group
///
/// Without an exercise list every enriched exercise counts as
/// `default_reps_without_list` reps. Each listed group receives the full
/// volume of the exercise.
pub fn calculate_muscle_balance(
    enrichment: &[EnrichmentRecord],
    exercises: Option<&[ExerciseEntry]>,
    scheme: Option<&SchemeRecord>,
    constants: &CalcConstants,
) -> MuscleBalanceResult {
    let scheme_equipment = scheme.and_then(|s| s.equipment.as_deref()).unwrap_or("");

    let mut volumes: MuscleMap<f64> = MuscleMap::default();
    let mut total_volume = 0.0;

    for (i, record) in enrichment.iter().enumerate() {
        let (reps, equipment) = match exercises {
            Some(list) => match list.get(i) {
                Some(ex) => (ex.reps, ex.equipment.as_deref()),
                None => break,
            },
            None => (constants.default_reps_without_list, None),
        };

        let equipment = equipment
            .filter(|e| !e.trim().is_empty())
            .or(Some(record.equipment.as_str()).filter(|e| !e.trim().is_empty()))
            .unwrap_or(scheme_equipment);

        let load = match load_from_equipment(equipment) {
            l if l > 0.0 => l,
            _ => constants.bodyweight_load_kg,
        };
        let volume = f64::from(reps) * load;

        let mut seen: MuscleMap<bool> = MuscleMap::default();
        let mut matched = 0u32;
        for group in &record.muscle_groups {
            if seen[*group] {
                continue;
            }
            seen[*group] = true;
            volumes[*group] += volume;
            matched += 1;
        }
        total_volume += volume * f64::from(matched);
    }

    let mut primary_muscle = None;
    let mut max_volume = 0.0;
    // строгое сравнение: при равенстве остаётся первая группа
    for group in MuscleGroup::ALL {
        if volumes[group] > max_volume {
            max_volume = volumes[group];
            primary_muscle = Some(group);
        }
    }

    let balance = MuscleMap::from_fn(|group| {
        let volume = volumes[group];
        let percentage = if total_volume > 0.0 {
            round1(volume / total_volume * 100.0)
        } else {
            0.0
        };
        MuscleVolume {
            volume: volume.round(),
            percentage,
        }
    });

    MuscleBalanceResult {
        balance,
        primary_muscle,
        total_volume: total_volume.round(),
    }
}
