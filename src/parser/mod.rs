//! Workout note parsing
//!
//! Turns a Markdown workout note into a [`WorkoutRecord`]: front matter,
//! scheme, and the scheme-aware exercise list.

pub mod document;
pub mod exercises;
pub mod scheme;
pub mod sections;

pub use document::Document;
pub use exercises::{ExerciseEntry, extract_exercises, extract_exercises_with};
pub use scheme::{SchemeRecord, extract_scheme, extract_scheme_with};

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::calc::load_from_equipment;
use crate::vocabulary::{self, SchemeType, Vocabulary};

/// Placeholder used when the note declares no goal
pub const DEFAULT_GOAL: &str = "Не указана";

/// Declared duration shorter than this many minutes per round is per-round time
const EMOM_PER_ROUND_THRESHOLD_MIN: f64 = 0.5;

static MM_SS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+):([0-9]{1,2})$").expect("valid mm:ss regex"));
static HOURS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+(?:[.,][0-9]+)?)\s*(?:часа|часов|час|hours?|ч|h)(?:[^\p{L}]|$)")
        .expect("valid hours regex")
});
static MINUTES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+(?:[.,][0-9]+)?)\s*(?:минуты|минут|мин|minutes?|mins?|m)(?:[^\p{L}]|$)")
        .expect("valid minutes regex")
});
static SECONDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+)\s*(?:секунды|секунд|сек|seconds?|secs?|s)\b").expect("valid seconds regex")
});

/// Parsed workout note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub date: String,
    #[serde(rename = "type")]
    pub workout_type: String,
    /// Declared equipment weight (kg), not the athlete's body weight
    pub weight: f64,
    /// Total duration in minutes, 0 when unknown
    pub duration: f64,
    pub goal: String,
    pub scheme: SchemeRecord,
    pub exercises: Vec<ExerciseEntry>,
    /// Original body, prior analysis included
    #[serde(skip)]
    pub raw_content: String,
}

impl WorkoutRecord {
    pub fn total_reps(&self) -> u32 {
        self.exercises.iter().map(|e| e.reps).sum()
    }
}

fn parse_decimal(s: &str) -> Option<f64> {
    s.replace(',', ".").parse().ok()
}

/// Parse a textual duration into minutes
///
/// Accepts `45`, `45 мин`, `1 час 10 минут`, `1ч30мин`, `12 минут 30 секунд`,
/// `90 сек` and `MM:SS`. A unit must not run into another letter.
pub fn parse_duration_str(raw: &str) -> Option<f64> {
    let s = raw.trim().to_lowercase();
    if s.is_empty() {
        return None;
    }

    if let Some(caps) = MM_SS_RE.captures(&s) {
        let minutes: f64 = caps[1].parse().ok()?;
        let seconds: f64 = caps[2].parse().ok()?;
        return Some(minutes + seconds / 60.0);
    }

    let mut total = 0.0;
    let mut found = false;
    if let Some(caps) = HOURS_RE.captures(&s) {
        total += parse_decimal(&caps[1])? * 60.0;
        found = true;
    }
    if let Some(caps) = MINUTES_RE.captures(&s) {
        total += parse_decimal(&caps[1])?;
        found = true;
    }
    if let Some(caps) = SECONDS_RE.captures(&s) {
        total += caps[1].parse::<f64>().ok()? / 60.0;
        found = true;
    }
    if found {
        return Some((total * 100.0).round() / 100.0);
    }

    parse_decimal(&s)
}

/// Duration metadata value in minutes
pub fn parse_duration(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_duration_str(s),
        _ => None,
    }
    .filter(|d| d.is_finite() && *d >= 0.0)
}

/// Total workout minutes from `duration` / `time` metadata
///
/// For EMOM, `time` is per-round, and a `duration` too short to hold all
/// rounds is read as per-round as well.
fn resolve_duration(doc: &Document, scheme: &SchemeRecord) -> f64 {
    let is_emom = scheme.scheme_type == Some(SchemeType::Emom);
    let rounds = f64::from(scheme.rounds);

    if let Some(value) = doc.get("duration") {
        return match parse_duration(value) {
            Some(d) if is_emom && scheme.rounds > 1 && d < rounds * EMOM_PER_ROUND_THRESHOLD_MIN => {
                d * rounds
            }
            Some(d) => d,
            None => 0.0,
        };
    }

    match doc.get("time").and_then(parse_duration) {
        Some(per_round) if is_emom => per_round * rounds,
        Some(d) => d,
        None => 0.0,
    }
}

/// Declared equipment weight; text forms go through the equipment parser
fn parse_weight(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => match load_from_equipment(s) {
            w if w > 0.0 => w,
            _ => parse_decimal(s.trim()).unwrap_or(0.0),
        },
        _ => 0.0,
    }
}

/// Body with generated analysis sections removed
pub fn strip_analysis(body: &str, vocab: &Vocabulary) -> String {
    sections::remove_sections(body, |heading| vocab.is_analysis_heading(heading))
}

/// Parse a workout note with the built-in vocabulary
pub fn parse_workout(raw_text: &str) -> Result<WorkoutRecord> {
    parse_workout_with(raw_text, vocabulary::standard())
}

/// Parse a workout note
///
/// Fails only when the front matter cannot be decoded.
pub fn parse_workout_with(raw_text: &str, vocab: &Vocabulary) -> Result<WorkoutRecord> {
    let doc = Document::parse(raw_text)?;

    let workout_type = doc.get_text("type");
    let cleaned = strip_analysis(&doc.body, vocab);

    let scheme = extract_scheme_with(&cleaned, &workout_type, vocab);
    let exercises = extract_exercises_with(&cleaned, &scheme, vocab);
    let duration = resolve_duration(&doc, &scheme);

    let goal = match doc.get_text("goal") {
        g if g.is_empty() => DEFAULT_GOAL.to_string(),
        g => g,
    };

    Ok(WorkoutRecord {
        date: doc.get_text("date"),
        workout_type,
        weight: parse_weight(doc.get("weight")),
        duration,
        goal,
        scheme,
        exercises,
        raw_content: doc.body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LADDER_NOTE: &str = "---
date: 2026-02-11
type: Лесенка
weight: 24
duration: 35 мин
goal: Выносливость
---

# Тренировка 2026-02-11

## Схема
- **Тип:** Лесенка
- **Паттерн:** 1-2-3-4-5-5-4-3-2-1
- **Снаряд:** 1x24кг

## Упражнения
- Толчок (1x24кг)
- Махи гирей

## Заметки
Разминка 10 минут
";

    #[test]
    fn test_parse_duration_forms() {
        assert_eq!(parse_duration_str("45"), Some(45.0));
        assert_eq!(parse_duration_str("45 мин"), Some(45.0));
        assert_eq!(parse_duration_str("30 min"), Some(30.0));
        assert_eq!(parse_duration_str("1:30"), Some(1.5));
        assert_eq!(parse_duration_str("12 минут 30 секунд"), Some(12.5));
        assert_eq!(parse_duration_str("1 час 10 минут"), Some(70.0));
        assert_eq!(parse_duration_str("1ч30мин"), Some(90.0));
        assert_eq!(parse_duration_str("1h30m"), Some(90.0));
        assert_eq!(parse_duration_str("1 ч 30 мин"), Some(90.0));
        assert_eq!(parse_duration_str("2h"), Some(120.0));
        assert_eq!(parse_duration_str("90 сек"), Some(1.5));
        assert_eq!(parse_duration_str("долго"), None);
        assert_eq!(parse_duration_str(""), None);
    }

    #[test]
    fn test_parse_duration_value() {
        assert_eq!(parse_duration(&Value::from(20)), Some(20.0));
        assert_eq!(parse_duration(&Value::from("20 мин")), Some(20.0));
        assert_eq!(parse_duration(&Value::Null), None);
    }

    #[test]
    fn test_parse_ladder_note() {
        let workout = parse_workout(LADDER_NOTE).unwrap();
        assert_eq!(workout.date, "2026-02-11");
        assert_eq!(workout.workout_type, "Лесенка");
        assert_eq!(workout.weight, 24.0);
        assert_eq!(workout.duration, 35.0);
        assert_eq!(workout.goal, "Выносливость");
        assert_eq!(workout.scheme.scheme_type, Some(SchemeType::Ladder));
        assert_eq!(workout.scheme.reps_per_exercise, 30);
        assert_eq!(workout.exercises.len(), 2);
        assert_eq!(workout.exercises[0].name, "Толчок");
        assert_eq!(workout.exercises[0].equipment.as_deref(), Some("1x24кг"));
        assert_eq!(workout.exercises[0].reps, 30);
        assert_eq!(workout.total_reps(), 60);
    }

    #[test]
    fn test_missing_metadata_defaults() {
        let workout = parse_workout("# Тренировка\n\n- Махи 20\n").unwrap();
        assert_eq!(workout.date, "");
        assert_eq!(workout.weight, 0.0);
        assert_eq!(workout.duration, 0.0);
        assert_eq!(workout.goal, DEFAULT_GOAL);
        assert_eq!(workout.exercises.len(), 1);
    }

    #[test]
    fn test_unparsable_duration_is_zero() {
        let workout = parse_workout("---\nduration: примерно час с хвостиком\n---\n").unwrap();
        // "час" alone has no number in front of it
        assert_eq!(workout.duration, 0.0);
    }

    #[test]
    fn test_weight_text_form() {
        let workout = parse_workout("---\nweight: 16 кг\n---\n").unwrap();
        assert_eq!(workout.weight, 16.0);
        let pair = parse_workout("---\nweight: 2x24кг\n---\n").unwrap();
        assert_eq!(pair.weight, 48.0);
        let bare = parse_workout("---\nweight: \"24\"\n---\n").unwrap();
        assert_eq!(bare.weight, 24.0);
    }

    #[test]
    fn test_emom_time_is_per_round() {
        let note = "---\ntype: EMOM\ntime: 1 мин\n---\n## Схема\nКругов: 20\nПаттерн: 5\n\n## Упражнения\n- Махи\n";
        let workout = parse_workout(note).unwrap();
        assert_eq!(workout.duration, 20.0);
        assert_eq!(workout.exercises[0].reps, 100);
    }

    #[test]
    fn test_emom_short_duration_is_per_round() {
        let short = "---\ntype: EMOM\nduration: 1\n---\n## Схема\nКругов: 10\n";
        assert_eq!(parse_workout(short).unwrap().duration, 10.0);
        let total = "---\ntype: EMOM\nduration: 10\n---\n## Схема\nКругов: 10\n";
        assert_eq!(parse_workout(total).unwrap().duration, 10.0);
    }

    #[test]
    fn test_prior_analysis_does_not_change_exercises() {
        let with_analysis = format!(
            "{LADDER_NOTE}\n## AI Analysis\n\n**Общая информация:**\n- Всего повторений: 60\n- Калории: ~80.0 ккал\n- Плечи: 40%\n"
        );
        let clean = parse_workout(LADDER_NOTE).unwrap();
        let stale = parse_workout(&with_analysis).unwrap();
        assert_eq!(clean.exercises, stale.exercises);
        assert!(stale.raw_content.contains("## AI Analysis"));
    }

    #[test]
    fn test_prior_analysis_ignored_without_exercise_section() {
        let base = "---\ntype: Custom\n---\n# Тренировка\n\n- Махи 20\n- Рывок 10\n";
        let with_analysis = format!("{base}\n## AI Analysis\n\n- Всего повторений 30\n- Время: ~5 минут\n- Калории 42\n");
        let clean = parse_workout(base).unwrap();
        let stale = parse_workout(&with_analysis).unwrap();
        assert_eq!(clean.exercises.len(), 2);
        assert_eq!(clean.exercises, stale.exercises);
    }

    #[test]
    fn test_broken_front_matter_is_error() {
        assert!(parse_workout("---\ndate: [unclosed\n---\n").is_err());
    }
}
