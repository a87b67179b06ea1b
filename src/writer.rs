//! Analysis section writer
//!
//! Every existing analysis section is removed and one fresh section is
//! appended at the end of the body. The front matter is written back
//! byte for byte.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::info;

use crate::calc::{CalorieResult, MuscleBalanceResult};
use crate::parser::{Document, WorkoutRecord, sections};
use crate::vocabulary::Vocabulary;

/// Shown in place of the generated narrative when there is none
pub const NARRATIVE_PLACEHOLDER: &str = "*Текстовый анализ не сгенерирован*";

static HTML_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid html comment regex"));

/// Text with level 1-2 headings pushed down to level 3
///
/// Keeps generated text inside the level-2 analysis section, so the next
/// rewrite removes all of it.
fn demote_headings(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut out = lines
        .iter()
        .zip(sections::heading_map(&lines))
        .map(|(line, heading)| match heading {
            Some((level, title)) if level < 3 => format!("### {title}"),
            _ => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n");
    if text.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Render the analysis section, heading included
pub fn format_analysis_section(
    calories: &CalorieResult,
    balance: &MuscleBalanceResult,
    narrative: Option<&str>,
    at: DateTime<Utc>,
    vocab: &Vocabulary,
) -> String {
    let mut lines = vec![
        format!("## {}", vocab.analysis_heading()),
        String::new(),
        "**Общая информация:**".to_string(),
        format!("- Всего повторений: {}", calories.total_reps),
        format!(
            "- Калории: ~{:.1} ккал ({})",
            calories.total_calories,
            calories.calculation_method.label()
        ),
        format!("- Время: ~{} минут", calories.estimated_time_minutes),
        format!("- Средняя интенсивность: {:.1} MET", calories.average_met),
        format!("- Вес пользователя: {} кг", calories.user_weight),
        String::new(),
        "**Баланс мышечных групп:**".to_string(),
    ];

    let ranked = balance.ranked();
    if ranked.is_empty() {
        lines.push("- Нет данных о мышечных группах".to_string());
    }
    for (group, volume) in ranked {
        lines.push(format!("- {}: {}%", group.name_ru(), volume.percentage));
    }

    lines.push(String::new());
    lines.push("**Рекомендации:**".to_string());
    lines.push(match narrative.map(str::trim).filter(|n| !n.is_empty()) {
        Some(text) => demote_headings(text),
        None => NARRATIVE_PLACEHOLDER.to_string(),
    });
    lines.push(String::new());
    lines.push("---".to_string());
    lines.push(format!("*Анализ от {}*", at.format("%Y-%m-%d %H:%M UTC")));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Body with old analysis sections dropped and `section` appended
///
/// Only the first line of `section` may be a level 1-2 heading.
pub fn splice_analysis(body: &str, section: &str, vocab: &Vocabulary) -> String {
    let (heading, content) = section.split_once('\n').unwrap_or((section, ""));
    let section = format!("{heading}\n{}", demote_headings(content));

    let cleaned = sections::remove_sections(body, |heading| vocab.is_analysis_heading(heading));
    let cleaned = cleaned.trim_end();
    if cleaned.is_empty() {
        return section;
    }
    format!("{cleaned}\n\n{section}")
}

/// Rewrite the analysis section of the note at `path`
pub fn write_analysis(path: &Path, section: &str, vocab: &Vocabulary) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read workout {}", path.display()))?;
    let doc = Document::parse(&text).with_context(|| format!("cannot parse {}", path.display()))?;

    let body = splice_analysis(&doc.body, section, vocab);
    fs::write(path, doc.with_body(&body))
        .with_context(|| format!("cannot write workout {}", path.display()))?;

    info!(path = %path.display(), "analysis section written");
    Ok(())
}

/// Missing section, or one holding only HTML comments and whitespace
pub fn needs_analysis(body: &str, vocab: &Vocabulary) -> bool {
    let Some(lines) = sections::section_body(body, |heading| vocab.is_analysis_heading(heading)) else {
        return true;
    };
    let content = lines.join("\n");
    HTML_COMMENT_RE.replace_all(&content, "").trim().is_empty()
}

/// One-line summary: date, type, scheme, exercise count, total reps
pub fn workout_summary(workout: &WorkoutRecord) -> String {
    let mut parts = Vec::new();
    if !workout.date.is_empty() {
        parts.push(format!("Дата: {}", workout.date));
    }
    if !workout.workout_type.is_empty() {
        parts.push(format!("Тип: {}", workout.workout_type));
    }
    let scheme = workout.scheme.type_label();
    if !scheme.is_empty() {
        parts.push(format!("Схема: {scheme}"));
    }
    if !workout.exercises.is_empty() {
        parts.push(format!("Упражнений: {}", workout.exercises.len()));
    }
    let total = workout.total_reps();
    if total > 0 {
        parts.push(format!("Всего повторений: {total}"));
    }
    parts.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::{
        CalcConstants, MuscleVolume, calculate_muscle_balance, calculate_workout_calories,
    };
    use crate::enrich::{EnrichmentRecord, EnrichmentSource};
    use crate::parser::parse_workout;
    use crate::vocabulary::{self, MuscleGroup, MuscleMap};
    use chrono::TimeZone;

    const NOTE: &str = "---
date: 2026-02-11
type: EMOM
duration: 20
---

# Тренировка 2026-02-11

## Схема
Тип: EMOM
Кругов: 10
Паттерн: 5

## Упражнения
- Махи (24кг)
- Рывок
";

    fn create_enrichment(groups: &[MuscleGroup]) -> EnrichmentRecord {
        EnrichmentRecord {
            name: "x".to_string(),
            equipment: String::new(),
            met_base: 9.0,
            cal_per_rep: 0.4,
            muscle_groups: groups.to_vec(),
            source: EnrichmentSource::Local,
            fetched_at: None,
        }
    }

    fn create_section(narrative: Option<&str>) -> String {
        let workout = parse_workout(NOTE).unwrap();
        let enrichment = vec![
            create_enrichment(&[MuscleGroup::Legs, MuscleGroup::Back]),
            create_enrichment(&[MuscleGroup::Shoulders]),
        ];
        let constants = CalcConstants::default();
        let calories = calculate_workout_calories(&workout, &enrichment, 80.0, &constants);
        let balance = calculate_muscle_balance(
            &enrichment,
            Some(&workout.exercises),
            Some(&workout.scheme),
            &constants,
        );
        let at = Utc.with_ymd_and_hms(2026, 2, 11, 18, 30, 0).unwrap();
        format_analysis_section(&calories, &balance, narrative, at, vocabulary::standard())
    }

    #[test]
    fn test_format_section_contents() {
        let section = create_section(Some("Хорошая работа."));
        assert!(section.starts_with("## AI Analysis\n"));
        assert!(section.contains("- Всего повторений: 100"));
        assert!(section.contains("- Вес пользователя: 80 кг"));
        assert!(section.contains("Хорошая работа."));
        assert!(section.contains("*Анализ от 2026-02-11 18:30 UTC*"));
        // рывок без снаряда считается с весом 30 кг, у плеч объём больше
        let shoulders = section.find("- Плечи: 38.5%").unwrap();
        let legs = section.find("- Ноги: 30.8%").unwrap();
        assert!(shoulders < legs);
        assert!(!section.contains("- Грудь:"));
    }

    #[test]
    fn test_format_section_placeholder() {
        let section = create_section(None);
        assert!(section.contains(NARRATIVE_PLACEHOLDER));
        let blank = create_section(Some("   "));
        assert!(blank.contains(NARRATIVE_PLACEHOLDER));
    }

    #[test]
    fn test_format_section_without_groups() {
        let balance = MuscleBalanceResult {
            balance: MuscleMap::<MuscleVolume>::default(),
            primary_muscle: None,
            total_volume: 0.0,
        };
        let calories = CalorieResult::no_data(70.0);
        let section =
            format_analysis_section(&calories, &balance, None, Utc::now(), vocabulary::standard());
        assert!(section.contains("- Нет данных о мышечных группах"));
    }

    #[test]
    fn test_splice_replaces_every_old_section() {
        let vocab = vocabulary::standard();
        let body = "# T\n\n## AI Analysis\nстарое 1\n\n## Заметки\nок\n\n## AI Analysis\nстарое 2\n";
        let spliced = splice_analysis(body, "## AI Analysis\n\nновое\n", vocab);
        assert!(!spliced.contains("старое"));
        assert_eq!(spliced.matches("## AI Analysis").count(), 1);
        assert!(spliced.ends_with("## AI Analysis\n\nновое\n"));
        assert!(spliced.contains("## Заметки\nок"));
    }

    #[test]
    fn test_write_analysis_keeps_front_matter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2026-02-11.md");
        fs::write(&path, NOTE).unwrap();
        let vocab = vocabulary::standard();

        write_analysis(&path, &create_section(None), vocab).unwrap();
        write_analysis(&path, &create_section(Some("второй прогон")), vocab).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("---\ndate: 2026-02-11\ntype: EMOM\nduration: 20\n---\n"));
        assert_eq!(written.matches("## AI Analysis").count(), 1);
        assert!(written.contains("второй прогон"));

        // повторный разбор не видит сгенерированный текст
        let reparsed = parse_workout(&written).unwrap();
        assert_eq!(reparsed.exercises, parse_workout(NOTE).unwrap().exercises);
        assert!(!needs_analysis(&reparsed.raw_content, vocab));
    }

    #[test]
    fn test_narrative_headings_stay_inside_section() {
        let section = create_section(Some("Итого\n\n## План\n- Рывок 50\n# Цель"));
        assert!(section.contains("### План\n- Рывок 50\n### Цель"));
        assert!(!section.contains("\n## План"));
    }

    #[test]
    fn test_repeated_splice_with_headings_in_section() {
        let vocab = vocabulary::standard();
        let base = "# Тренировка\n\n- Махи 20\n";
        let section = "## AI Analysis\n\nИтого\n\n## План\n- Рывок 50\n";

        let once = splice_analysis(base, section, vocab);
        let twice = splice_analysis(&once, section, vocab);
        assert_eq!(once, twice);
        assert_eq!(twice.matches("План").count(), 1);

        let exercises = parse_workout(&twice).unwrap().exercises;
        assert_eq!(exercises.len(), 1);
        assert_eq!(exercises[0].name, "Махи");
        assert_eq!(exercises[0].reps, 20);
    }

    #[test]
    fn test_needs_analysis() {
        let vocab = vocabulary::standard();
        assert!(needs_analysis("# T\n\n## Упражнения\n- Махи\n", vocab));
        assert!(needs_analysis("## AI Analysis\n\n<!-- заполнится -->\n\n", vocab));
        assert!(needs_analysis("## AI Analysis\n<!--\nмного\nстрок\n-->\n## Заметки\nтекст\n", vocab));
        assert!(!needs_analysis("## AI Analysis\n\nКалории: 120\n", vocab));
    }

    #[test]
    fn test_workout_summary() {
        let workout = parse_workout(NOTE).unwrap();
        assert_eq!(
            workout_summary(&workout),
            "Дата: 2026-02-11 | Тип: EMOM | Схема: EMOM | Упражнений: 2 | Всего повторений: 100"
        );
    }
}
