//! Scheme extraction - разбор блока "Схема"

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::sections::section_body;
use crate::vocabulary::{self, SchemeKey, SchemeType, Vocabulary};

static DIGIT_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid digit run regex"));

/// At least three digit groups joined by `-` or `,` (a rep ladder)
static INLINE_PATTERN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]+(?:\s*[-,]+\s*[0-9]+){2,}").expect("valid inline pattern regex")
});

/// `EMOM 20: 5 повторений` - rounds and reps per round
static EMOM_SHORTHAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bemom[:\s]*([0-9]+)[:\s-]+([0-9]+)\s*(?:повтор|раз|reps?)")
        .expect("valid emom shorthand regex")
});

/// `Табата 8x20/10` - rounds, work seconds, rest seconds
static TABATA_SHORTHAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:табата|tabata)[:\s]*([0-9]+)\s*[xXхХ×]\s*([0-9]+)\s*/\s*([0-9]+)")
        .expect("valid tabata shorthand regex")
});

static LIST_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*+•]\s+|[0-9]+[.)]\s+)").expect("valid list marker regex")
});

/// Normalised workout scheme
///
/// `reps_per_exercise` always equals the sum of `pattern`; use
/// [`SchemeRecord::set_pattern`] to change either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeRecord {
    pub scheme_type: Option<SchemeType>,
    pub pattern: Vec<u32>,
    pub reps_per_exercise: u32,
    /// Always >= 1
    pub rounds: u32,
    pub equipment: Option<String>,
    pub time_per_rep_secs: Option<u32>,
    pub rest_secs: Option<u32>,
}

impl Default for SchemeRecord {
    fn default() -> Self {
        Self {
            scheme_type: None,
            pattern: Vec::new(),
            reps_per_exercise: 0,
            rounds: 1,
            equipment: None,
            time_per_rep_secs: None,
            rest_secs: None,
        }
    }
}

impl SchemeRecord {
    pub fn set_pattern(&mut self, pattern: Vec<u32>) {
        self.reps_per_exercise = pattern.iter().fold(0u32, |acc, r| acc.saturating_add(*r));
        self.pattern = pattern;
    }

    /// Whether per-round reps get multiplied by `rounds`
    pub fn repeats_every_round(&self) -> bool {
        self.scheme_type.is_some_and(|t| t.repeats_every_round())
    }

    pub fn type_label(&self) -> &'static str {
        self.scheme_type.map(|t| t.label()).unwrap_or("")
    }

    /// Pattern rendered back as `1-2-3`
    pub fn pattern_string(&self) -> String {
        self.pattern
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join("-")
    }
}

/// Scheme facts carried by a one-line protocol shorthand
#[derive(Debug, Clone, PartialEq)]
pub struct Shorthand {
    pub scheme_type: SchemeType,
    pub rounds: u32,
    pub reps_per_round: Option<u32>,
    pub work_secs: Option<u32>,
    pub rest_secs: Option<u32>,
}

type ShorthandRule = fn(&str) -> Option<Shorthand>;

/// Shorthand rules, first match wins
pub const SHORTHAND_RULES: &[ShorthandRule] = &[emom_shorthand, tabata_shorthand];

pub fn emom_shorthand(line: &str) -> Option<Shorthand> {
    let caps = EMOM_SHORTHAND_RE.captures(line)?;
    Some(Shorthand {
        scheme_type: SchemeType::Emom,
        rounds: caps[1].parse().ok()?,
        reps_per_round: caps[2].parse().ok(),
        work_secs: None,
        rest_secs: None,
    })
}

pub fn tabata_shorthand(line: &str) -> Option<Shorthand> {
    let caps = TABATA_SHORTHAND_RE.captures(line)?;
    Some(Shorthand {
        scheme_type: SchemeType::Tabata,
        rounds: caps[1].parse().ok()?,
        reps_per_round: None,
        work_secs: caps[2].parse().ok(),
        rest_secs: caps[3].parse().ok(),
    })
}

pub fn match_shorthand(line: &str) -> Option<Shorthand> {
    SHORTHAND_RULES.iter().find_map(|rule| rule(line))
}

/// Every digit run in `text`, separators ignored
pub fn digit_runs(text: &str) -> Vec<u32> {
    DIGIT_RUN_RE
        .find_iter(text)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

pub fn first_number(text: &str) -> Option<u32> {
    DIGIT_RUN_RE.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Map a free-text type label to a scheme type, unknown labels are Custom
fn classify_type(label: &str, vocab: &Vocabulary) -> Option<SchemeType> {
    if label.trim().is_empty() {
        return None;
    }
    Some(vocab.scheme_type(label).unwrap_or(SchemeType::Custom))
}

/// Remove list markers and bold/italic markup from a scheme line
fn strip_markup(line: &str) -> String {
    let line = LIST_MARKER_RE.replace(line, "");
    line.replace("**", "").replace("__", "").trim().to_string()
}

/// Parse the scheme section of `body` with the built-in vocabulary
pub fn extract_scheme(body: &str, workout_type: &str) -> SchemeRecord {
    extract_scheme_with(body, workout_type, vocabulary::standard())
}

/// Parse the scheme section of `body`
///
/// Without a scheme section the result is all defaults. Inside it, a
/// missing type falls back to a shorthand line, then to `workout_type`.
/// Explicit keys always beat a shorthand.
pub fn extract_scheme_with(body: &str, workout_type: &str, vocab: &Vocabulary) -> SchemeRecord {
    let mut scheme = SchemeRecord::default();

    let Some(lines) = section_body(body, |heading| vocab.is_scheme_heading(heading)) else {
        return scheme;
    };

    let mut declared_type: Option<String> = None;
    let mut rounds: Option<u32> = None;
    let mut pattern: Option<Vec<u32>> = None;
    let mut inline_pattern: Option<Vec<u32>> = None;
    let mut shorthand: Option<Shorthand> = None;

    for raw in lines {
        let line = strip_markup(raw);
        if line.is_empty() {
            continue;
        }
        if shorthand.is_none() {
            shorthand = match_shorthand(&line);
        }

        let key = line
            .split_once(':')
            .and_then(|(key, value)| vocab.scheme_key(key).map(|k| (k, value.trim())));

        match key {
            Some((SchemeKey::Type, value)) => {
                if !value.is_empty() {
                    declared_type = Some(value.to_string());
                }
            }
            Some((SchemeKey::Rounds, value)) => {
                rounds = Some(first_number(value).filter(|r| *r > 0).unwrap_or(1));
            }
            Some((SchemeKey::Equipment, value)) => {
                if !value.is_empty() {
                    scheme.equipment = Some(value.to_string());
                }
            }
            Some((SchemeKey::Pattern, value)) => {
                pattern = Some(digit_runs(value));
            }
            Some((SchemeKey::TimePerRep, value)) => {
                scheme.time_per_rep_secs = first_number(value).filter(|s| *s > 0);
            }
            Some((SchemeKey::Rest, value)) => {
                scheme.rest_secs = first_number(value);
            }
            None => {
                if inline_pattern.is_none() {
                    if let Some(m) = INLINE_PATTERN_RE.find(&line) {
                        inline_pattern = Some(digit_runs(m.as_str()));
                    }
                }
            }
        }
    }

    let shorthand_pattern = shorthand
        .as_ref()
        .and_then(|s| s.reps_per_round)
        .map(|reps| vec![reps]);
    if let Some(pattern) = pattern.or(shorthand_pattern).or(inline_pattern) {
        scheme.set_pattern(pattern);
    }

    let shorthand_rounds = shorthand.as_ref().map(|s| s.rounds).filter(|r| *r > 0);
    scheme.rounds = rounds.or(shorthand_rounds).unwrap_or(1);

    if let Some(short) = &shorthand {
        scheme.time_per_rep_secs = scheme.time_per_rep_secs.or(short.work_secs);
        scheme.rest_secs = scheme.rest_secs.or(short.rest_secs);
    }

    scheme.scheme_type = match (declared_type, &shorthand) {
        (Some(label), _) => classify_type(&label, vocab),
        (None, Some(short)) => Some(short.scheme_type),
        (None, None) => classify_type(workout_type, vocab),
    };

    scheme
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheme_body(lines: &str) -> String {
        format!("# Тренировка\n\n## Схема\n{lines}\n\n## Упражнения\n- Махи\n")
    }

    #[test]
    fn test_no_scheme_section_is_default() {
        let scheme = extract_scheme("# Тренировка\n\n- Махи 10\n", "EMOM");
        assert_eq!(scheme, SchemeRecord::default());
        assert_eq!(scheme.rounds, 1);
    }

    #[test]
    fn test_pattern_sum_hyphens() {
        let scheme = extract_scheme(&scheme_body("Паттерн: 1-2-3-3-2-1"), "");
        assert_eq!(scheme.pattern, vec![1, 2, 3, 3, 2, 1]);
        assert_eq!(scheme.reps_per_exercise, 12);
    }

    #[test]
    fn test_pattern_sum_ignores_separator() {
        let hyphen = extract_scheme(&scheme_body("Pattern: 10-9-8-7-6-5-4-3-2-1"), "");
        let comma = extract_scheme(&scheme_body("Pattern: 10, 9, 8, 7, 6, 5, 4, 3, 2, 1"), "");
        assert_eq!(hyphen.reps_per_exercise, 55);
        assert_eq!(comma.reps_per_exercise, 55);
        assert_eq!(hyphen.pattern, comma.pattern);
    }

    #[test]
    fn test_bold_keys_and_bullets() {
        let scheme = extract_scheme(
            &scheme_body("- **Тип:** Лесенка\n- **Кругов:** 8\n- **Снаряд:** 2x24кг\n- **Паттерн:** 1-2-3-4-5"),
            "",
        );
        assert_eq!(scheme.scheme_type, Some(SchemeType::Ladder));
        assert_eq!(scheme.rounds, 8);
        assert_eq!(scheme.equipment.as_deref(), Some("2x24кг"));
        assert_eq!(scheme.reps_per_exercise, 15);
    }

    #[test]
    fn test_rounds_parse_failure_defaults_to_one() {
        let scheme = extract_scheme(&scheme_body("Rounds: много"), "");
        assert_eq!(scheme.rounds, 1);
        let zero = extract_scheme(&scheme_body("Rounds: 0"), "");
        assert_eq!(zero.rounds, 1);
    }

    #[test]
    fn test_rounds_first_digit_run() {
        let scheme = extract_scheme(&scheme_body("Rounds: 20 (по минуте)"), "");
        assert_eq!(scheme.rounds, 20);
    }

    #[test]
    fn test_type_falls_back_to_workout_type() {
        let scheme = extract_scheme(&scheme_body("Кругов: 10"), "EMOM");
        assert_eq!(scheme.scheme_type, Some(SchemeType::Emom));
    }

    #[test]
    fn test_local_type_wins_over_workout_type() {
        let scheme = extract_scheme(&scheme_body("Type: Tabata"), "EMOM");
        assert_eq!(scheme.scheme_type, Some(SchemeType::Tabata));
    }

    #[test]
    fn test_unknown_type_is_custom() {
        let scheme = extract_scheme(&scheme_body("Тип: пирамида"), "");
        assert_eq!(scheme.scheme_type, Some(SchemeType::Custom));
    }

    #[test]
    fn test_lines_without_colon_ignored() {
        let scheme = extract_scheme(&scheme_body("просто текст\nКругов 5"), "");
        assert_eq!(scheme.rounds, 1);
        assert_eq!(scheme.reps_per_exercise, 0);
    }

    #[test]
    fn test_inline_pattern_without_key() {
        let scheme = extract_scheme(&scheme_body("Тип: Лесенка\n1-2-3-4-5-5-4-3-2-1"), "");
        assert_eq!(scheme.reps_per_exercise, 30);
        assert_eq!(scheme.pattern_string(), "1-2-3-4-5-5-4-3-2-1");
    }

    #[test]
    fn test_explicit_pattern_beats_inline() {
        let scheme = extract_scheme(&scheme_body("1-1-1-1\nПаттерн: 5"), "");
        assert_eq!(scheme.pattern, vec![5]);
        assert_eq!(scheme.reps_per_exercise, 5);
    }

    #[test]
    fn test_timing_keys() {
        let scheme = extract_scheme(&scheme_body("Time per rep: 4 сек\nОтдых: 90 сек"), "");
        assert_eq!(scheme.time_per_rep_secs, Some(4));
        assert_eq!(scheme.rest_secs, Some(90));
    }

    #[test]
    fn test_set_pattern_keeps_sum_invariant() {
        let mut scheme = SchemeRecord::default();
        scheme.set_pattern(vec![3, 4, 5]);
        assert_eq!(scheme.reps_per_exercise, 12);
        scheme.set_pattern(Vec::new());
        assert_eq!(scheme.reps_per_exercise, 0);
    }

    #[test]
    fn test_emom_shorthand() {
        let scheme = extract_scheme(&scheme_body("EMOM 20: 5 повторений"), "");
        assert_eq!(scheme.scheme_type, Some(SchemeType::Emom));
        assert_eq!(scheme.rounds, 20);
        assert_eq!(scheme.pattern, vec![5]);
        assert_eq!(scheme.reps_per_exercise, 5);
    }

    #[test]
    fn test_tabata_shorthand() {
        let scheme = extract_scheme(&scheme_body("Тип: Табата 8x20/10"), "");
        assert_eq!(scheme.scheme_type, Some(SchemeType::Tabata));
        assert_eq!(scheme.rounds, 8);
        assert_eq!(scheme.time_per_rep_secs, Some(20));
        assert_eq!(scheme.rest_secs, Some(10));
        assert_eq!(scheme.reps_per_exercise, 0);
    }

    #[test]
    fn test_explicit_keys_beat_shorthand() {
        let scheme = extract_scheme(
            &scheme_body("- Табата 8х20/10\n- Кругов: 4\n- Отдых: 15 сек"),
            "EMOM",
        );
        assert_eq!(scheme.scheme_type, Some(SchemeType::Tabata));
        assert_eq!(scheme.rounds, 4);
        assert_eq!(scheme.time_per_rep_secs, Some(20));
        assert_eq!(scheme.rest_secs, Some(15));
    }

    #[test]
    fn test_shorthand_rules() {
        assert!(match_shorthand("emom: 10 - 8 reps").is_some());
        assert!(match_shorthand("EMOM каждую минуту").is_none());
        assert!(match_shorthand("Tabata 8x20").is_none());
    }
}
