//! Exercise list extraction - разбор списка упражнений
//!
//! Each candidate line goes through a fixed pipeline: markup stripping,
//! equipment extraction, then the repetition rules in priority order
//! (`REPS_RULES`), then noise rejection.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::scheme::SchemeRecord;
use super::sections::{heading_map, section_body, section_ranges};
use crate::vocabulary::{self, Vocabulary};

static LIST_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:(?:[-*+•]|[0-9]+[.)])\s+(?:\[[ xX]\]\s+)?)+").expect("valid list marker regex")
});
static WIKI_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\]|]*)(?:\|[^\]]*)?\]\]").expect("valid wiki link regex")
});
static MD_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("valid markdown link regex"));
static BOLD_META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*[^*]+:\s*\*\*|\*\*[^*]+\*\*\s*:").expect("valid bold metadata regex")
});
static PAREN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]*)\)").expect("valid parenthesis regex"));

static SETS_REPS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+)\s*[xXхХ×*]\s*([0-9]+)").expect("valid sets x reps regex")
});
static LEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)\s+(\S.*)$").expect("valid leading count regex"));
static SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)[xXхХ×]\s?([0-9]+)\b").expect("valid suffix count regex")
});
static TRAILING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\s+[-–—:]?|:)\s*([0-9]+)\s*(?:раз[а]?|повтор\w*|reps?)?\.?\s*$")
        .expect("valid trailing count regex")
});
/// `1:30`, `10:00` - a hold or work time, never a rep count
static CLOCK_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)[0-9]{1,3}:[0-5][0-9](?:\s|$)").expect("valid clock time regex")
});
/// Units meaning a number is a load or a time, not a rep count
static UNIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:кг|kg|lbs?|мин|min|сек|sec|s\b|м\b|m\b|км|km)")
        .expect("valid unit regex")
});

/// One exercise line of a workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<String>,
    /// Final total for the whole workout, never re-multiplied downstream
    pub reps: u32,
    /// Reps as written on the line, before round multiplication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps_per_round: Option<u32>,
}

/// Which rule produced a repetition count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepsSource {
    /// `5x5` - already the workout total
    SetsTimesReps,
    /// `4 тяги горилла`
    LeadingCount,
    /// `Махи x10`
    SuffixTimes,
    /// `Махи - 10`, `Махи 10`
    TrailingCount,
    /// No token on the line, reps taken from the scheme pattern
    SchemeFallback,
}

impl RepsSource {
    pub fn is_final(&self) -> bool {
        matches!(self, RepsSource::SetsTimesReps)
    }
}

/// Rule hit: the count and the line text with the token removed
#[derive(Debug, Clone, PartialEq)]
pub struct RepsMatch {
    pub source: RepsSource,
    pub reps: u32,
    pub rest: String,
}

type RepsRule = fn(&str) -> Option<RepsMatch>;

/// Repetition rules in priority order
pub const REPS_RULES: &[RepsRule] = &[sets_times_reps, leading_count, suffix_times, trailing_count];

fn followed_by_unit(text: &str, end: usize) -> bool {
    UNIT_RE.is_match(&text[end..])
}

fn preceded_by_digit(text: &str, start: usize) -> bool {
    text[..start].chars().next_back().is_some_and(|c| c.is_ascii_digit())
}

fn cut(text: &str, start: usize, end: usize) -> String {
    format!("{} {}", &text[..start], &text[end..]).trim().to_string()
}

pub fn sets_times_reps(text: &str) -> Option<RepsMatch> {
    SETS_REPS_RE.captures_iter(text).find_map(|caps| {
        let whole = caps.get(0)?;
        if preceded_by_digit(text, whole.start()) || followed_by_unit(text, whole.end()) {
            return None;
        }
        let sets: u32 = caps[1].parse().ok()?;
        let reps: u32 = caps[2].parse().ok()?;
        Some(RepsMatch {
            source: RepsSource::SetsTimesReps,
            reps: sets.checked_mul(reps)?,
            rest: cut(text, whole.start(), whole.end()),
        })
    })
}

pub fn leading_count(text: &str) -> Option<RepsMatch> {
    let caps = LEADING_RE.captures(text.trim())?;
    let rest = caps.get(2)?.as_str();
    if UNIT_RE.is_match(rest) {
        return None;
    }
    Some(RepsMatch {
        source: RepsSource::LeadingCount,
        reps: caps[1].parse().ok()?,
        rest: rest.trim().to_string(),
    })
}

pub fn suffix_times(text: &str) -> Option<RepsMatch> {
    let caps = SUFFIX_RE.captures(text)?;
    let whole = caps.get(0)?;
    Some(RepsMatch {
        source: RepsSource::SuffixTimes,
        reps: caps[1].parse().ok()?,
        rest: cut(text, whole.start(), whole.end()),
    })
}

pub fn trailing_count(text: &str) -> Option<RepsMatch> {
    let caps = TRAILING_RE.captures(text)?;
    let whole = caps.get(0)?;
    // seconds part of `1:30`
    if preceded_by_digit(text, whole.start()) {
        return None;
    }
    Some(RepsMatch {
        source: RepsSource::TrailingCount,
        reps: caps[1].parse().ok()?,
        rest: text[..whole.start()].trim().to_string(),
    })
}

/// First matching rule in priority order
pub fn match_reps(text: &str) -> Option<RepsMatch> {
    REPS_RULES.iter().find_map(|rule| rule(text))
}

/// Remove list markers, links and table cells from a raw line
fn clean_line(line: &str) -> String {
    let text = LIST_MARKER_RE.replace(line, "");
    let text = WIKI_LINK_RE.replace_all(&text, "$1");
    let text = MD_LINK_RE.replace_all(&text, "$1");
    let text = text.trim().trim_start_matches('|');
    let text = text.split('|').next().unwrap_or_default();
    text.replace("**", "").replace("__", "").trim().to_string()
}

/// Split off the first parenthetical as equipment
fn take_equipment(text: &str) -> (String, Option<String>) {
    match PAREN_RE.captures(text) {
        Some(caps) => {
            let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
            let inner = caps[1].trim().to_string();
            let rest = cut(text, whole.start, whole.end);
            (rest, (!inner.is_empty()).then_some(inner))
        }
        None => (text.to_string(), None),
    }
}

fn tidy_name(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_matches(|c: char| matches!(c, '-' | '–' | '—' | ':' | ',' | ';' | '.') || c.is_whitespace())
        .to_string()
}

/// Drop clock times from the line text
fn strip_clock_times(text: &str) -> String {
    CLOCK_TIME_RE.replace_all(text, " ").trim().to_string()
}

/// Parse one candidate line
///
/// With `require_token` the line must carry its own numeric token (used when
/// scanning a document with no explicit exercise section).
pub fn parse_exercise_line(
    line: &str,
    scheme: &SchemeRecord,
    vocab: &Vocabulary,
    require_token: bool,
) -> Option<ExerciseEntry> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with("<!--") || BOLD_META_RE.is_match(trimmed) {
        return None;
    }

    let text = clean_line(trimmed);
    let (text, equipment) = take_equipment(&text);
    let text = strip_clock_times(&text);

    let matched = match match_reps(&text) {
        Some(m) => Some(m),
        None if require_token => return None,
        None if scheme.reps_per_exercise > 0 => Some(RepsMatch {
            source: RepsSource::SchemeFallback,
            reps: scheme.reps_per_exercise,
            rest: text.clone(),
        }),
        None => None,
    };

    let name = tidy_name(matched.as_ref().map_or(text.as_str(), |m| m.rest.as_str()));
    if name.chars().count() <= 2 || vocab.is_noise(&name) {
        debug!(line = trimmed, "skipping non-exercise line");
        return None;
    }

    let (reps, reps_per_round) = match matched {
        Some(m) if m.source.is_final() => (m.reps, None),
        Some(m) => {
            let total = if scheme.repeats_every_round() {
                m.reps.saturating_mul(scheme.rounds)
            } else {
                m.reps
            };
            (total, Some(m.reps))
        }
        None => (0, None),
    };

    Some(ExerciseEntry {
        name,
        equipment,
        reps,
        reps_per_round,
    })
}

/// Extract exercises with the built-in vocabulary
pub fn extract_exercises(body: &str, scheme: &SchemeRecord) -> Vec<ExerciseEntry> {
    extract_exercises_with(body, scheme, vocabulary::standard())
}

/// Extract exercises in document order
///
/// `body` must already have generated analysis sections removed.
pub fn extract_exercises_with(body: &str, scheme: &SchemeRecord, vocab: &Vocabulary) -> Vec<ExerciseEntry> {
    if let Some(lines) = section_body(body, |heading| vocab.is_exercise_heading(heading)) {
        let headings = heading_map(&lines);
        return lines
            .iter()
            .zip(headings)
            .filter(|(_, heading)| heading.is_none())
            .filter_map(|(line, _)| parse_exercise_line(line, scheme, vocab, false))
            .collect();
    }

    // No explicit section: scan everything except scheme, notes and the title
    let lines: Vec<&str> = body.lines().collect();
    let headings = heading_map(&lines);
    let excluded = section_ranges(&lines, |heading| {
        vocab.is_scheme_heading(heading) || vocab.is_notes_heading(heading)
    });

    lines
        .iter()
        .enumerate()
        .filter(|(i, _)| headings[*i].is_none())
        .filter(|(i, _)| !excluded.iter().any(|r| r.contains(i)))
        .filter_map(|(_, line)| parse_exercise_line(line, scheme, vocab, true))
        .collect()
}
