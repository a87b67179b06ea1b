//! Workout analysis pipeline: parse, enrich, calculate

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::calc::{
    CalcConstants, CalorieResult, MuscleBalanceResult, calculate_muscle_balance,
    calculate_workout_calories,
};
use crate::enrich::{self, EnrichmentRecord, EnrichmentSource, LibraryExercise, Resolver};
use crate::parser::{WorkoutRecord, parse_workout_with};
use crate::vocabulary::Vocabulary;
use crate::writer;

/// Everything computed for one workout note
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub workout: WorkoutRecord,
    pub enrichment: Vec<EnrichmentRecord>,
    pub calories: CalorieResult,
    pub balance: MuscleBalanceResult,
}

impl Analysis {
    /// Analysis section text, narrative left to the placeholder
    pub fn section(&self, vocab: &Vocabulary, at: DateTime<Utc>) -> String {
        writer::format_analysis_section(&self.calories, &self.balance, None, at, vocab)
    }
}

/// Run the whole pipeline over note text
pub fn analyze_text(
    text: &str,
    resolver: &Resolver,
    user_weight: f64,
    constants: &CalcConstants,
    vocab: &Vocabulary,
) -> Result<Analysis> {
    let workout = parse_workout_with(text, vocab)?;
    debug!(exercises = workout.exercises.len(), "workout parsed");

    let enrichment = resolver.resolve_all(&workout.exercises);
    let calories = calculate_workout_calories(&workout, &enrichment, user_weight, constants);
    let balance = calculate_muscle_balance(
        &enrichment,
        Some(&workout.exercises),
        Some(&workout.scheme),
        constants,
    );

    Ok(Analysis {
        workout,
        enrichment,
        calories,
        balance,
    })
}

/// Read and analyse the note at `path`
pub fn analyze_file(
    path: &Path,
    resolver: &Resolver,
    user_weight: f64,
    constants: &CalcConstants,
    vocab: &Vocabulary,
) -> Result<Analysis> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read workout {}", path.display()))?;
    analyze_text(&text, resolver, user_weight, constants, vocab)
        .with_context(|| format!("cannot analyse {}", path.display()))
}

/// Analyse `path` and write the section back into it
pub fn analyze_and_write(
    path: &Path,
    resolver: &Resolver,
    user_weight: f64,
    constants: &CalcConstants,
    vocab: &Vocabulary,
) -> Result<Analysis> {
    let analysis = analyze_file(path, resolver, user_weight, constants, vocab)?;
    writer::write_analysis(path, &analysis.section(vocab, Utc::now()), vocab)?;
    info!(
        path = %path.display(),
        calories = analysis.calories.total_calories,
        "workout analysed"
    );
    Ok(analysis)
}

/// Outcome of enriching one exercise note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteUpdate {
    Updated(EnrichmentSource),
    /// MET, calories per rep and muscle groups are all present
    AlreadyEnriched,
    /// Only the fallback knows the exercise, the note is left as is
    NoData,
}

/// Fill in a library note that is missing enrichment fields
pub fn update_exercise_note(exercise: &LibraryExercise, resolver: &Resolver) -> Result<NoteUpdate> {
    if !exercise.needs_enrichment() {
        return Ok(NoteUpdate::AlreadyEnriched);
    }
    let record = resolver.resolve(&exercise.name, &exercise.equipment);
    if record.source == EnrichmentSource::Fallback {
        debug!(exercise = exercise.name.as_str(), "no enrichment data, note not updated");
        return Ok(NoteUpdate::NoData);
    }
    enrich::update_note(&exercise.path, &record, Utc::now())?;
    Ok(NoteUpdate::Updated(record.source))
}

/// Workout notes in `dir`, sorted by file name (dates sort chronologically)
pub fn list_workouts(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("cannot read {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "md"))
        .collect();
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

/// Existing path, or the first note in `dir` whose file name contains `query`
pub fn find_workout(dir: &Path, query: &str) -> Result<Option<PathBuf>> {
    let direct = Path::new(query);
    if direct.is_file() {
        return Ok(Some(direct.to_path_buf()));
    }
    Ok(list_workouts(dir)?.into_iter().find(|p| {
        p.file_name()
            .is_some_and(|name| name.to_string_lossy().contains(query))
    }))
}

/// Newest workout note by file name
pub fn latest_workout(dir: &Path) -> Result<Option<PathBuf>> {
    Ok(list_workouts(dir)?.pop())
}

/// Notes whose analysis section is missing or empty
pub fn pending_workouts(dir: &Path, vocab: &Vocabulary) -> Result<Vec<PathBuf>> {
    let mut pending = Vec::new();
    for path in list_workouts(dir)? {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("cannot read workout {}", path.display()))?;
        match crate::parser::Document::parse(&text) {
            Ok(doc) if writer::needs_analysis(&doc.body, vocab) => pending.push(path),
            Ok(_) => {}
            Err(e) => debug!(path = %path.display(), error = %e, "skipping unparsable note"),
        }
    }
    Ok(pending)
}
