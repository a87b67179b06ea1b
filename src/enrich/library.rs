//! Local exercise library - one Markdown note per exercise

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_yaml::{Mapping, Value};
use tracing::{debug, info, warn};

use super::{EnrichmentRecord, EnrichmentSource, equipment_matches, normalize_name};
use crate::parser::Document;
use crate::vocabulary::MuscleGroup;

/// Written into `updated_by` of every note this tool fills in
const UPDATED_BY: &str = "girevik";

/// Exercise note front matter
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryExercise {
    pub name: String,
    pub equipment: String,
    pub met_base: Option<f64>,
    pub cal_per_rep: Option<f64>,
    pub muscle_groups: Vec<MuscleGroup>,
    pub path: PathBuf,
    pub modified: Option<DateTime<Utc>>,
}

fn as_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

/// Muscle groups from a YAML list or a comma-separated string; unknown names dropped
fn as_muscle_groups(value: Option<&Value>) -> Vec<MuscleGroup> {
    let names: Vec<String> = match value {
        Some(Value::Sequence(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };

    let mut groups = Vec::new();
    for name in &names {
        match MuscleGroup::parse(name) {
            Some(group) if !groups.contains(&group) => groups.push(group),
            Some(_) => {}
            None => debug!(muscle = name.as_str(), "unknown muscle group"),
        }
    }
    groups
}

impl LibraryExercise {
    /// Build from note text; the name defaults to the file stem
    pub fn from_note(text: &str, path: &Path) -> Result<Self> {
        let doc = Document::parse(text)?;
        let name = match doc.get_text("name") {
            n if n.is_empty() => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            n => n,
        };

        Ok(Self {
            name,
            equipment: doc.get_text("equipment"),
            met_base: as_number(doc.get("met_base")).filter(|m| *m > 0.0),
            cal_per_rep: as_number(doc.get("cal_per_rep")).filter(|c| *c >= 0.0),
            muscle_groups: as_muscle_groups(doc.get("muscle_groups")),
            path: path.to_path_buf(),
            modified: None,
        })
    }

    /// True when any of the three metrics is missing
    pub fn needs_enrichment(&self) -> bool {
        self.met_base.is_none() || self.cal_per_rep.is_none() || self.muscle_groups.is_empty()
    }

    /// Enrichment record, only for fully enriched notes
    pub fn to_record(&self) -> Option<EnrichmentRecord> {
        if self.needs_enrichment() {
            return None;
        }
        Some(EnrichmentRecord {
            name: self.name.clone(),
            equipment: self.equipment.clone(),
            met_base: self.met_base?,
            cal_per_rep: self.cal_per_rep?,
            muscle_groups: self.muscle_groups.clone(),
            source: EnrichmentSource::Local,
            fetched_at: self.modified,
        })
    }
}

/// All exercise notes of the vault
#[derive(Debug, Clone, Default)]
pub struct ExerciseLibrary {
    exercises: Vec<LibraryExercise>,
}

impl ExerciseLibrary {
    pub fn new(exercises: Vec<LibraryExercise>) -> Self {
        Self { exercises }
    }

    /// Load every `.md` note in `dir`; a missing folder is an empty library
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            info!(path = %dir.display(), "exercise folder not found, library is empty");
            return Ok(Self::default());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("cannot read {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
            .collect();
        paths.sort();

        let mut exercises = Vec::with_capacity(paths.len());
        for path in paths {
            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cannot read exercise note");
                    continue;
                }
            };
            match LibraryExercise::from_note(&text, &path) {
                Ok(mut exercise) => {
                    exercise.modified = fs::metadata(&path)
                        .and_then(|m| m.modified())
                        .ok()
                        .map(DateTime::<Utc>::from);
                    exercises.push(exercise);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping exercise note"),
            }
        }

        debug!(count = exercises.len(), "exercise library loaded");
        Ok(Self { exercises })
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    pub fn exercises(&self) -> &[LibraryExercise] {
        &self.exercises
    }

    /// Note with the same normalised name and compatible equipment
    pub fn find(&self, name: &str, equipment: &str) -> Option<&LibraryExercise> {
        let key = normalize_name(name);
        self.exercises
            .iter()
            .find(|ex| normalize_name(&ex.name) == key && equipment_matches(equipment, &ex.equipment))
    }

    /// Notes still missing MET, calories per rep or muscle groups
    pub fn pending(&self) -> Vec<&LibraryExercise> {
        self.exercises.iter().filter(|ex| ex.needs_enrichment()).collect()
    }
}

fn set(metadata: &mut Mapping, key: &str, value: Value) {
    metadata.insert(Value::from(key), value);
}

/// Write MET, calories per rep and muscle groups into the note at `path`
///
/// Only the front matter is rewritten; other keys stay, the body is kept
/// byte for byte.
pub fn update_note(path: &Path, record: &EnrichmentRecord, at: DateTime<Utc>) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read exercise note {}", path.display()))?;
    let mut doc = Document::parse(&text).with_context(|| format!("cannot parse {}", path.display()))?;

    let groups = record
        .muscle_groups
        .iter()
        .map(|g| Value::from(g.as_str()))
        .collect();
    set(&mut doc.metadata, "met_base", Value::from(record.met_base));
    set(&mut doc.metadata, "cal_per_rep", Value::from(record.cal_per_rep));
    set(&mut doc.metadata, "muscle_groups", Value::Sequence(groups));
    set(
        &mut doc.metadata,
        "last_updated",
        Value::from(at.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
    set(&mut doc.metadata, "updated_by", Value::from(UPDATED_BY));

    fs::write(path, doc.serialize()?)
        .with_context(|| format!("cannot write exercise note {}", path.display()))?;
    info!(path = %path.display(), source = record.source.as_str(), "exercise note enriched");
    Ok(())
}
