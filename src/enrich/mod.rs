//! Exercise enrichment - MET, calories per rep and muscle groups
//!
//! Lookup priority: local exercise library (only fully enriched entries),
//! then the cache, then an external search if one is configured, then a
//! fallback record.

pub mod library;

pub use library::{ExerciseLibrary, LibraryExercise, update_note};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calc::CalcConstants;
use crate::parser::ExerciseEntry;
use crate::vocabulary::MuscleGroup;

/// Where an enrichment record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentSource {
    Local,
    Cache,
    External,
    Fallback,
}

impl EnrichmentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrichmentSource::Local => "local",
            EnrichmentSource::Cache => "cache",
            EnrichmentSource::External => "external",
            EnrichmentSource::Fallback => "fallback",
        }
    }
}

/// Per-exercise data consumed by the calculators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    pub name: String,
    #[serde(default)]
    pub equipment: String,
    pub met_base: f64,
    #[serde(default)]
    pub cal_per_rep: f64,
    #[serde(default)]
    pub muscle_groups: Vec<MuscleGroup>,
    pub source: EnrichmentSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
}

impl EnrichmentRecord {
    /// Record used when nothing knows the exercise
    pub fn fallback(name: &str, equipment: &str, constants: &CalcConstants) -> Self {
        Self {
            name: name.to_string(),
            equipment: equipment.to_string(),
            met_base: constants.default_met,
            cal_per_rep: 0.0,
            muscle_groups: Vec::new(),
            source: EnrichmentSource::Fallback,
            fetched_at: None,
        }
    }
}

/// Structured answer of an external exercise-data search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    pub met_base: Option<f64>,
    pub cal_per_rep: Option<f64>,
    pub muscle_groups: Vec<MuscleGroup>,
}

/// External exercise-data search (web search or LLM backed)
pub trait ExerciseSearch {
    fn search(&self, name: &str, equipment: &str) -> Result<SearchResult>;
}

/// Key-value store of enrichment records keyed by exercise name
pub trait ExerciseStore {
    fn get(&self, name: &str) -> Result<Option<EnrichmentRecord>>;
    fn put(&self, name: &str, record: &EnrichmentRecord) -> Result<()>;
}

/// Cache key: lowercase, filename-safe, whitespace collapsed to `_`
pub fn normalize_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '\\' | '/' | '*' | '?' | '"' | ':' | '<' | '>' | '|'))
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Case-insensitive containment either way; empty sides always match
pub(crate) fn equipment_matches(wanted: &str, stored: &str) -> bool {
    if wanted.trim().is_empty() || stored.trim().is_empty() {
        return true;
    }
    let wanted = wanted.to_lowercase();
    let stored = stored.to_lowercase();
    stored.contains(&wanted) || wanted.contains(&stored)
}

/// Resolves enrichment records through the configured sources
pub struct Resolver<'a> {
    library: Option<&'a ExerciseLibrary>,
    store: Option<&'a dyn ExerciseStore>,
    search: Option<&'a dyn ExerciseSearch>,
    constants: &'a CalcConstants,
}

impl<'a> Resolver<'a> {
    pub fn new(constants: &'a CalcConstants) -> Self {
        Self {
            library: None,
            store: None,
            search: None,
            constants,
        }
    }

    pub fn with_library(mut self, library: &'a ExerciseLibrary) -> Self {
        self.library = Some(library);
        self
    }

    pub fn with_store(mut self, store: &'a dyn ExerciseStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_search(mut self, search: &'a dyn ExerciseSearch) -> Self {
        self.search = Some(search);
        self
    }

    /// Enrichment for one exercise, never fails
    pub fn resolve(&self, name: &str, equipment: &str) -> EnrichmentRecord {
        if let Some(record) = self
            .library
            .and_then(|lib| lib.find(name, equipment))
            .and_then(LibraryExercise::to_record)
        {
            debug!(exercise = name, "enrichment from local library");
            return record;
        }

        if let Some(store) = self.store {
            match store.get(name) {
                Ok(Some(record)) if equipment_matches(equipment, &record.equipment) => {
                    debug!(exercise = name, "enrichment from cache");
                    return record;
                }
                Ok(_) => {}
                Err(e) => warn!(exercise = name, error = %e, "cache lookup failed"),
            }
        }

        if let Some(search) = self.search {
            match search.search(name, equipment) {
                Ok(found) => {
                    let record = EnrichmentRecord {
                        name: name.to_string(),
                        equipment: equipment.to_string(),
                        met_base: found.met_base.unwrap_or(self.constants.default_met),
                        cal_per_rep: found.cal_per_rep.unwrap_or(0.0).max(0.0),
                        muscle_groups: found.muscle_groups,
                        source: EnrichmentSource::External,
                        fetched_at: Some(Utc::now()),
                    };
                    if let Some(store) = self.store {
                        if let Err(e) = store.put(name, &record) {
                            warn!(exercise = name, error = %e, "failed to cache enrichment");
                        }
                    }
                    info!(exercise = name, "enrichment from external search");
                    return record;
                }
                Err(e) => warn!(exercise = name, error = %e, "exercise search failed"),
            }
        }

        debug!(exercise = name, "no enrichment source, using fallback");
        EnrichmentRecord::fallback(name, equipment, self.constants)
    }

    /// Records aligned 1:1 with `exercises`
    pub fn resolve_all(&self, exercises: &[ExerciseEntry]) -> Vec<EnrichmentRecord> {
        exercises
            .iter()
            .map(|ex| self.resolve(&ex.name, ex.equipment.as_deref().unwrap_or("")))
            .collect()
    }
}
