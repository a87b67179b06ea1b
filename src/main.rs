//! girevik - kettlebell workout notes analyzer
//!
//! Гиревик: parses workout notes, estimates calories and muscle balance

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use tracing::warn;

use girevik::analyzer::{self, Analysis, NoteUpdate};
use girevik::calc::CalcConstants;
use girevik::config::Config;
use girevik::db::ExerciseCache;
use girevik::enrich::{ExerciseLibrary, Resolver};
use girevik::writer;

#[derive(Parser)]
#[command(name = "girevik")]
#[command(author, version, about = "Гиревик - workout notes analyzer")]
struct Cli {
    /// Configuration file
    #[arg(short, long, env = "GIREVIK_CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// Body weight in kg (overrides user.default_weight)
    #[arg(short, long)]
    weight: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a workout by path or date and write the analysis section
    Analyze {
        /// Path to the note or part of its file name (e.g., "2026-02-11")
        workout: String,
    },

    /// Analyze the newest workout
    Latest,

    /// Re-analyze every workout
    ReanalyzeAll,

    /// Print parsed workout and results as JSON without writing
    Show {
        /// Path to the note or part of its file name
        workout: String,
    },

    /// Show vault paths and counts
    Status,

    /// Exercise cache administration
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// List workouts that still need analysis
    Pending,

    /// Fill in MET, calories per rep and muscle groups of every exercise note
    UpdateExercises,

    /// Fill in one exercise note by name
    UpdateExercise {
        /// Exercise name as written in the note (e.g., "Махи гирей")
        name: String,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Number of cached exercises
    Stats,
    /// List cached exercises
    List,
    /// Remove cached exercises
    Clear {
        /// Only entries older than N days
        #[arg(long)]
        older_than_days: Option<u32>,
    },
}

/// Enrichment sources shared by the analysing commands
struct Sources {
    library: ExerciseLibrary,
    cache: Option<ExerciseCache>,
}

impl Sources {
    fn load(config: &Config) -> Result<Self> {
        Ok(Self {
            library: ExerciseLibrary::load(&config.vault.exercises_dir())?,
            cache: open_cache(config),
        })
    }

    fn resolver<'a>(&'a self, constants: &'a CalcConstants) -> Resolver<'a> {
        let resolver = Resolver::new(constants).with_library(&self.library);
        match &self.cache {
            Some(cache) => resolver.with_store(cache),
            None => resolver,
        }
    }
}

fn open_cache(config: &Config) -> Option<ExerciseCache> {
    match ExerciseCache::open(&config.vault.cache_path()) {
        Ok(cache) => Some(cache),
        Err(e) => {
            warn!(error = %e, "exercise cache unavailable, continuing without it");
            None
        }
    }
}

fn resolve_workout(config: &Config, query: &str) -> Result<PathBuf> {
    let dir = config.vault.workouts_dir();
    match analyzer::find_workout(&dir, query)? {
        Some(path) => Ok(path),
        None => bail!("workout not found: {} (in {})", query, dir.display()),
    }
}

fn print_analysis(path: &Path, analysis: &Analysis) {
    println!("{}", path.display());
    println!("  {}", writer::workout_summary(&analysis.workout));
    for (exercise, record) in analysis.workout.exercises.iter().zip(&analysis.enrichment) {
        println!("  - {:24} {:>5} reps  [{}]", exercise.name, exercise.reps, record.source.as_str());
    }
    println!(
        "  Калории: ~{:.0} ккал ({}) | Время: ~{:.0} мин | Основная группа: {}",
        analysis.calories.total_calories,
        analysis.calories.calculation_method.label(),
        analysis.calories.estimated_time_minutes,
        analysis
            .balance
            .primary_muscle
            .map(|g| g.name_ru())
            .unwrap_or("-")
    );
}

fn print_note_update(name: &str, update: NoteUpdate) {
    match update {
        NoteUpdate::Updated(source) => println!("Updated: {} [{}]", name, source.as_str()),
        NoteUpdate::AlreadyEnriched => println!("Skipping: {} (already enriched)", name),
        NoteUpdate::NoData => println!("No data: {}", name),
    }
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let user_weight = cli.weight.unwrap_or(config.user.default_weight);
    let constants = &config.calculation;
    let vocab = &config.vocabulary;

    match cli.command {
        Commands::Analyze { workout } => {
            let path = resolve_workout(&config, &workout)?;
            let sources = Sources::load(&config)?;
            let resolver = sources.resolver(constants);
            let analysis = analyzer::analyze_and_write(&path, &resolver, user_weight, constants, vocab)?;
            print_analysis(&path, &analysis);
        }

        Commands::Latest => {
            let dir = config.vault.workouts_dir();
            let Some(path) = analyzer::latest_workout(&dir)? else {
                bail!("no workouts in {}", dir.display());
            };
            let sources = Sources::load(&config)?;
            let resolver = sources.resolver(constants);
            let analysis = analyzer::analyze_and_write(&path, &resolver, user_weight, constants, vocab)?;
            print_analysis(&path, &analysis);
        }

        Commands::ReanalyzeAll => {
            let workouts = analyzer::list_workouts(&config.vault.workouts_dir())?;
            let sources = Sources::load(&config)?;
            let resolver = sources.resolver(constants);

            println!("Reanalyzing {} workouts...", workouts.len());
            let mut errors = 0;
            for path in &workouts {
                match analyzer::analyze_and_write(path, &resolver, user_weight, constants, vocab) {
                    Ok(analysis) => print_analysis(path, &analysis),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "analysis failed");
                        errors += 1;
                    }
                }
            }
            println!("{:-<40}", "");
            println!("Analyzed: {} | Errors: {}", workouts.len() - errors, errors);
        }

        Commands::Show { workout } => {
            let path = resolve_workout(&config, &workout)?;
            let sources = Sources::load(&config)?;
            let resolver = sources.resolver(constants);
            let analysis = analyzer::analyze_file(&path, &resolver, user_weight, constants, vocab)?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }

        Commands::Status => {
            let workouts = analyzer::list_workouts(&config.vault.workouts_dir())?;
            let pending = analyzer::pending_workouts(&config.vault.workouts_dir(), vocab)?;
            let library = ExerciseLibrary::load(&config.vault.exercises_dir())?;
            let cached = match open_cache(&config) {
                Some(cache) => cache.len()?,
                None => 0,
            };

            println!("Workout Analyzer Status");
            println!("{:-<40}", "");
            println!("Vault:     {}", config.vault.path.display());
            println!("Workouts:  {}", config.vault.workouts_dir().display());
            println!("Exercises: {}", config.vault.exercises_dir().display());
            println!("Cache:     {}", config.vault.cache_path().display());
            println!("{:-<40}", "");
            println!("Workouts: {} ({} pending analysis)", workouts.len(), pending.len());
            println!(
                "Exercises: {} ({} need enrichment)",
                library.len(),
                library.pending().len()
            );
            println!("Cached exercises: {}", cached);
            println!("Body weight: {} kg", user_weight);
        }

        Commands::Cache { action } => {
            let cache = ExerciseCache::open(&config.vault.cache_path())?;
            match action {
                CacheAction::Stats => {
                    println!("Cached exercises: {}", cache.len()?);
                }
                CacheAction::List => {
                    for entry in cache.list()? {
                        println!(
                            "{} | {:28} | MET {:>4.1} | {:.2} kcal/rep | {}",
                            entry.updated_at.format("%Y-%m-%d %H:%M"),
                            entry.key,
                            entry.record.met_base,
                            entry.record.cal_per_rep,
                            entry
                                .record
                                .muscle_groups
                                .iter()
                                .map(|g| g.as_str())
                                .collect::<Vec<_>>()
                                .join(", ")
                        );
                    }
                }
                CacheAction::Clear { older_than_days } => {
                    let removed = cache.clear(older_than_days)?;
                    println!("Removed {} cached exercises", removed);
                }
            }
        }

        Commands::Pending => {
            let pending = analyzer::pending_workouts(&config.vault.workouts_dir(), vocab)?;
            if pending.is_empty() {
                println!("All workouts are analyzed");
            }
            for path in pending {
                println!("{}", path.display());
            }
        }

        Commands::UpdateExercises => {
            let sources = Sources::load(&config)?;
            let resolver = sources.resolver(constants);
            let exercises = sources.library.exercises();

            println!("Found {} exercise notes", exercises.len());
            let (mut updated, mut skipped, mut errors) = (0, 0, 0);
            for exercise in exercises {
                match analyzer::update_exercise_note(exercise, &resolver) {
                    Ok(update) => {
                        match update {
                            NoteUpdate::Updated(_) => updated += 1,
                            _ => skipped += 1,
                        }
                        print_note_update(&exercise.name, update);
                    }
                    Err(e) => {
                        warn!(path = %exercise.path.display(), error = %e, "exercise update failed");
                        errors += 1;
                    }
                }
            }
            println!("{:-<40}", "");
            println!("Updated: {} | Skipped: {} | Errors: {}", updated, skipped, errors);
        }

        Commands::UpdateExercise { name } => {
            let sources = Sources::load(&config)?;
            let Some(exercise) = sources.library.find(&name, "") else {
                bail!("exercise not found: {} (in {})", name, config.vault.exercises_dir().display());
            };
            let resolver = sources.resolver(constants);
            let update = analyzer::update_exercise_note(exercise, &resolver)?;
            print_note_update(&exercise.name, update);
        }
    }

    Ok(())
}
