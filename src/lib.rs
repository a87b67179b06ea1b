//! girevik - kettlebell workout notes analyzer
//!
//! Гиревик: parses Markdown workout notes into a normalised record, then
//! estimates calories and muscle-group balance from enriched exercise data.

pub mod analyzer;
pub mod calc;
pub mod config;
pub mod db;
pub mod enrich;
pub mod parser;
pub mod vocabulary;
pub mod writer;

pub use calc::CalcConstants;
pub use config::Config;
pub use parser::{WorkoutRecord, parse_workout};
