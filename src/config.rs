//! YAML configuration with defaults for every section

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::calc::CalcConstants;
use crate::vocabulary::Vocabulary;

/// Notes vault layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub path: PathBuf,
    pub workouts_folder: String,
    pub exercises_folder: String,
    /// Relative paths are resolved against `path`
    pub cache_db: PathBuf,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            workouts_folder: "Workouts".to_string(),
            exercises_folder: "Exercises".to_string(),
            cache_db: PathBuf::from(".cache/exercises.db"),
        }
    }
}

impl VaultConfig {
    pub fn workouts_dir(&self) -> PathBuf {
        self.path.join(&self.workouts_folder)
    }

    pub fn exercises_dir(&self) -> PathBuf {
        self.path.join(&self.exercises_folder)
    }

    pub fn cache_path(&self) -> PathBuf {
        if self.cache_db.is_absolute() {
            self.cache_db.clone()
        } else {
            self.path.join(&self.cache_db)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Athlete body weight (kg)
    pub default_weight: f64,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self { default_weight: 70.0 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub vault: VaultConfig,
    pub user: UserConfig,
    pub calculation: CalcConstants,
    pub vocabulary: Vocabulary,
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).context("invalid configuration")
    }

    /// Load `path`; a missing file gives defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "config not found, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_default() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.user.default_weight, 70.0);
        assert_eq!(config.vault.workouts_dir(), PathBuf::from("./Workouts"));
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_yaml(
            "vault:\n  path: /home/me/vault\nuser:\n  default_weight: 82.5\ncalculation:\n  default_met: 7\n",
        )
        .unwrap();
        assert_eq!(config.vault.exercises_dir(), PathBuf::from("/home/me/vault/Exercises"));
        assert_eq!(config.vault.cache_path(), PathBuf::from("/home/me/vault/.cache/exercises.db"));
        assert_eq!(config.user.default_weight, 82.5);
        assert_eq!(config.calculation.default_met, 7.0);
        assert_eq!(config.calculation.base_weight, 70.0);
    }

    #[test]
    fn test_vocabulary_override() {
        let config = Config::from_yaml("vocabulary:\n  noise_keywords: [разминка, заминка]\n").unwrap();
        assert!(config.vocabulary.is_noise("Заминка"));
        assert!(!config.vocabulary.is_noise("Растяжка"));
        assert!(config.vocabulary.is_scheme_heading("Схема"));
    }

    #[test]
    fn test_bundled_config_matches_defaults() {
        let config = Config::from_yaml(include_str!("../config.yaml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = Config::load(Path::new("/nonexistent/config.yaml")).unwrap();
        assert_eq!(config.vault.workouts_folder, "Workouts");
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        assert!(Config::from_yaml("user: [1, 2").is_err());
    }
}
