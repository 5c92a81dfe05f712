//! Configuration for the admin tool

use crate::error::{AdminError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub import: ImportConfig,
    pub comments: CommentConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AdminError::io(path, e))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| AdminError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.import.batch_size == 0 {
            return Err(AdminError::Config(
                "import.batch_size must be greater than zero".to_string(),
            ));
        }
        if self.comments.max_length == 0 {
            return Err(AdminError::Config(
                "comments.max_length must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("crowdfunding.db"),
        }
    }
}

/// Import settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Rows per INSERT statement for location imports
    pub batch_size: usize,
    /// Locations with a smaller population are skipped
    pub min_population: i64,
    /// Country code matched by legacy states files
    pub legacy_state_country: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            min_population: 0,
            legacy_state_country: "US".to_string(),
        }
    }
}

/// Comment form settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentConfig {
    /// Maximum comment length in characters
    pub max_length: usize,
    /// Secret the anti-forgery token is derived from
    pub session_secret: String,
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            max_length: 2000,
            session_secret: "change-me".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.import.batch_size, 500);
        assert_eq!(config.import.min_population, 0);
        assert_eq!(config.import.legacy_state_country, "US");
        assert_eq!(config.comments.max_length, 2000);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = toml::from_str("[import]\nmin_population = 15000\n").unwrap();
        assert_eq!(config.import.min_population, 15000);
        assert_eq!(config.import.batch_size, 500);
        assert_eq!(config.database.path, PathBuf::from("crowdfunding.db"));
    }

    #[test]
    fn test_load_rejects_zero_batch() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[import]\nbatch_size = 0").unwrap();

        let result = Config::load(file.path());
        assert!(matches!(result, Err(AdminError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[database]\npath = \"/tmp/cf.db\"\n[comments]\nmax_length = 300").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/cf.db"));
        assert_eq!(config.comments.max_length, 300);
    }
}
