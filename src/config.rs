// Optional YAML configuration

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "searchdash";

fn default_word_limit() -> usize {
    100
}

fn default_bar_width() -> usize {
    40
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database holding the search log
    #[serde(default)]
    pub database: Option<PathBuf>,
    /// Default lower bound, `YYYY-MM-DD`
    #[serde(default)]
    pub start: Option<String>,
    /// Default upper bound, `YYYY-MM-DD`
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default = "default_word_limit")]
    pub word_limit: usize,
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            start: None,
            end: None,
            word_limit: default_word_limit(),
            bar_width: default_bar_width(),
        }
    }
}

impl Config {
    /// `<config_dir>/searchdash/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.yaml"))
    }

    /// Load from `path`, or from the default location when None.
    /// A missing file gives defaults; an unreadable or malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(p) => p,
            None => return Ok(Self::default()),
        };

        if !path.exists() {
            debug!(path = ?path, "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).with_context(|| format!("Failed to read config {:?}", path))?;
        let config: Config =
            serde_yaml::from_str(&content).with_context(|| format!("Failed to parse config {:?}", path))?;

        debug!(path = ?path, "Loaded config");
        Ok(config)
    }

    /// Configured database, else `<data_dir>/searchdash/busquedas.db`
    pub fn database_path(&self) -> PathBuf {
        if let Some(db) = &self.database {
            return db.clone();
        }
        dirs::data_dir()
            .map(|d| d.join(APP_DIR).join("busquedas.db"))
            .unwrap_or_else(|| PathBuf::from("busquedas.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(Some(temp.path().join("config.yaml").as_path())).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.word_limit, 100);
        assert_eq!(config.bar_width, 40);
    }

    #[test]
    fn test_load_partial_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "database: /tmp/busquedas.db\nstart: \"2023-01-01\"\nword_limit: 25\n").unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/tmp/busquedas.db"));
        assert_eq!(config.start.as_deref(), Some("2023-01-01"));
        assert_eq!(config.end, None);
        assert_eq!(config.word_limit, 25);
        assert_eq!(config.bar_width, 40);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "word_limit: [not, a, number]\n").unwrap();

        assert!(Config::load(Some(path.as_path())).is_err());
    }
}
