use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::data::column_profile::ProfileSettings;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub profile: ProfileSettings,
    pub display: DisplayConfig,
    pub catalog: CatalogConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Endpoint that executes query text
    pub query_url: String,

    /// Endpoint that turns a prompt into query text
    pub generator_url: String,

    /// Request timeout for both endpoints
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Maximum rows printed by `\show`
    pub max_display_rows: usize,

    /// Colored prompt and messages
    pub use_color: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Catalog file (JSON or TOML) replacing the built-in CUR catalog
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,

    /// Also write logs to a file in the data directory
    pub log_to_file: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            query_url: "http://localhost:5000/api/query".to_string(),
            generator_url: "http://localhost:5000/api/generate-sql".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_display_rows: 50,
            use_color: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: true,
        }
    }
}

impl Config {
    /// Load config from the default location, writing defaults on first use
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            let default_config = Self::default();
            default_config.save_to(&config_path)?;
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("cur-workbench").join("config.toml"))
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# CUR Workbench Configuration File
# Location: ~/.config/cur-workbench/config.toml (Linux)
#           ~/Library/Application Support/cur-workbench/config.toml (macOS)
#           %APPDATA%\cur-workbench\config.toml (Windows)

[backend]
# Endpoint that executes query text: POST {"query": "..."}
query_url = "http://localhost:5000/api/query"

# Endpoint that generates query text from a prompt: POST {"prompt": "..."}
generator_url = "http://localhost:5000/api/generate-sql"

# Request timeout in seconds
timeout_secs = 30

[profile]
# Rows inspected when deciding whether a column is numeric
sample_rows = 100

# A column is numeric when more than this fraction of its non-empty
# sampled cells are numbers
numeric_threshold = 0.7

# Label shown for null cells in value lists
empty_label = "(empty)"

[display]
# Maximum rows printed by \show
max_display_rows = 50

# Colored prompt and messages
use_color = true

[catalog]
# Catalog file replacing the built-in CUR catalog (JSON or TOML)
# path = "/path/to/catalog.json"

[logging]
# Default log level (RUST_LOG overrides)
level = "info"

# Also write logs to a file under the data directory
log_to_file = true
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.profile.sample_rows, 100);
        assert_eq!(config.profile.numeric_threshold, 0.7);
        assert_eq!(config.profile.empty_label, "(empty)");
        assert!(config.catalog.path.is_none());
    }

    #[test]
    fn test_commented_template_matches_defaults() {
        let parsed: Config = toml::from_str(&Config::create_default_with_comments()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: Config = toml::from_str("[display]\nmax_display_rows = 5\n").unwrap();
        assert_eq!(parsed.display.max_display_rows, 5);
        assert!(parsed.display.use_color);
        assert_eq!(parsed.backend, BackendConfig::default());
    }

    #[test]
    fn test_config_round_trip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.catalog.path = Some(PathBuf::from("/tmp/catalog.json"));
        config.logging.level = "debug".to_string();
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[profile]\nsample_rows = \"many\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
