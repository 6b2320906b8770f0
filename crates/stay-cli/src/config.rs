//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the leg database file.
    pub database_path: PathBuf,

    /// Path to a TOML rule table. When absent, the built-in table applies.
    #[serde(default)]
    pub rules_path: Option<PathBuf>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("rules_path", &self.rules_path)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("stay.db"),
            rules_path: None,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (STAY_*)
        figment = figment.merge(Env::prefixed("STAY_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for stay.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("stay"))
}

/// Returns the platform-specific data directory for stay.
///
/// On Linux: `~/.local/share/stay`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("stay"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_data_dir_for_db() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("stay.db"));
        assert!(config.rules_path.is_none());
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "database_path = \"/tmp/custom.db\"\nrules_path = \"/tmp/rules.toml\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/custom.db"));
        assert_eq!(config.rules_path, Some(PathBuf::from("/tmp/rules.toml")));
    }
}
