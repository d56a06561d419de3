//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the JSON file holding existing events.
    pub events_path: PathBuf,

    /// IANA timezone drafts are authored in. Falls back to the system timezone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("events_path", &self.events_path)
            .field("timezone", &self.timezone)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            events_path: data_dir.join("events.json"),
            timezone: None,
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

        // Load from environment variables (AMBIT_*)
        figment = figment.merge(Env::prefixed("AMBIT_"));

        figment.extract()
    }

    /// The viewer's timezone: configured value, else the system zone, else UTC.
    pub fn viewer_timezone(&self) -> String {
        self.timezone
            .as_deref()
            .map(str::trim)
            .filter(|tz| !tz.is_empty())
            .map(str::to_string)
            .or_else(|| iana_time_zone::get_timezone().ok())
            .unwrap_or_else(|| "UTC".to_string())
    }
}

/// Returns the platform-specific config directory for ambit.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ambit"))
}

/// Returns the platform-specific data directory for ambit.
///
/// On Linux: `~/.local/share/ambit`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("ambit"))
}
