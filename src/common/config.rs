//! Configuration file handling

use serde::Deserialize;
use std::path::PathBuf;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Default target settings
    #[serde(default)]
    pub target: TargetDefaults,

    /// Extra directories searched for test/suite spec files
    #[serde(default)]
    pub paths: Vec<PathBuf>,

    /// Event reporting settings
    #[serde(default)]
    pub events: EventsConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Prompt pattern overrides for interactive transports
    #[serde(default)]
    pub prompts: PromptOverrides,

    /// Editor used by the `new` and `edit` commands; falls back to $EDITOR
    pub editor: Option<String>,
}

/// Default target settings applied when the run URI omits them
#[derive(Debug, Deserialize, Default)]
pub struct TargetDefaults {
    /// Default target URI for `run`/`exec` when none is given
    pub uri: Option<String>,

    /// Username merged into URIs that carry none
    pub username: Option<String>,

    /// Password merged into URIs that carry none
    pub password: Option<String>,
}

/// Event reporting settings
#[derive(Debug, Deserialize)]
pub struct EventsConfig {
    /// Event format: "human" or "machine"
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}

/// Timeout settings in seconds
#[derive(Debug, Clone, Deserialize)]
pub struct Timeouts {
    /// Timeout for establishing a transport connection
    #[serde(default = "default_connect")]
    pub connect_secs: u64,

    /// Timeout for a single command (prompt wait or exit status)
    #[serde(default = "default_command")]
    pub command_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect_secs: default_connect(),
            command_secs: default_command(),
        }
    }
}

fn default_connect() -> u64 {
    10
}
fn default_command() -> u64 {
    30
}

/// Prompt pattern overrides for serial/telnet sessions
///
/// Unset fields keep the per-transport defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PromptOverrides {
    /// Shell prompt pattern (regular expression)
    pub shell: Option<String>,

    /// Login prompt pattern; setting it enables the login sequence
    pub login: Option<String>,

    /// Password prompt pattern
    pub password: Option<String>,
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }

    /// Editor command for spec authoring, from config or $EDITOR
    pub fn editor(&self) -> String {
        self.editor
            .clone()
            .or_else(|| std::env::var("EDITOR").ok())
            .unwrap_or_else(|| "vi".to_string())
    }
}
