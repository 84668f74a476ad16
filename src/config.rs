//! # Configuration
//!
//! YAML configuration for the pattern engine: where the library file lives and
//! which keys trigger which cues.
//!
//! Default location: `<config dir>/cadence/config.yaml`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PatternError;

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON file holding the pattern library.
    pub library_path: PathBuf,
    pub keybindings: KeyBindings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            library_path: default_library_path(),
            keybindings: KeyBindings::default(),
        }
    }
}

/// Key names follow the browser `KeyboardEvent.key` convention (`"Enter"`,
/// `"ArrowUp"`, `" "` for space).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    /// Keys `1`-`9` set intensity 1-9 and `0` sets 10
    pub digit_intensity: bool,
    /// Start/stop recording
    pub toggle_recording: Vec<String>,
    /// Key -> motivational message
    pub messages: BTreeMap<String, String>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let messages = [
            (" ", "KEEP GOING!"),
            ("Enter", "PUSH IT!"),
            ("ArrowUp", "FASTER!"),
            ("ArrowDown", "RECOVER"),
            ("f", "🔥 BURN 🔥"),
            ("p", "POWER"),
            ("s", "STRONG"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            digit_intensity: true,
            toggle_recording: vec!["r".into()],
            messages,
        }
    }
}

/// Default library file: `<data dir>/cadence/pattern_library.json`
pub fn default_library_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cadence")
        .join("pattern_library.json")
}

/// Default config file: `<config dir>/cadence/config.yaml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cadence")
        .join("config.yaml")
}

/// Load configuration from a YAML file
///
/// If the file doesn't exist, returns the default config.
/// If the file exists but is invalid, logs a warning and returns the default config.
pub fn load_config(path: &Path) -> Config {
    log::info!("load_config: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_config: Config file doesn't exist, using defaults");
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match parse_config(&contents) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("load_config: {}, using defaults", e);
                Config::default()
            }
        },
        Err(e) => {
            log::warn!("load_config: Failed to read config file: {}, using defaults", e);
            Config::default()
        }
    }
}

pub fn parse_config(contents: &str) -> Result<Config, PatternError> {
    serde_yaml::from_str(contents).map_err(|e| PatternError::Config(e.to_string()))
}

/// Save configuration to a YAML file, creating parent directories.
pub fn save_config(config: &Config, path: &Path) -> Result<(), PatternError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| PatternError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let yaml = serde_yaml::to_string(config).map_err(|e| PatternError::Config(e.to_string()))?;
    std::fs::write(path, yaml).map_err(|source| PatternError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("save_config: Config saved to {:?}", path);
    Ok(())
}
