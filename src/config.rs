//! Configuration management for the macro recorder

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::control::ControlKeys;
use crate::playback::LoopMode;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Global control keys
    #[serde(default)]
    pub hotkeys: HotkeyConfig,

    /// Input capture configuration
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Playback defaults
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Script storage
    #[serde(default)]
    pub scripts: ScriptsConfig,

    /// Path to config file (not serialized)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

/// Virtual-key codes of the three control keys. These are never recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotkeyConfig {
    /// Start, or pause/resume a running macro (F9)
    #[serde(default = "default_toggle_run")]
    pub toggle_run: u32,

    /// Stop playback (F10)
    #[serde(default = "default_stop")]
    pub stop: u32,

    /// Start/stop recording (F11)
    #[serde(default = "default_toggle_record")]
    pub toggle_record: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Whether to record keyboard transitions
    #[serde(default = "default_true")]
    pub capture_keyboard: bool,

    /// Whether to record mouse button transitions
    #[serde(default = "default_true")]
    pub capture_mouse_click: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Number of passes in count mode
    #[serde(default = "default_run_count")]
    pub run_count: u32,

    /// Total run time in milliseconds. When set, duration mode is used.
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptsConfig {
    /// Where recordings are saved when no script path is given
    #[serde(default = "default_scripts_directory")]
    pub directory: PathBuf,
}

// Default value functions
fn default_toggle_run() -> u32 {
    0x78
}

fn default_stop() -> u32 {
    0x79
}

fn default_toggle_record() -> u32 {
    0x7A
}

fn default_true() -> bool {
    true
}

fn default_run_count() -> u32 {
    1
}

fn default_scripts_directory() -> PathBuf {
    directories::ProjectDirs::from("dev", "macro-recorder", "recorder")
        .map(|dirs| dirs.data_dir().join("scripts"))
        .unwrap_or_else(|| std::env::temp_dir().join("macro-recorder-scripts"))
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            toggle_run: default_toggle_run(),
            stop: default_stop(),
            toggle_record: default_toggle_record(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            capture_keyboard: true,
            capture_mouse_click: true,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            run_count: default_run_count(),
            duration_ms: None,
        }
    }
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            directory: default_scripts_directory(),
        }
    }
}

impl Config {
    /// Load configuration from default location or create default
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific file, creating it with defaults if missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let mut config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

            config.config_path = Some(config_path.to_path_buf());
            Ok(config)
        } else {
            let config = Config {
                config_path: Some(config_path.to_path_buf()),
                ..Config::default()
            };
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = self.config_path()?;

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    /// Get the config file path
    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Self::default_config_path(),
        }
    }

    /// Get default config path
    fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = directories::ProjectDirs::from("dev", "macro-recorder", "recorder")
            .context("Failed to determine config directory")?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// The three control keys filtered out of recordings
    pub fn control_keys(&self) -> ControlKeys {
        ControlKeys {
            toggle_run: self.hotkeys.toggle_run,
            stop: self.hotkeys.stop,
            toggle_record: self.hotkeys.toggle_record,
        }
    }

    /// Loop mode used when the command line doesn't pick one
    pub fn default_loop_mode(&self) -> LoopMode {
        match self.playback.duration_ms {
            Some(ms) => LoopMode::Duration(std::time::Duration::from_millis(ms)),
            None => LoopMode::Count(self.playback.run_count.max(1)),
        }
    }

    /// Where a recording named `name` is saved by default
    pub fn script_path_for(&self, name: &str) -> PathBuf {
        self.scripts.directory.join(format!("{name}.json"))
    }
}
