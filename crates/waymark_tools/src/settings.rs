// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tool settings.
//!
//! Read from `waymark.ron` in the working directory, or from the file given
//! with `--settings`. Every section is optional.

use crate::error;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use waymark_fsm::{MachineConfig, MovementProfile};
use waymark_graph::EngineConfig;

/// Default settings file name
pub const SETTINGS_FILE: &str = "waymark.ron";

/// Newest settings format this build understands
pub const FORMAT_VERSION: u32 = 1;

/// Sandbox runner limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxSettings {
    /// Suspensions the runner resumes before giving up
    pub max_resumes: usize,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self { max_resumes: 256 }
    }
}

/// Contents of a settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Settings format version
    pub format_version: u32,
    /// Graph engine tuning
    pub engine: EngineConfig,
    /// State machine tuning
    pub machine: MachineConfig,
    /// Stock character movement
    pub movement: MovementProfile,
    /// Sandbox runner limits
    pub sandbox: SandboxSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            engine: EngineConfig::default(),
            machine: MachineConfig::default(),
            movement: MovementProfile::default(),
            sandbox: SandboxSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = ron::from_str(&content)?;

        if settings.format_version > FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: settings.format_version,
                supported: FORMAT_VERSION,
            });
        }

        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load the given file, else `waymark.ron` if present, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(SETTINGS_FILE).exists() => Self::load(Path::new(SETTINGS_FILE)),
            None => Ok(Self::default()),
        }
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Write a settings file with default values
#[derive(Parser)]
pub struct Init {
    /// Where to write the settings
    #[arg(value_name = "FILE", default_value = SETTINGS_FILE)]
    path: PathBuf,

    /// Replace an existing file
    #[arg(long)]
    force: bool,
}

impl Init {
    /// Run the command
    pub fn execute(self) -> error::Result<bool> {
        if self.path.exists() && !self.force {
            tracing::warn!(
                "{} already exists, pass --force to replace it",
                self.path.display()
            );
            return Ok(false);
        }
        Settings::default().save(&self.path)?;
        tracing::info!("Wrote {}", self.path.display());
        Ok(true)
    }
}

/// Settings file errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// IO failure
    #[error("Settings IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid RON
    #[error("Settings parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serialization failed
    #[error("Settings serialize error: {0}")]
    Serialize(#[from] ron::Error),

    /// Written by a newer version
    #[error("Settings format version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest supported version
        supported: u32,
    },
}
