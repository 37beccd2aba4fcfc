// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tool errors.

use crate::settings::SettingsError;
use std::path::PathBuf;
use waymark_fsm::{CharacterState, MachineError};
use waymark_graph::{AssetError, EngineError};

/// Result type for tool commands
pub type Result<T> = std::result::Result<T, ToolError>;

/// Anything that stops a command
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// A file could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        /// File path
        path: PathBuf,
        /// IO failure
        source: std::io::Error,
    },

    /// A graph asset is invalid
    #[error("{}: {source}", .path.display())]
    Asset {
        /// File path
        path: PathBuf,
        /// Asset failure
        source: AssetError,
    },

    /// A sandbox world file is invalid
    #[error("Invalid world file {}: {source}", .path.display())]
    World {
        /// File path
        path: PathBuf,
        /// Parse failure
        source: ron::error::SpannedError,
    },

    /// Settings could not be loaded
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The engine rejected a call or a node failed
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The character machine failed
    #[error(transparent)]
    Machine(#[from] MachineError<CharacterState>),

    /// JSON output failed
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The graph kept suspending
    #[error("Gave up after {0} resumes")]
    ResumeLimit(usize),
}
