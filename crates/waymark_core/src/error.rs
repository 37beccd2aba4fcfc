// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors raised at the world boundary.

use thiserror::Error;

/// Failure to read external game state.
///
/// Reserved for genuinely exceptional access failures. A condition that is
/// simply false never produces one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StateAccessError {
    /// The queried target does not exist in the world
    #[error("Unknown target: {0}")]
    UnknownTarget(String),

    /// The state could not be read right now
    #[error("State unavailable: {0}")]
    Unavailable(String),
}

/// Failure raised by a node or state hook
#[derive(Debug, Error)]
pub enum HookError {
    /// A state query failed
    #[error(transparent)]
    StateAccess(#[from] StateAccessError),

    /// Hook-specific failure
    #[error("{0}")]
    Failed(String),
}

impl HookError {
    /// Create a hook-specific failure
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
