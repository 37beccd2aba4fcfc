// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host world contracts.
//!
//! The runtime never reaches for global managers. Everything a hook reads or
//! mutates goes through these traits, which the host implements once and
//! hands to the engine or state machine at construction.

use crate::error::StateAccessError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of the character a wall is touching
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WallSide {
    /// Wall on the left
    Left,
    /// Wall on the right
    Right,
}

impl WallSide {
    /// Horizontal direction pointing away from this wall
    pub fn away(&self) -> f32 {
        match self {
            Self::Left => 1.0,
            Self::Right => -1.0,
        }
    }
}

/// Handle for an effect whose completion is reported back by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectTicket(pub u64);

impl fmt::Display for EffectTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effect#{}", self.0)
    }
}

/// Read-only view of external game state.
///
/// Queries must not block and must not mutate anything. An `Err` means the
/// state could not be read at all; an ordinary negative answer is `Ok(false)`.
pub trait GameState {
    /// Remaining health of a named target (boss, enemy, player)
    fn remaining_health(&self, target: &str) -> Result<f32, StateAccessError>;

    /// Whether the character touches a wall on the given side
    fn is_touching_wall(&self, side: WallSide) -> Result<bool, StateAccessError>;

    /// Total amount held of a currency kind
    fn currency_total(&self, kind: &str) -> Result<f32, StateAccessError>;

    /// Whether a named ability or progress flag is set
    fn has_flag(&self, name: &str) -> Result<bool, StateAccessError>;

    /// Whether a named input action is currently held
    fn is_input_active(&self, action: &str) -> Result<bool, StateAccessError>;

    /// Whether the character stands on ground
    fn is_grounded(&self) -> Result<bool, StateAccessError>;
}

/// Side effects requested by node and state hooks
pub trait EffectSink {
    /// Allow the player to move
    fn enable_movement(&mut self);

    /// Freeze player movement
    fn disable_movement(&mut self);

    /// Allow jumping
    fn enable_jump(&mut self);

    /// Forbid jumping
    fn disable_jump(&mut self);

    /// Set the character velocity
    fn set_velocity(&mut self, x: f32, y: f32);

    /// Start a named visual transition (fade, wipe).
    ///
    /// The host reports completion later with the returned ticket.
    fn start_transition_effect(&mut self, name: &str) -> EffectTicket;

    /// Present a line of dialogue
    fn present_line(&mut self, speaker: &str, text: &str);

    /// Run a host-defined scripted action
    fn invoke_scripted_action(&mut self, id: &str);
}

/// Everything a hook can touch: state queries plus effects.
///
/// Blanket-implemented for every type that implements both halves.
pub trait World {
    /// Read-only state view
    fn state(&self) -> &dyn GameState;

    /// Effect view
    fn effects(&mut self) -> &mut dyn EffectSink;
}

impl<T: GameState + EffectSink> World for T {
    fn state(&self) -> &dyn GameState {
        self
    }

    fn effects(&mut self) -> &mut dyn EffectSink {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_side_points_away() {
        assert_eq!(WallSide::Left.away(), 1.0);
        assert_eq!(WallSide::Right.away(), -1.0);
    }

    #[test]
    fn test_ticket_display() {
        assert_eq!(EffectTicket(7).to_string(), "effect#7");
    }
}
