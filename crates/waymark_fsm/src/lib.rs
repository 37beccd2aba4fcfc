// SPDX-License-Identifier: MIT OR Apache-2.0
//! Character state machine for Waymark.
//!
//! States own their guards and pick their own successors; the machine only
//! sequences the hooks:
//! - `on_state_added` once per state instance
//! - `exit` on the old state strictly before `enter` on the new one
//! - transitions requested inside a hook are applied after it returns
//!
//! The [`character`] module ships the stock platformer states.

pub mod character;
pub mod machine;
pub mod state;

pub use character::{character_machine, CharacterState, MovementProfile};
pub use machine::{MachineConfig, MachineError, MachineStatus, StateMachine};
pub use state::{Signal, State, StateContext};
