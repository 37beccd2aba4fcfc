// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared runtime contracts for Waymark.
//!
//! Graph traversal and character state machines both run against the same
//! host-provided world. This crate defines that boundary:
//! - [`GameState`] read-only queries used by conditions
//! - [`EffectSink`] side effects pushed out by node and state hooks
//! - [`Condition`] predicates used as branch gates and transition guards
//! - [`HookError`] failures raised by hooks
//! - [`SandboxWorld`] an in-memory world for tooling and tests

pub mod condition;
pub mod context;
pub mod effect;
pub mod error;
pub mod sandbox;

pub use condition::{Compare, Condition};
pub use context::{EffectSink, EffectTicket, GameState, WallSide, World};
pub use effect::{apply_all, Effect};
pub use error::{HookError, StateAccessError};
pub use sandbox::{EffectRecord, SandboxWorld, SharedWorld};
