// SPDX-License-Identifier: MIT OR Apache-2.0
//! State hooks and the context they run with.

use serde::{Deserialize, Serialize};
use std::fmt;
use waymark_core::{EffectSink, GameState, HookError, WallSide, World};

/// External event forwarded to the current state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    /// The character started touching a wall
    WallContact(WallSide),
    /// The character touched ground
    Landed,
    /// The character left the ground
    LeftGround,
    /// A dialogue took over the character
    DialogueStarted,
    /// The dialogue released the character
    DialogueEnded,
    /// Host-defined event
    Custom(String),
}

/// What a state hook can see and do
pub struct StateContext<'a, K> {
    key: K,
    current: Option<K>,
    world: &'a mut dyn World,
    requested: &'a mut Option<K>,
}

impl<'a, K: Copy> StateContext<'a, K> {
    pub(crate) fn new(
        key: K,
        current: Option<K>,
        world: &'a mut dyn World,
        requested: &'a mut Option<K>,
    ) -> Self {
        Self {
            key,
            current,
            world,
            requested,
        }
    }

    /// Key of the state whose hook is running
    pub fn key(&self) -> K {
        self.key
    }

    /// The machine's current state as outside observers see it.
    ///
    /// While a transition is underway this is still the old state; it is
    /// `None` while the first state of a run is entered.
    pub fn current(&self) -> Option<K> {
        self.current
    }

    /// Read-only game state
    pub fn state(&self) -> &dyn GameState {
        self.world.state()
    }

    /// Effect sink
    pub fn effects(&mut self) -> &mut dyn EffectSink {
        self.world.effects()
    }

    /// Ask for a transition once this hook returns. A later request replaces
    /// an earlier one from the same hook.
    pub fn request_transition(&mut self, target: K) {
        *self.requested = Some(target);
    }

    /// The transition requested so far by this hook
    pub fn requested(&self) -> Option<K> {
        *self.requested
    }
}

/// A character state.
///
/// Every hook has a no-op default. Instances are kept for the machine's
/// lifetime and re-entered on later visits, so per-visit data must be reset
/// in [`State::enter`].
#[allow(unused_variables)]
pub trait State<K>: fmt::Debug {
    /// Runs once, before the first `enter` of this instance
    fn on_state_added(&mut self, cx: &mut StateContext<'_, K>) -> Result<(), HookError> {
        Ok(())
    }

    /// The state becomes current
    fn enter(&mut self, cx: &mut StateContext<'_, K>) -> Result<(), HookError> {
        Ok(())
    }

    /// The state stops being current
    fn exit(&mut self, cx: &mut StateContext<'_, K>) -> Result<(), HookError> {
        Ok(())
    }

    /// Per-frame update
    fn update(&mut self, cx: &mut StateContext<'_, K>) -> Result<(), HookError> {
        Ok(())
    }

    /// Fixed-step update
    fn fixed_update(&mut self, cx: &mut StateContext<'_, K>) -> Result<(), HookError> {
        Ok(())
    }

    /// External event
    fn on_signal(
        &mut self,
        signal: &Signal,
        cx: &mut StateContext<'_, K>,
    ) -> Result<(), HookError> {
        Ok(())
    }
}
