// SPDX-License-Identifier: MIT OR Apache-2.0
//! Finite state machine driver.
//!
//! There is no transition table. Each state decides its own successor from
//! inside its hooks through [`StateContext::request_transition`]; the machine
//! applies the request once the hook has returned, so a hook always sees the
//! same current state from start to finish.

use crate::state::{Signal, State, StateContext};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use waymark_core::{HookError, World};

/// Machine tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Transitions one call may chain before the machine gives up
    pub max_chained_transitions: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            max_chained_transitions: 8,
        }
    }
}

/// Machine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineStatus<K> {
    /// Never started
    Uninitialized,
    /// Running with a current state
    Active(K),
    /// Force-exited or failed while entering a state
    Stopped,
}

type Factory<K> = Box<dyn Fn() -> Box<dyn State<K>>>;

/// State machine over states keyed by `K`
pub struct StateMachine<K, W> {
    world: W,
    config: MachineConfig,
    factories: IndexMap<K, Factory<K>>,
    states: IndexMap<K, Box<dyn State<K>>>,
    status: MachineStatus<K>,
}

impl<K, W> StateMachine<K, W>
where
    K: Copy + Eq + Hash + fmt::Debug + 'static,
    W: World,
{
    /// Create a machine with default config
    pub fn new(world: W) -> Self {
        Self::with_config(world, MachineConfig::default())
    }

    /// Create a machine with explicit config
    pub fn with_config(world: W, config: MachineConfig) -> Self {
        Self {
            world,
            config,
            factories: IndexMap::new(),
            states: IndexMap::new(),
            status: MachineStatus::Uninitialized,
        }
    }

    /// Register how to build a state. The state is created on first entry.
    pub fn register<S, F>(&mut self, key: K, factory: F) -> &mut Self
    where
        S: State<K> + 'static,
        F: Fn() -> S + 'static,
    {
        self.factories
            .insert(key, Box::new(move || Box::new(factory()) as Box<dyn State<K>>));
        self
    }

    /// Whether a state is registered
    pub fn is_registered(&self, key: K) -> bool {
        self.factories.contains_key(&key)
    }

    /// Whether a state instance has been created
    pub fn is_instantiated(&self, key: K) -> bool {
        self.states.contains_key(&key)
    }

    /// Borrow a created state instance
    pub fn instance(&self, key: K) -> Option<&dyn State<K>> {
        self.states.get(&key).map(Box::as_ref)
    }

    /// The host world
    pub fn world(&self) -> &W {
        &self.world
    }

    /// The host world, mutably
    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// Machine config
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Machine config, mutably
    pub fn config_mut(&mut self) -> &mut MachineConfig {
        &mut self.config
    }

    /// Lifecycle status
    pub fn status(&self) -> MachineStatus<K> {
        self.status
    }

    /// The current state
    pub fn current(&self) -> Option<K> {
        match self.status {
            MachineStatus::Active(key) => Some(key),
            _ => None,
        }
    }

    /// Enter the initial state.
    ///
    /// A stopped machine may be started again; existing state instances are
    /// reused and their `on_state_added` does not run a second time.
    pub fn start(&mut self, initial: K) -> Result<(), MachineError<K>> {
        if let MachineStatus::Active(current) = self.status {
            return Err(MachineError::AlreadyStarted(current));
        }
        if !self.is_registered(initial) && !self.is_instantiated(initial) {
            return Err(MachineError::UnknownState(initial));
        }

        tracing::info!(state = ?initial, "Starting state machine");
        let pending = self.enter(initial)?;
        self.settle(pending)
    }

    /// Leave the current state and enter `target`.
    ///
    /// `exit` runs on the old state before anything happens to the new one.
    /// If `exit` fails the machine stays where it was; if entering fails the
    /// machine is stopped.
    pub fn request_transition(&mut self, target: K) -> Result<(), MachineError<K>> {
        let pending = self.transition(target)?;
        self.settle(pending)
    }

    /// Forward a frame update to the current state
    pub fn tick(&mut self) -> Result<(), MachineError<K>> {
        let current = self.current().ok_or(MachineError::NotStarted)?;
        let pending = self.call(current, |state, cx| state.update(cx))?;
        self.settle(pending)
    }

    /// Forward a fixed-step update to the current state
    pub fn fixed_tick(&mut self) -> Result<(), MachineError<K>> {
        let current = self.current().ok_or(MachineError::NotStarted)?;
        let pending = self.call(current, |state, cx| state.fixed_update(cx))?;
        self.settle(pending)
    }

    /// Forward an external event to the current state
    pub fn trigger(&mut self, signal: Signal) -> Result<(), MachineError<K>> {
        let current = self.current().ok_or(MachineError::NotStarted)?;
        tracing::debug!(state = ?current, ?signal, "Signal");
        let pending = self.call(current, |state, cx| state.on_signal(&signal, cx))?;
        self.settle(pending)
    }

    /// Force-exit the current state.
    ///
    /// The machine is stopped even when `exit` fails. Returns `false` when
    /// the machine was not active.
    pub fn stop(&mut self) -> Result<bool, MachineError<K>> {
        let Some(current) = self.current() else {
            return Ok(false);
        };
        let exited = self.call(current, |state, cx| state.exit(cx));
        self.status = MachineStatus::Stopped;
        tracing::info!(state = ?current, "State machine stopped");
        discard(current, exited?);
        Ok(true)
    }

    fn transition(&mut self, target: K) -> Result<Option<K>, MachineError<K>> {
        let current = self.current().ok_or(MachineError::NotStarted)?;
        if !self.is_registered(target) && !self.is_instantiated(target) {
            return Err(MachineError::UnknownState(target));
        }

        tracing::debug!(from = ?current, to = ?target, "State transition");
        let requested = self.call(current, |state, cx| state.exit(cx))?;
        discard(current, requested);
        self.enter(target)
    }

    fn enter(&mut self, target: K) -> Result<Option<K>, MachineError<K>> {
        let added = match self.instantiate(target) {
            Ok(pending) => pending,
            Err(err) => {
                self.status = MachineStatus::Stopped;
                return Err(err);
            }
        };
        match self.call(target, |state, cx| state.enter(cx)) {
            Ok(pending) => {
                self.status = MachineStatus::Active(target);
                Ok(pending.or(added))
            }
            Err(err) => {
                self.status = MachineStatus::Stopped;
                Err(err)
            }
        }
    }

    /// Create the state on first entry and run `on_state_added`
    fn instantiate(&mut self, key: K) -> Result<Option<K>, MachineError<K>> {
        if self.states.contains_key(&key) {
            return Ok(None);
        }
        let factory = self
            .factories
            .get(&key)
            .ok_or(MachineError::UnknownState(key))?;
        let mut state = factory();

        let current = self.current();
        let mut requested = None;
        let mut cx = StateContext::new(key, current, &mut self.world, &mut requested);
        state.on_state_added(&mut cx).map_err(|source| hook_failed(key, source))?;
        self.states.insert(key, state);
        tracing::debug!(state = ?key, "State added");
        Ok(requested)
    }

    /// Apply transitions requested by hooks until none is left
    fn settle(&mut self, mut pending: Option<K>) -> Result<(), MachineError<K>> {
        let mut chained = 0;
        while let Some(target) = pending {
            if chained == self.config.max_chained_transitions {
                return Err(MachineError::TransitionLoop {
                    state: target,
                    limit: self.config.max_chained_transitions,
                });
            }
            chained += 1;
            pending = self.transition(target)?;
        }
        Ok(())
    }

    fn call<F>(&mut self, key: K, hook: F) -> Result<Option<K>, MachineError<K>>
    where
        F: FnOnce(&mut Box<dyn State<K>>, &mut StateContext<'_, K>) -> Result<(), HookError>,
    {
        let current = self.current();
        let state = self
            .states
            .get_mut(&key)
            .ok_or(MachineError::UnknownState(key))?;
        let mut requested = None;
        let mut cx = StateContext::new(key, current, &mut self.world, &mut requested);
        hook(state, &mut cx).map_err(|source| hook_failed(key, source))?;
        Ok(requested)
    }
}

fn hook_failed<K: fmt::Debug>(state: K, source: HookError) -> MachineError<K> {
    tracing::error!(?state, error = %source, "State hook failed");
    MachineError::Hook { state, source }
}

fn discard<K: fmt::Debug>(state: K, requested: Option<K>) {
    if let Some(target) = requested {
        tracing::warn!(?state, ?target, "Transition requested while exiting was ignored");
    }
}

/// Misuse of the state machine, or a failing state hook
#[derive(Debug, thiserror::Error)]
pub enum MachineError<K> {
    /// `start` on a running machine
    #[error("State machine already started in {0:?}")]
    AlreadyStarted(K),

    /// The machine has no current state
    #[error("State machine not started")]
    NotStarted,

    /// No state registered under this key
    #[error("Unknown state {0:?}")]
    UnknownState(K),

    /// States kept requesting transitions
    #[error("More than {limit} chained transitions, last towards {state:?}")]
    TransitionLoop {
        /// State the machine was about to enter
        state: K,
        /// Configured chain limit
        limit: usize,
    },

    /// A state hook failed
    #[error("State {state:?} failed: {source}")]
    Hook {
        /// State whose hook failed
        state: K,
        /// Hook failure
        source: HookError,
    },
}
