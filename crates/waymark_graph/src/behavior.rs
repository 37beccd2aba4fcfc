// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node lifecycle hooks and the stock behaviors.
//!
//! Every visit runs `handle` exactly once, then `post_handle` exactly once
//! before the engine follows the next connection. A node that starts
//! something external in `handle` (a fade, a dialogue line) can ask the engine
//! to wait, and finalize in `post_handle` once the host resumes it.

use crate::node::NodeId;
use crate::port::{FALSE, TRUE};
use serde::{Deserialize, Serialize};
use std::fmt;
use waymark_core::{
    apply_all, Condition, Effect, EffectSink, EffectTicket, GameState, HookError,
    StateAccessError, World,
};

/// Why a traversal is paused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suspension {
    /// Waiting for an explicit continue signal (dialogue advance, skip button)
    Signal,
    /// Waiting for the host to report an effect as finished
    Effect(EffectTicket),
}

/// What the engine does after `handle`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Run `post_handle` right away
    Continue,
    /// Return control to the caller until resumed
    Wait(Suspension),
}

/// World access handed to node hooks
pub struct NodeContext<'a> {
    node: NodeId,
    world: &'a mut dyn World,
}

impl<'a> NodeContext<'a> {
    /// Create a context for one hook call
    pub fn new(node: NodeId, world: &'a mut dyn World) -> Self {
        Self { node, world }
    }

    /// The node being visited
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Read-only game state
    pub fn state(&self) -> &dyn GameState {
        self.world.state()
    }

    /// Effect sink
    pub fn effects(&mut self) -> &mut dyn EffectSink {
        self.world.effects()
    }
}

/// Behavior of a node during a traversal visit
pub trait NodeBehavior: fmt::Debug {
    /// First phase of a visit
    fn handle(&mut self, cx: &mut NodeContext<'_>) -> Result<Step, HookError>;

    /// Second phase of a visit, after `handle` (and after any wait)
    fn post_handle(&mut self, _cx: &mut NodeContext<'_>) -> Result<(), HookError> {
        Ok(())
    }
}

/// What an action node waits for after firing its effects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum WaitFor {
    /// Continue immediately
    #[default]
    Nothing,
    /// Wait for a continue signal
    Advance,
    /// Start a named transition effect and wait for it to finish
    Transition(String),
}

/// Fires effects, optionally waits, then runs cleanup effects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionNode {
    /// Effects applied in `handle`
    pub effects: Vec<Effect>,
    /// Effects applied in `post_handle`
    pub cleanup: Vec<Effect>,
    /// Suspension point between the two
    pub wait: WaitFor,
    #[serde(skip)]
    pending: Option<EffectTicket>,
}

impl ActionNode {
    /// Create an action that fires the given effects
    pub fn new(effects: Vec<Effect>) -> Self {
        Self {
            effects,
            ..Self::default()
        }
    }

    /// A dialogue line that waits for the player to advance
    pub fn line(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(vec![Effect::Line {
            speaker: speaker.into(),
            text: text.into(),
        }])
        .waiting(WaitFor::Advance)
    }

    /// A transition effect (fade, wipe) the traversal waits on
    pub fn transition(name: impl Into<String>) -> Self {
        Self::default().waiting(WaitFor::Transition(name.into()))
    }

    /// Set what the action waits for
    pub fn waiting(mut self, wait: WaitFor) -> Self {
        self.wait = wait;
        self
    }

    /// Set the cleanup effects
    pub fn with_cleanup(mut self, cleanup: Vec<Effect>) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Ticket of the transition this action is waiting on, if any
    pub fn pending(&self) -> Option<EffectTicket> {
        self.pending
    }
}

impl NodeBehavior for ActionNode {
    fn handle(&mut self, cx: &mut NodeContext<'_>) -> Result<Step, HookError> {
        apply_all(&self.effects, cx.effects());
        match &self.wait {
            WaitFor::Nothing => Ok(Step::Continue),
            WaitFor::Advance => Ok(Step::Wait(Suspension::Signal)),
            WaitFor::Transition(name) => {
                let ticket = cx.effects().start_transition_effect(name);
                self.pending = Some(ticket);
                Ok(Step::Wait(Suspension::Effect(ticket)))
            }
        }
    }

    fn post_handle(&mut self, cx: &mut NodeContext<'_>) -> Result<(), HookError> {
        if let Some(ticket) = self.pending.take() {
            tracing::trace!(%ticket, "Transition settled");
        }
        apply_all(&self.cleanup, cx.effects());
        Ok(())
    }
}

/// Chooses between the `true` and `false` outputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionNode {
    /// Branch condition
    pub condition: Condition,
}

impl DecisionNode {
    /// Create a decision on a condition
    pub fn new(condition: Condition) -> Self {
        Self { condition }
    }

    /// Name of the output port to follow
    pub fn choose(&self, state: &dyn GameState) -> Result<&'static str, StateAccessError> {
        Ok(if self.condition.evaluate(state)? {
            TRUE
        } else {
            FALSE
        })
    }
}

impl NodeBehavior for DecisionNode {
    fn handle(&mut self, _cx: &mut NodeContext<'_>) -> Result<Step, HookError> {
        Ok(Step::Continue)
    }
}
