// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory world for tooling and tests.
//!
//! [`SandboxWorld`] answers state queries from plain maps and records every
//! effect it receives. [`SharedWorld`] wraps it behind a lock so a graph
//! engine and a state machine can drive the same world.

use crate::context::{EffectSink, EffectTicket, GameState, WallSide};
use crate::error::StateAccessError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// An effect call captured by the sandbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectRecord {
    /// `enable_movement`
    EnableMovement,
    /// `disable_movement`
    DisableMovement,
    /// `enable_jump`
    EnableJump,
    /// `disable_jump`
    DisableJump,
    /// `set_velocity`
    SetVelocity(f32, f32),
    /// `start_transition_effect`
    Transition(String, EffectTicket),
    /// `present_line`
    Line(String, String),
    /// `invoke_scripted_action`
    Script(String),
}

/// Plain-data world state with an effect log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxWorld {
    /// Remaining health by target
    pub health: BTreeMap<String, f32>,
    /// Currency totals by kind
    pub currencies: BTreeMap<String, f32>,
    /// Flags that are set
    pub flags: BTreeSet<String>,
    /// Input actions currently held
    pub inputs: BTreeSet<String>,
    /// Walls currently touched
    pub walls: BTreeSet<WallSide>,
    /// Whether the character stands on ground
    pub grounded: bool,
    /// Whether movement is enabled
    pub movement_enabled: bool,
    /// Whether jumping is enabled
    pub jump_enabled: bool,
    /// Last velocity set
    pub velocity: (f32, f32),
    #[serde(skip)]
    log: Vec<EffectRecord>,
    #[serde(skip)]
    next_ticket: u64,
}

impl SandboxWorld {
    /// Create an empty grounded world with movement and jumping enabled
    pub fn new() -> Self {
        Self {
            health: BTreeMap::new(),
            currencies: BTreeMap::new(),
            flags: BTreeSet::new(),
            inputs: BTreeSet::new(),
            walls: BTreeSet::new(),
            grounded: true,
            movement_enabled: true,
            jump_enabled: true,
            velocity: (0.0, 0.0),
            log: Vec::new(),
            next_ticket: 0,
        }
    }

    /// Set a target's health
    pub fn with_health(mut self, target: impl Into<String>, value: f32) -> Self {
        self.health.insert(target.into(), value);
        self
    }

    /// Set a currency total
    pub fn with_currency(mut self, kind: impl Into<String>, value: f32) -> Self {
        self.currencies.insert(kind.into(), value);
        self
    }

    /// Set a flag
    pub fn with_flag(mut self, name: impl Into<String>) -> Self {
        self.flags.insert(name.into());
        self
    }

    /// Touch a wall
    pub fn with_wall(mut self, side: WallSide) -> Self {
        self.walls.insert(side);
        self
    }

    /// Hold or release an input action
    pub fn set_input(&mut self, action: &str, held: bool) {
        if held {
            self.inputs.insert(action.to_string());
        } else {
            self.inputs.remove(action);
        }
    }

    /// Touch or leave a wall
    pub fn set_wall(&mut self, side: WallSide, touching: bool) {
        if touching {
            self.walls.insert(side);
        } else {
            self.walls.remove(&side);
        }
    }

    /// Effects recorded so far
    pub fn log(&self) -> &[EffectRecord] {
        &self.log
    }

    /// Drain the effect log
    pub fn take_log(&mut self) -> Vec<EffectRecord> {
        std::mem::take(&mut self.log)
    }
}

impl Default for SandboxWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState for SandboxWorld {
    fn remaining_health(&self, target: &str) -> Result<f32, StateAccessError> {
        self.health
            .get(target)
            .copied()
            .ok_or_else(|| StateAccessError::UnknownTarget(target.to_string()))
    }

    fn is_touching_wall(&self, side: WallSide) -> Result<bool, StateAccessError> {
        Ok(self.walls.contains(&side))
    }

    fn currency_total(&self, kind: &str) -> Result<f32, StateAccessError> {
        Ok(self.currencies.get(kind).copied().unwrap_or(0.0))
    }

    fn has_flag(&self, name: &str) -> Result<bool, StateAccessError> {
        Ok(self.flags.contains(name))
    }

    fn is_input_active(&self, action: &str) -> Result<bool, StateAccessError> {
        Ok(self.inputs.contains(action))
    }

    fn is_grounded(&self) -> Result<bool, StateAccessError> {
        Ok(self.grounded)
    }
}

impl EffectSink for SandboxWorld {
    fn enable_movement(&mut self) {
        self.movement_enabled = true;
        self.log.push(EffectRecord::EnableMovement);
    }

    fn disable_movement(&mut self) {
        self.movement_enabled = false;
        self.log.push(EffectRecord::DisableMovement);
    }

    fn enable_jump(&mut self) {
        self.jump_enabled = true;
        self.log.push(EffectRecord::EnableJump);
    }

    fn disable_jump(&mut self) {
        self.jump_enabled = false;
        self.log.push(EffectRecord::DisableJump);
    }

    fn set_velocity(&mut self, x: f32, y: f32) {
        self.velocity = (x, y);
        self.log.push(EffectRecord::SetVelocity(x, y));
    }

    fn start_transition_effect(&mut self, name: &str) -> EffectTicket {
        self.next_ticket += 1;
        let ticket = EffectTicket(self.next_ticket);
        self.log.push(EffectRecord::Transition(name.to_string(), ticket));
        ticket
    }

    fn present_line(&mut self, speaker: &str, text: &str) {
        self.log
            .push(EffectRecord::Line(speaker.to_string(), text.to_string()));
    }

    fn invoke_scripted_action(&mut self, id: &str) {
        self.log.push(EffectRecord::Script(id.to_string()));
    }
}

/// Cloneable handle to a [`SandboxWorld`] behind a lock
#[derive(Debug, Clone, Default)]
pub struct SharedWorld(Arc<Mutex<SandboxWorld>>);

impl SharedWorld {
    /// Wrap a world
    pub fn new(world: SandboxWorld) -> Self {
        Self(Arc::new(Mutex::new(world)))
    }

    /// Run a closure with exclusive access to the world
    pub fn with<R>(&self, f: impl FnOnce(&mut SandboxWorld) -> R) -> R {
        f(&mut self.0.lock())
    }
}

impl GameState for SharedWorld {
    fn remaining_health(&self, target: &str) -> Result<f32, StateAccessError> {
        self.0.lock().remaining_health(target)
    }

    fn is_touching_wall(&self, side: WallSide) -> Result<bool, StateAccessError> {
        self.0.lock().is_touching_wall(side)
    }

    fn currency_total(&self, kind: &str) -> Result<f32, StateAccessError> {
        self.0.lock().currency_total(kind)
    }

    fn has_flag(&self, name: &str) -> Result<bool, StateAccessError> {
        self.0.lock().has_flag(name)
    }

    fn is_input_active(&self, action: &str) -> Result<bool, StateAccessError> {
        self.0.lock().is_input_active(action)
    }

    fn is_grounded(&self) -> Result<bool, StateAccessError> {
        self.0.lock().is_grounded()
    }
}

impl EffectSink for SharedWorld {
    fn enable_movement(&mut self) {
        self.0.lock().enable_movement();
    }

    fn disable_movement(&mut self) {
        self.0.lock().disable_movement();
    }

    fn enable_jump(&mut self) {
        self.0.lock().enable_jump();
    }

    fn disable_jump(&mut self) {
        self.0.lock().disable_jump();
    }

    fn set_velocity(&mut self, x: f32, y: f32) {
        self.0.lock().set_velocity(x, y);
    }

    fn start_transition_effect(&mut self, name: &str) -> EffectTicket {
        self.0.lock().start_transition_effect(name)
    }

    fn present_line(&mut self, speaker: &str, text: &str) {
        self.0.lock().present_line(speaker, text);
    }

    fn invoke_scripted_action(&mut self, id: &str) {
        self.0.lock().invoke_scripted_action(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Compare, Condition};

    #[test]
    fn test_tickets_are_unique() {
        let mut world = SandboxWorld::new();
        let a = world.start_transition_effect("fade_out");
        let b = world.start_transition_effect("fade_in");
        assert_ne!(a, b);
        assert_eq!(world.log().len(), 2);
    }

    #[test]
    fn test_shared_handles_see_same_world() {
        let world = SharedWorld::new(SandboxWorld::new().with_health("warden", 80.0));
        let mut writer = world.clone();
        writer.disable_movement();
        writer.set_velocity(2.0, 0.0);

        world.with(|w| {
            assert!(!w.movement_enabled);
            assert_eq!(w.velocity, (2.0, 0.0));
            w.health.insert("warden".into(), 30.0);
        });
        assert!(Condition::health("warden", Compare::Less, 50.0)
            .evaluate(&writer)
            .unwrap());
    }

    #[test]
    fn test_ron_world_description() {
        let world: SandboxWorld = ron::from_str(
            r#"(health: {"warden": 40.0}, flags: ["claws"], walls: [Left], grounded: true)"#,
        )
        .unwrap();
        assert_eq!(world.remaining_health("warden").unwrap(), 40.0);
        assert!(world.has_flag("claws").unwrap());
        assert!(world.is_touching_wall(WallSide::Left).unwrap());
        assert_eq!(world.currency_total("gold").unwrap(), 0.0);
        assert!(world.log().is_empty());
    }
}
