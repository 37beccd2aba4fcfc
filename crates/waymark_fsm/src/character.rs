// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stock platformer character states.
//!
//! Each state owns its guards as [`Condition`]s built from a
//! [`MovementProfile`] and picks its own successor.

use crate::machine::StateMachine;
use crate::state::{Signal, State, StateContext};
use serde::{Deserialize, Serialize};
use waymark_core::{Condition, HookError, WallSide, World};

/// Keys of the stock character states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterState {
    /// Standing still
    Idle,
    /// Moving on the ground
    Run,
    /// Airborne after a jump or wall jump
    Jump,
    /// Sliding down a wall
    WallSlide,
    /// Frozen while a dialogue runs
    DialogueLock,
}

/// Movement tuning shared by the stock states
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementProfile {
    /// Horizontal speed while running
    pub run_speed: f32,
    /// Vertical speed of a ground jump
    pub jump_velocity: f32,
    /// Velocity of a wall jump off a wall on the left; mirrored for the right
    pub wall_jump_velocity: (f32, f32),
    /// Downward speed while sliding on a wall
    pub wall_slide_speed: f32,
    /// Input action that jumps
    pub jump_action: String,
    /// Input action that moves
    pub move_action: String,
}

impl Default for MovementProfile {
    fn default() -> Self {
        Self {
            run_speed: 6.0,
            jump_velocity: 12.0,
            wall_jump_velocity: (10.0, 15.0),
            wall_slide_speed: 2.0,
            jump_action: "jump".to_string(),
            move_action: "move".to_string(),
        }
    }
}

impl MovementProfile {
    fn wants_jump(&self) -> Condition {
        Condition::Input(self.jump_action.clone())
    }

    fn wants_move(&self) -> Condition {
        Condition::Input(self.move_action.clone())
    }
}

/// Create a machine with all stock character states registered
pub fn character_machine<W: World>(
    world: W,
    profile: &MovementProfile,
) -> StateMachine<CharacterState, W> {
    let mut machine = StateMachine::new(world);
    let p = profile.clone();
    machine.register(CharacterState::Idle, move || Idle::new(&p));
    let p = profile.clone();
    machine.register(CharacterState::Run, move || Run::new(&p));
    let p = profile.clone();
    machine.register(CharacterState::Jump, move || Jump::new(&p));
    let p = profile.clone();
    machine.register(CharacterState::WallSlide, move || WallSlide::new(&p));
    machine.register(CharacterState::DialogueLock, || DialogueLock);
    machine
}

/// Follow the first guard that holds
fn pick(
    cx: &mut StateContext<'_, CharacterState>,
    guards: &[(Condition, CharacterState)],
) -> Result<(), HookError> {
    for (guard, target) in guards {
        if guard.evaluate(cx.state())? {
            cx.request_transition(*target);
            break;
        }
    }
    Ok(())
}

fn lock_on_dialogue(signal: &Signal, cx: &mut StateContext<'_, CharacterState>) {
    if *signal == Signal::DialogueStarted {
        cx.request_transition(CharacterState::DialogueLock);
    }
}

/// Standing still on the ground
#[derive(Debug)]
pub struct Idle {
    guards: Vec<(Condition, CharacterState)>,
}

impl Idle {
    /// Create the state
    pub fn new(profile: &MovementProfile) -> Self {
        Self {
            guards: vec![
                (
                    profile.wants_jump().and(Condition::Grounded),
                    CharacterState::Jump,
                ),
                (profile.wants_move(), CharacterState::Run),
            ],
        }
    }
}

impl State<CharacterState> for Idle {
    fn enter(&mut self, cx: &mut StateContext<'_, CharacterState>) -> Result<(), HookError> {
        cx.effects().set_velocity(0.0, 0.0);
        Ok(())
    }

    fn update(&mut self, cx: &mut StateContext<'_, CharacterState>) -> Result<(), HookError> {
        pick(cx, &self.guards)
    }

    fn on_signal(
        &mut self,
        signal: &Signal,
        cx: &mut StateContext<'_, CharacterState>,
    ) -> Result<(), HookError> {
        lock_on_dialogue(signal, cx);
        Ok(())
    }
}

/// Moving on the ground
#[derive(Debug)]
pub struct Run {
    speed: f32,
    guards: Vec<(Condition, CharacterState)>,
}

impl Run {
    /// Create the state
    pub fn new(profile: &MovementProfile) -> Self {
        Self {
            speed: profile.run_speed,
            guards: vec![
                (
                    profile.wants_jump().and(Condition::Grounded),
                    CharacterState::Jump,
                ),
                (!profile.wants_move(), CharacterState::Idle),
            ],
        }
    }
}

impl State<CharacterState> for Run {
    fn update(&mut self, cx: &mut StateContext<'_, CharacterState>) -> Result<(), HookError> {
        pick(cx, &self.guards)
    }

    fn fixed_update(&mut self, cx: &mut StateContext<'_, CharacterState>) -> Result<(), HookError> {
        cx.effects().set_velocity(self.speed, 0.0);
        Ok(())
    }

    fn on_signal(
        &mut self,
        signal: &Signal,
        cx: &mut StateContext<'_, CharacterState>,
    ) -> Result<(), HookError> {
        lock_on_dialogue(signal, cx);
        Ok(())
    }
}

/// Airborne. Entering next to a wall performs a wall jump.
#[derive(Debug)]
pub struct Jump {
    jump_velocity: f32,
    wall_jump_velocity: (f32, f32),
    move_guard: Condition,
    /// Wall pushed off on the current visit
    pushed_off: Option<WallSide>,
}

impl Jump {
    /// Create the state
    pub fn new(profile: &MovementProfile) -> Self {
        Self {
            jump_velocity: profile.jump_velocity,
            wall_jump_velocity: profile.wall_jump_velocity,
            move_guard: profile.wants_move(),
            pushed_off: None,
        }
    }

    /// Wall this visit pushed off, if it was a wall jump
    pub fn pushed_off(&self) -> Option<WallSide> {
        self.pushed_off
    }
}

impl State<CharacterState> for Jump {
    fn enter(&mut self, cx: &mut StateContext<'_, CharacterState>) -> Result<(), HookError> {
        self.pushed_off = None;
        for side in [WallSide::Left, WallSide::Right] {
            if cx.state().is_touching_wall(side)? {
                self.pushed_off = Some(side);
                break;
            }
        }

        let (x, y) = match self.pushed_off {
            Some(side) => (
                self.wall_jump_velocity.0 * side.away(),
                self.wall_jump_velocity.1,
            ),
            None => (0.0, self.jump_velocity),
        };
        cx.effects().set_velocity(x, y);
        Ok(())
    }

    fn on_signal(
        &mut self,
        signal: &Signal,
        cx: &mut StateContext<'_, CharacterState>,
    ) -> Result<(), HookError> {
        match signal {
            Signal::Landed => {
                let target = if self.move_guard.evaluate(cx.state())? {
                    CharacterState::Run
                } else {
                    CharacterState::Idle
                };
                cx.request_transition(target);
            }
            Signal::WallContact(side) if self.pushed_off != Some(*side) => {
                if !cx.state().is_grounded()? {
                    cx.request_transition(CharacterState::WallSlide);
                }
            }
            other => lock_on_dialogue(other, cx),
        }
        Ok(())
    }
}

/// Sliding down a wall
#[derive(Debug)]
pub struct WallSlide {
    slide_speed: f32,
    guards: Vec<(Condition, CharacterState)>,
}

impl WallSlide {
    /// Create the state
    pub fn new(profile: &MovementProfile) -> Self {
        Self {
            slide_speed: profile.wall_slide_speed,
            guards: vec![
                (
                    profile.wants_jump().and(Condition::TouchingAnyWall),
                    CharacterState::Jump,
                ),
                (Condition::Grounded, CharacterState::Idle),
                (!Condition::TouchingAnyWall, CharacterState::Jump),
            ],
        }
    }
}

impl State<CharacterState> for WallSlide {
    fn enter(&mut self, cx: &mut StateContext<'_, CharacterState>) -> Result<(), HookError> {
        cx.effects().set_velocity(0.0, -self.slide_speed);
        Ok(())
    }

    fn update(&mut self, cx: &mut StateContext<'_, CharacterState>) -> Result<(), HookError> {
        pick(cx, &self.guards)
    }

    fn on_signal(
        &mut self,
        signal: &Signal,
        cx: &mut StateContext<'_, CharacterState>,
    ) -> Result<(), HookError> {
        match signal {
            Signal::Landed => cx.request_transition(CharacterState::Idle),
            other => lock_on_dialogue(other, cx),
        }
        Ok(())
    }
}

/// Movement and jumping are disabled until the dialogue ends
#[derive(Debug)]
pub struct DialogueLock;

impl State<CharacterState> for DialogueLock {
    fn enter(&mut self, cx: &mut StateContext<'_, CharacterState>) -> Result<(), HookError> {
        let effects = cx.effects();
        effects.disable_movement();
        effects.disable_jump();
        effects.set_velocity(0.0, 0.0);
        Ok(())
    }

    fn exit(&mut self, cx: &mut StateContext<'_, CharacterState>) -> Result<(), HookError> {
        let effects = cx.effects();
        effects.enable_movement();
        effects.enable_jump();
        Ok(())
    }

    fn on_signal(
        &mut self,
        signal: &Signal,
        cx: &mut StateContext<'_, CharacterState>,
    ) -> Result<(), HookError> {
        if *signal == Signal::DialogueEnded {
            cx.request_transition(CharacterState::Idle);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::MachineError;
    use waymark_core::{
        EffectRecord, EffectSink, EffectTicket, GameState, SandboxWorld, SharedWorld,
        StateAccessError,
    };

    fn machine(world: SandboxWorld) -> StateMachine<CharacterState, SandboxWorld> {
        character_machine(world, &MovementProfile::default())
    }

    #[test]
    fn test_wall_jump_velocity_on_enter() {
        let mut fsm = machine(SandboxWorld::new().with_wall(WallSide::Left));
        fsm.start(CharacterState::Idle).unwrap();
        fsm.world_mut().take_log();

        fsm.request_transition(CharacterState::Jump).unwrap();
        assert_eq!(fsm.current(), Some(CharacterState::Jump));
        assert_eq!(fsm.world().log(), &[EffectRecord::SetVelocity(10.0, 15.0)]);
    }

    #[test]
    fn test_wall_jump_mirrors_on_right_wall() {
        let mut fsm = machine(SandboxWorld::new().with_wall(WallSide::Right));
        fsm.start(CharacterState::Idle).unwrap();
        fsm.request_transition(CharacterState::Jump).unwrap();
        assert_eq!(fsm.world().velocity, (-10.0, 15.0));
    }

    #[test]
    fn test_ground_jump() {
        let mut fsm = machine(SandboxWorld::new());
        fsm.start(CharacterState::Idle).unwrap();
        fsm.world_mut().set_input("jump", true);
        fsm.tick().unwrap();
        assert_eq!(fsm.current(), Some(CharacterState::Jump));
        assert_eq!(fsm.world().velocity, (0.0, 12.0));
    }

    #[test]
    fn test_run_and_stop() {
        let mut fsm = machine(SandboxWorld::new());
        fsm.start(CharacterState::Idle).unwrap();
        fsm.world_mut().set_input("move", true);
        fsm.tick().unwrap();
        assert_eq!(fsm.current(), Some(CharacterState::Run));

        fsm.fixed_tick().unwrap();
        assert_eq!(fsm.world().velocity, (6.0, 0.0));

        fsm.world_mut().set_input("move", false);
        fsm.tick().unwrap();
        assert_eq!(fsm.current(), Some(CharacterState::Idle));
        assert_eq!(fsm.world().velocity, (0.0, 0.0));
    }

    #[test]
    fn test_land_while_moving_runs() {
        let mut fsm = machine(SandboxWorld::new());
        fsm.start(CharacterState::Jump).unwrap();
        fsm.world_mut().set_input("move", true);
        fsm.trigger(Signal::Landed).unwrap();
        assert_eq!(fsm.current(), Some(CharacterState::Run));
    }

    #[test]
    fn test_wall_slide_and_wall_jump() {
        let mut fsm = machine(SandboxWorld::new());
        fsm.start(CharacterState::Jump).unwrap();
        fsm.world_mut().grounded = false;
        fsm.world_mut().set_wall(WallSide::Right, true);
        fsm.trigger(Signal::WallContact(WallSide::Right)).unwrap();
        assert_eq!(fsm.current(), Some(CharacterState::WallSlide));
        assert_eq!(fsm.world().velocity, (0.0, -2.0));

        fsm.world_mut().set_input("jump", true);
        fsm.tick().unwrap();
        assert_eq!(fsm.current(), Some(CharacterState::Jump));
        assert_eq!(fsm.world().velocity, (-10.0, 15.0));

        // Contact with the wall just pushed off does not slide again
        fsm.trigger(Signal::WallContact(WallSide::Right)).unwrap();
        assert_eq!(fsm.current(), Some(CharacterState::Jump));
    }

    #[test]
    fn test_dialogue_lock_round_trip() {
        let world = SharedWorld::default();
        let mut fsm = character_machine(world.clone(), &MovementProfile::default());
        fsm.start(CharacterState::Run).unwrap();

        fsm.trigger(Signal::DialogueStarted).unwrap();
        assert_eq!(fsm.current(), Some(CharacterState::DialogueLock));
        world.with(|w| {
            assert!(!w.movement_enabled);
            assert!(!w.jump_enabled);
        });

        // Input is ignored while locked
        world.with(|w| w.set_input("jump", true));
        fsm.tick().unwrap();
        assert_eq!(fsm.current(), Some(CharacterState::DialogueLock));

        fsm.trigger(Signal::DialogueEnded).unwrap();
        world.with(|w| {
            assert!(w.movement_enabled);
            assert!(w.jump_enabled);
        });
        // Idle sees the held jump on the next frame
        assert_eq!(fsm.current(), Some(CharacterState::Idle));
        fsm.tick().unwrap();
        assert_eq!(fsm.current(), Some(CharacterState::Jump));
    }

    #[test]
    fn test_dialogue_locks_airborne_character() {
        let mut fsm = machine(SandboxWorld::new());
        fsm.start(CharacterState::Jump).unwrap();
        fsm.world_mut().grounded = false;

        fsm.trigger(Signal::DialogueStarted).unwrap();
        assert_eq!(fsm.current(), Some(CharacterState::DialogueLock));
        assert!(!fsm.world().movement_enabled);
        assert!(!fsm.world().jump_enabled);
        assert_eq!(fsm.world().velocity, (0.0, 0.0));

        fsm.trigger(Signal::DialogueEnded).unwrap();
        assert_eq!(fsm.current(), Some(CharacterState::Idle));
        assert!(fsm.world().movement_enabled);
    }

    #[derive(Debug)]
    struct Blind;

    impl GameState for Blind {
        fn remaining_health(&self, target: &str) -> Result<f32, StateAccessError> {
            Err(StateAccessError::Unavailable(target.into()))
        }
        fn is_touching_wall(&self, _side: WallSide) -> Result<bool, StateAccessError> {
            Err(StateAccessError::Unavailable("walls".into()))
        }
        fn currency_total(&self, _kind: &str) -> Result<f32, StateAccessError> {
            Ok(0.0)
        }
        fn has_flag(&self, _name: &str) -> Result<bool, StateAccessError> {
            Ok(false)
        }
        fn is_input_active(&self, _action: &str) -> Result<bool, StateAccessError> {
            Ok(false)
        }
        fn is_grounded(&self) -> Result<bool, StateAccessError> {
            Ok(true)
        }
    }

    impl EffectSink for Blind {
        fn enable_movement(&mut self) {}
        fn disable_movement(&mut self) {}
        fn enable_jump(&mut self) {}
        fn disable_jump(&mut self) {}
        fn set_velocity(&mut self, _x: f32, _y: f32) {}
        fn start_transition_effect(&mut self, _name: &str) -> EffectTicket {
            EffectTicket(0)
        }
        fn present_line(&mut self, _speaker: &str, _text: &str) {}
        fn invoke_scripted_action(&mut self, _id: &str) {}
    }

    #[test]
    fn test_state_access_failure_surfaces() {
        let mut fsm = character_machine(Blind, &MovementProfile::default());
        fsm.start(CharacterState::Idle).unwrap();
        let err = fsm.request_transition(CharacterState::Jump).unwrap_err();
        assert!(matches!(
            err,
            MachineError::Hook {
                state: CharacterState::Jump,
                source: HookError::StateAccess(_),
            }
        ));
    }

    #[test]
    fn test_profile_from_ron() {
        let profile: MovementProfile =
            ron::from_str("(run_speed: 8.0, wall_jump_velocity: (9.0, 14.0))").unwrap();
        assert_eq!(profile.run_speed, 8.0);
        assert_eq!(profile.wall_jump_velocity, (9.0, 14.0));
        assert_eq!(profile.jump_action, "jump");
    }
}
