// SPDX-License-Identifier: MIT OR Apache-2.0
//! Data-driven effects.
//!
//! Assets cannot carry code, so nodes describe their side effects as a list of
//! [`Effect`] values that are replayed against an [`EffectSink`].

use crate::context::EffectSink;
use serde::{Deserialize, Serialize};

/// A single fire-and-forget call into the effect sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// Allow the player to move
    EnableMovement,
    /// Freeze player movement
    DisableMovement,
    /// Allow jumping
    EnableJump,
    /// Forbid jumping
    DisableJump,
    /// Set the character velocity
    SetVelocity {
        /// Horizontal component
        x: f32,
        /// Vertical component
        y: f32,
    },
    /// Present a line of dialogue
    Line {
        /// Who speaks
        speaker: String,
        /// What is said
        text: String,
    },
    /// Run a host-defined scripted action
    Script(String),
}

impl Effect {
    /// Replay this effect against a sink
    pub fn apply(&self, sink: &mut dyn EffectSink) {
        match self {
            Self::EnableMovement => sink.enable_movement(),
            Self::DisableMovement => sink.disable_movement(),
            Self::EnableJump => sink.enable_jump(),
            Self::DisableJump => sink.disable_jump(),
            Self::SetVelocity { x, y } => sink.set_velocity(*x, *y),
            Self::Line { speaker, text } => sink.present_line(speaker, text),
            Self::Script(id) => sink.invoke_scripted_action(id),
        }
    }

    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::EnableMovement => "enable_movement",
            Self::DisableMovement => "disable_movement",
            Self::EnableJump => "enable_jump",
            Self::DisableJump => "disable_jump",
            Self::SetVelocity { .. } => "set_velocity",
            Self::Line { .. } => "line",
            Self::Script(_) => "script",
        }
    }
}

/// Replay every effect in order
pub fn apply_all(effects: &[Effect], sink: &mut dyn EffectSink) {
    for effect in effects {
        effect.apply(sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EffectTicket;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl EffectSink for Recorder {
        fn enable_movement(&mut self) {
            self.calls.push("enable_movement".into());
        }
        fn disable_movement(&mut self) {
            self.calls.push("disable_movement".into());
        }
        fn enable_jump(&mut self) {
            self.calls.push("enable_jump".into());
        }
        fn disable_jump(&mut self) {
            self.calls.push("disable_jump".into());
        }
        fn set_velocity(&mut self, x: f32, y: f32) {
            self.calls.push(format!("velocity {x} {y}"));
        }
        fn start_transition_effect(&mut self, name: &str) -> EffectTicket {
            self.calls.push(format!("transition {name}"));
            EffectTicket(0)
        }
        fn present_line(&mut self, speaker: &str, text: &str) {
            self.calls.push(format!("{speaker}: {text}"));
        }
        fn invoke_scripted_action(&mut self, id: &str) {
            self.calls.push(format!("script {id}"));
        }
    }

    #[test]
    fn test_apply_all_keeps_order() {
        let mut sink = Recorder::default();
        apply_all(
            &[
                Effect::DisableMovement,
                Effect::Line {
                    speaker: "Elder".into(),
                    text: "Stay a while.".into(),
                },
                Effect::SetVelocity { x: 1.5, y: 0.0 },
                Effect::Script("open_gate".into()),
            ],
            &mut sink,
        );
        assert_eq!(
            sink.calls,
            vec![
                "disable_movement",
                "Elder: Stay a while.",
                "velocity 1.5 0",
                "script open_gate",
            ]
        );
    }

    #[test]
    fn test_effect_ron_format() {
        let effect: Effect = ron::from_str("SetVelocity(x: 10.0, y: 15.0)").unwrap();
        assert_eq!(effect, Effect::SetVelocity { x: 10.0, y: 15.0 });
        assert_eq!(effect.label(), "set_velocity");
    }
}
