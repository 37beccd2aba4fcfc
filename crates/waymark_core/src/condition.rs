// SPDX-License-Identifier: MIT OR Apache-2.0
//! Boolean predicates over external game state.
//!
//! Conditions gate decision nodes in graphs and guard transitions in state
//! machines. They hold configuration only, so evaluating one any number of
//! times has no side effects. Composite conditions are built by nesting
//! [`Condition::All`], [`Condition::Any`] and [`Condition::Not`].

use crate::context::{GameState, WallSide};
use crate::error::StateAccessError;
use serde::{Deserialize, Serialize};

/// Numeric comparison used by threshold conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compare {
    /// `value < threshold`
    Less,
    /// `value <= threshold`
    LessOrEqual,
    /// `value > threshold`
    Greater,
    /// `value >= threshold`
    GreaterOrEqual,
    /// `|value - threshold| <= f32::EPSILON`
    Equal,
}

impl Compare {
    /// Apply the comparison
    pub fn test(&self, value: f32, threshold: f32) -> bool {
        match self {
            Self::Less => value < threshold,
            Self::LessOrEqual => value <= threshold,
            Self::Greater => value > threshold,
            Self::GreaterOrEqual => value >= threshold,
            Self::Equal => (value - threshold).abs() <= f32::EPSILON,
        }
    }
}

/// A pure predicate over [`GameState`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// Always true
    Always,
    /// Always false
    Never,
    /// A named ability or progress flag is set
    Flag(String),
    /// A named input action is held
    Input(String),
    /// The character stands on ground
    Grounded,
    /// The character touches a wall on the given side
    TouchingWall(WallSide),
    /// The character touches a wall on either side
    TouchingAnyWall,
    /// Remaining health of a target compared against a threshold
    Health {
        /// Target whose health is read
        target: String,
        /// Comparison operator
        compare: Compare,
        /// Threshold
        value: f32,
    },
    /// Currency total compared against a threshold
    Currency {
        /// Currency kind
        kind: String,
        /// Comparison operator
        compare: Compare,
        /// Threshold
        value: f32,
    },
    /// Negation
    Not(Box<Condition>),
    /// Every child holds (true when empty)
    All(Vec<Condition>),
    /// At least one child holds (false when empty)
    Any(Vec<Condition>),
}

impl Condition {
    /// Evaluate against the current game state.
    ///
    /// Composites short-circuit left to right. A state access failure aborts
    /// the evaluation and is returned to the caller.
    pub fn evaluate(&self, state: &dyn GameState) -> Result<bool, StateAccessError> {
        match self {
            Self::Always => Ok(true),
            Self::Never => Ok(false),
            Self::Flag(name) => state.has_flag(name),
            Self::Input(action) => state.is_input_active(action),
            Self::Grounded => state.is_grounded(),
            Self::TouchingWall(side) => state.is_touching_wall(*side),
            Self::TouchingAnyWall => Ok(state.is_touching_wall(WallSide::Left)?
                || state.is_touching_wall(WallSide::Right)?),
            Self::Health {
                target,
                compare,
                value,
            } => Ok(compare.test(state.remaining_health(target)?, *value)),
            Self::Currency {
                kind,
                compare,
                value,
            } => Ok(compare.test(state.currency_total(kind)?, *value)),
            Self::Not(inner) => Ok(!inner.evaluate(state)?),
            Self::All(children) => {
                for child in children {
                    if !child.evaluate(state)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Any(children) => {
                for child in children {
                    if child.evaluate(state)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Conjunction of this condition and another
    pub fn and(self, other: Condition) -> Self {
        match self {
            Self::All(mut children) => {
                children.push(other);
                Self::All(children)
            }
            first => Self::All(vec![first, other]),
        }
    }

    /// Disjunction of this condition and another
    pub fn or(self, other: Condition) -> Self {
        match self {
            Self::Any(mut children) => {
                children.push(other);
                Self::Any(children)
            }
            first => Self::Any(vec![first, other]),
        }
    }

    /// Threshold check on a target's remaining health
    pub fn health(target: impl Into<String>, compare: Compare, value: f32) -> Self {
        Self::Health {
            target: target.into(),
            compare,
            value,
        }
    }

    /// Threshold check on a currency total
    pub fn currency(kind: impl Into<String>, compare: Compare, value: f32) -> Self {
        Self::Currency {
            kind: kind.into(),
            compare,
            value,
        }
    }
}

impl std::ops::Not for Condition {
    type Output = Condition;

    fn not(self) -> Self::Output {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}
