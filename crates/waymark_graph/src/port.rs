// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for node inputs/outputs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Flow input every non-start node exposes
pub const ENTER: &str = "enter";
/// Unconditional flow output
pub const NEXT: &str = "next";
/// Decision output taken when the condition holds
pub const TRUE: &str = "true";
/// Decision output taken when the condition fails
pub const FALSE: &str = "false";

/// Unique identifier for a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortId(pub Uuid);

impl PortId {
    /// Create a new random port ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PortId {
    fn default() -> Self {
        Self::new()
    }
}

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

/// How many connections a port accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capacity {
    /// At most one connection
    Single,
    /// Any number of connections
    Multiple,
}

/// A port on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// Unique port ID
    pub id: PortId,
    /// Port name, unique per node and direction
    pub name: String,
    /// Port direction
    pub direction: PortDirection,
    /// Connection capacity
    pub capacity: Capacity,
    /// Whether completeness analysis requires a connection
    pub required: bool,
}

impl Port {
    /// Create a new port
    pub fn new(name: impl Into<String>, direction: PortDirection, capacity: Capacity) -> Self {
        Self {
            id: PortId::new(),
            name: name.into(),
            direction,
            capacity,
            required: false,
        }
    }

    /// Create a new input port.
    ///
    /// Inputs accept any number of incoming flows by default.
    pub fn input(name: impl Into<String>) -> Self {
        Self::new(name, PortDirection::Input, Capacity::Multiple)
    }

    /// Create a new output port.
    ///
    /// Outputs lead to exactly one successor by default.
    pub fn output(name: impl Into<String>) -> Self {
        Self::new(name, PortDirection::Output, Capacity::Single)
    }

    /// Set the capacity
    pub fn with_capacity(mut self, capacity: Capacity) -> Self {
        self.capacity = capacity;
        self
    }

    /// Mark as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Whether this port accepts another connection given its current count
    pub fn accepts(&self, existing: usize) -> bool {
        match self.capacity {
            Capacity::Single => existing == 0,
            Capacity::Multiple => true,
        }
    }

    /// Check if a connection from this port to another is valid
    pub fn can_connect(&self, other: &Port) -> bool {
        self.direction == PortDirection::Output && other.direction == PortDirection::Input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacities() {
        let input = Port::input(ENTER);
        let output = Port::output(NEXT);
        assert_eq!(input.capacity, Capacity::Multiple);
        assert_eq!(output.capacity, Capacity::Single);
        assert!(!input.required);
    }

    #[test]
    fn test_accepts_respects_capacity() {
        let single = Port::output(NEXT);
        assert!(single.accepts(0));
        assert!(!single.accepts(1));

        let multi = Port::output(NEXT).with_capacity(Capacity::Multiple);
        assert!(multi.accepts(3));
    }

    #[test]
    fn test_connection_direction() {
        let out = Port::output(NEXT);
        let inp = Port::input(ENTER);
        assert!(out.can_connect(&inp));
        assert!(!inp.can_connect(&out));
        assert!(!out.can_connect(&Port::output(NEXT)));
    }
}
