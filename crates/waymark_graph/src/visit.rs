// SPDX-License-Identifier: MIT OR Apache-2.0
//! Visitor over node variants.
//!
//! Tooling walks a graph through this trait instead of inspecting node types
//! at runtime. Every callback defaults to doing nothing.

use crate::behavior::{ActionNode, DecisionNode, NodeBehavior};
use crate::node::Node;

/// Callbacks invoked by [`Node::accept`]
#[allow(unused_variables)]
pub trait NodeVisitor {
    /// Called for every node before its variant callback
    fn visit_node(&mut self, node: &Node) {}

    /// Start node
    fn visit_start(&mut self, node: &Node) {}

    /// End node
    fn visit_end(&mut self, node: &Node) {}

    /// Action node
    fn visit_action(&mut self, node: &Node, action: &ActionNode) {}

    /// Decision node
    fn visit_decision(&mut self, node: &Node, decision: &DecisionNode) {}

    /// Host-defined node
    fn visit_custom(&mut self, node: &Node, behavior: &dyn NodeBehavior) {}
}
