// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph framework.

use crate::behavior::{ActionNode, DecisionNode, NodeBehavior, NodeContext, Step};
use crate::port::{Port, PortId, ENTER, FALSE, NEXT, TRUE};
use crate::visit::NodeVisitor;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use waymark_core::{Condition, HookError};

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Behavior variant of a node
#[derive(Debug)]
pub enum NodeKind {
    /// Traversal entry point
    Start,
    /// Terminal node
    End,
    /// Effects with an optional wait
    Action(ActionNode),
    /// Two-way branch on a condition
    Decision(DecisionNode),
    /// Host-defined behavior
    Custom(Box<dyn NodeBehavior>),
}

impl NodeKind {
    /// Short label for logs and reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Action(_) => "action",
            Self::Decision(_) => "decision",
            Self::Custom(_) => "custom",
        }
    }

    /// Stock port layout for this variant
    pub fn default_ports(&self) -> (Vec<Port>, Vec<Port>) {
        let enter = || Port::input(ENTER).required();
        let out = |name: &str| Port::output(name).required();
        match self {
            Self::Start => (vec![], vec![out(NEXT)]),
            Self::End => (vec![enter()], vec![]),
            Self::Action(_) | Self::Custom(_) => (vec![enter()], vec![out(NEXT)]),
            Self::Decision(_) => (vec![enter()], vec![out(TRUE), out(FALSE)]),
        }
    }
}

impl NodeBehavior for NodeKind {
    fn handle(&mut self, cx: &mut NodeContext<'_>) -> Result<Step, HookError> {
        match self {
            Self::Start | Self::End => Ok(Step::Continue),
            Self::Action(action) => action.handle(cx),
            Self::Decision(decision) => decision.handle(cx),
            Self::Custom(behavior) => behavior.handle(cx),
        }
    }

    fn post_handle(&mut self, cx: &mut NodeContext<'_>) -> Result<(), HookError> {
        match self {
            Self::Start | Self::End => Ok(()),
            Self::Action(action) => action.post_handle(cx),
            Self::Decision(decision) => decision.post_handle(cx),
            Self::Custom(behavior) => behavior.post_handle(cx),
        }
    }
}

/// A node instance in the graph
#[derive(Debug)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Display name
    pub name: String,
    /// Behavior variant
    pub kind: NodeKind,
    /// Input ports
    pub inputs: Vec<Port>,
    /// Output ports
    pub outputs: Vec<Port>,
}

impl Node {
    /// Create a node with the stock ports of its variant
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        let (inputs, outputs) = kind.default_ports();
        Self {
            id: NodeId::new(),
            name: name.into(),
            kind,
            inputs,
            outputs,
        }
    }

    /// Create a start node
    pub fn start(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Start)
    }

    /// Create an end node
    pub fn end(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::End)
    }

    /// Create an action node
    pub fn action(name: impl Into<String>, action: ActionNode) -> Self {
        Self::new(name, NodeKind::Action(action))
    }

    /// Create a decision node
    pub fn decision(name: impl Into<String>, condition: Condition) -> Self {
        Self::new(name, NodeKind::Decision(DecisionNode::new(condition)))
    }

    /// Create a node with host-defined behavior
    pub fn custom(name: impl Into<String>, behavior: impl NodeBehavior + 'static) -> Self {
        Self::new(name, NodeKind::Custom(Box::new(behavior)))
    }

    /// Replace the port layout
    pub fn with_ports(mut self, inputs: Vec<Port>, outputs: Vec<Port>) -> Self {
        self.inputs = inputs;
        self.outputs = outputs;
        self
    }

    /// Add an output port
    pub fn with_output(mut self, port: Port) -> Self {
        self.outputs.push(port);
        self
    }

    /// Whether this is a start node
    pub fn is_start(&self) -> bool {
        matches!(self.kind, NodeKind::Start)
    }

    /// Get an input port by name
    pub fn input(&self, name: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// Get an output port by name
    pub fn output(&self, name: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.name == name)
    }

    /// Get a port by ID
    pub fn port(&self, port_id: &PortId) -> Option<&Port> {
        self.inputs
            .iter()
            .find(|p| p.id == *port_id)
            .or_else(|| self.outputs.iter().find(|p| p.id == *port_id))
    }

    /// Get all ports
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    /// Dispatch to the visitor callback for this node's variant
    pub fn accept(&self, visitor: &mut dyn NodeVisitor) {
        visitor.visit_node(self);
        match &self.kind {
            NodeKind::Start => visitor.visit_start(self),
            NodeKind::End => visitor.visit_end(self),
            NodeKind::Action(action) => visitor.visit_action(self, action),
            NodeKind::Decision(decision) => visitor.visit_decision(self, decision),
            NodeKind::Custom(behavior) => visitor.visit_custom(self, behavior.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_ports() {
        let start = Node::start("begin");
        assert!(start.inputs.is_empty());
        assert!(start.output(NEXT).is_some());

        let decision = Node::decision("low_health", Condition::Always);
        assert!(decision.input(ENTER).is_some());
        assert!(decision.output(TRUE).is_some());
        assert!(decision.output(FALSE).is_some());
        assert!(decision.output(NEXT).is_none());

        let end = Node::end("done");
        assert!(end.outputs.is_empty());
        assert!(end.ports().all(|p| p.required));
    }

    #[test]
    fn test_port_lookup_by_id() {
        let node = Node::action("wave", ActionNode::default());
        let out = node.output(NEXT).unwrap().id;
        assert_eq!(node.port(&out).map(|p| p.name.as_str()), Some(NEXT));
        assert!(node.port(&PortId::new()).is_none());
    }
}
