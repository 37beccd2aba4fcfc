// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes and connections.

use crate::connection::{Connection, ConnectionId};
use crate::engine::TraversalError;
use crate::node::{Node, NodeId};
use crate::port::PortId;
use crate::visit::NodeVisitor;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphId(pub Uuid);

impl GraphId {
    /// Create a new random graph ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GraphId {
    fn default() -> Self {
        Self::new()
    }
}

/// A node graph.
///
/// Owns its nodes and the connections between their ports. Every structural
/// change bumps [`Graph::revision`], which lets the engine detect a graph
/// that was edited in the middle of a traversal.
#[derive(Debug)]
pub struct Graph {
    id: GraphId,
    /// Graph name
    pub name: String,
    /// Nodes in the graph
    nodes: IndexMap<NodeId, Node>,
    /// Connections between nodes
    connections: IndexMap<ConnectionId, Connection>,
    revision: u64,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: GraphId::new(),
            name: name.into(),
            nodes: IndexMap::new(),
            connections: IndexMap::new(),
            revision: 0,
        }
    }

    /// Graph identity
    pub fn id(&self) -> GraphId {
        self.id
    }

    /// Structural revision, bumped by every node or connection change
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        let id = node.id;
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        self.nodes.insert(id, node);
        self.revision += 1;
        Ok(id)
    }

    /// Remove a node and its connections
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let node = self.nodes.shift_remove(&node_id)?;
        self.connections.retain(|_, c| !c.involves_node(node_id));
        self.revision += 1;
        Some(node)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID.
    ///
    /// Only node-internal state should be changed through this; port layout
    /// edits bypass the revision counter.
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Find the first node with the given name
    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.values().find(|n| n.name == name)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Connect an output port to an input port.
    ///
    /// Either every check passes and the connection is added, or the graph is
    /// left untouched.
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_port: PortId,
        to_node: NodeId,
        to_port: PortId,
    ) -> Result<ConnectionId, ConnectionError> {
        // Both ends must live in this graph
        let source_node = self
            .nodes
            .get(&from_node)
            .ok_or(ConnectionError::CrossGraph(from_node))?;
        let target_node = self
            .nodes
            .get(&to_node)
            .ok_or(ConnectionError::CrossGraph(to_node))?;

        let source_port = source_node
            .port(&from_port)
            .ok_or(ConnectionError::PortNotFound(from_port))?;
        let target_port = target_node
            .port(&to_port)
            .ok_or(ConnectionError::PortNotFound(to_port))?;

        if !source_port.can_connect(target_port) {
            return Err(ConnectionError::DirectionMismatch);
        }

        if self
            .connections
            .values()
            .any(|c| c.links(from_port, to_port))
        {
            return Err(ConnectionError::AlreadyConnected);
        }

        if !source_port.accepts(self.connections_from(from_port).count()) {
            return Err(ConnectionError::CapacityExceeded(from_port));
        }
        if !target_port.accepts(self.connections_to(to_port).count()) {
            return Err(ConnectionError::CapacityExceeded(to_port));
        }

        let connection = Connection::new(from_node, from_port, to_node, to_port);
        let id = connection.id;
        self.connections.insert(id, connection);
        self.revision += 1;
        Ok(id)
    }

    /// Connect two nodes by port name
    pub fn link(
        &mut self,
        from_node: NodeId,
        output: &str,
        to_node: NodeId,
        input: &str,
    ) -> Result<ConnectionId, ConnectionError> {
        let from_port = self
            .nodes
            .get(&from_node)
            .ok_or(ConnectionError::CrossGraph(from_node))?
            .output(output)
            .ok_or_else(|| ConnectionError::UnknownPortName {
                node: from_node,
                name: output.to_string(),
            })?
            .id;
        let to_port = self
            .nodes
            .get(&to_node)
            .ok_or(ConnectionError::CrossGraph(to_node))?
            .input(input)
            .ok_or_else(|| ConnectionError::UnknownPortName {
                node: to_node,
                name: input.to_string(),
            })?
            .id;
        self.connect(from_node, from_port, to_node, to_port)
    }

    /// Remove a connection
    pub fn disconnect(&mut self, connection_id: ConnectionId) -> Option<Connection> {
        let removed = self.connections.shift_remove(&connection_id)?;
        self.revision += 1;
        Some(removed)
    }

    /// Get a connection by ID
    pub fn connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&connection_id)
    }

    /// Get all connections
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Get connections from a specific port
    pub fn connections_from(&self, port_id: PortId) -> impl Iterator<Item = &Connection> {
        self.connections
            .values()
            .filter(move |c| c.from_port == port_id)
    }

    /// Get connections to a specific port
    pub fn connections_to(&self, port_id: PortId) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(move |c| c.to_port == port_id)
    }

    /// Get connections involving a node
    pub fn connections_for_node(&self, node_id: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections
            .values()
            .filter(move |c| c.involves_node(node_id))
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Whether a port has at least one connection
    pub fn is_port_connected(&self, port_id: PortId) -> bool {
        self.connections.values().any(|c| c.involves_port(port_id))
    }

    /// All nodes flagged as start nodes, in insertion order
    pub fn start_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.is_start())
            .map(|n| n.id)
            .collect()
    }

    /// The unique start node
    pub fn start_node(&self) -> Result<NodeId, StructuralError> {
        match self.start_nodes().as_slice() {
            [] => Err(StructuralError::MissingStartNode),
            [only] => Ok(*only),
            many => Err(StructuralError::AmbiguousStartNode(many.to_vec())),
        }
    }

    /// Follow the connection on a named output port.
    ///
    /// Returns `Ok(None)` when the port is not connected.
    pub fn next_node(
        &self,
        node_id: NodeId,
        output: &str,
    ) -> Result<Option<NodeId>, TraversalError> {
        let node = self
            .nodes
            .get(&node_id)
            .ok_or(TraversalError::UnknownNode(node_id))?;
        let port = node
            .output(output)
            .ok_or_else(|| TraversalError::UnknownPort {
                node: node_id,
                port: output.to_string(),
            })?;

        let mut targets = self.connections_from(port.id).map(|c| c.to_node);
        match (targets.next(), targets.next()) {
            (None, _) => Ok(None),
            (Some(next), None) => Ok(Some(next)),
            (Some(_), Some(_)) => Err(TraversalError::AmbiguousConnection {
                node: node_id,
                port: output.to_string(),
            }),
        }
    }

    /// Nodes reachable from `from` by following connections forward
    pub fn reachable_from(&self, from: NodeId) -> IndexSet<NodeId> {
        let mut seen = IndexSet::new();
        let mut stack = vec![from];
        while let Some(node_id) = stack.pop() {
            if !self.nodes.contains_key(&node_id) || !seen.insert(node_id) {
                continue;
            }
            stack.extend(
                self.connections
                    .values()
                    .filter(|c| c.from_node == node_id)
                    .map(|c| c.to_node),
            );
        }
        seen
    }

    /// Visit every node in insertion order
    pub fn walk(&self, visitor: &mut dyn NodeVisitor) {
        for node in self.nodes.values() {
            node.accept(visitor);
        }
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Error when editing the node set
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// Node is already part of the graph
    #[error("Node already in graph: {0}")]
    DuplicateNode(NodeId),
}

/// Error when creating a connection
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectionError {
    /// An endpoint node does not belong to this graph
    #[error("Node {0} belongs to a different graph")]
    CrossGraph(NodeId),

    /// Port not found on its node
    #[error("Port not found: {0:?}")]
    PortNotFound(PortId),

    /// No port with this name on the node
    #[error("Node {node} has no port named '{name}'")]
    UnknownPortName {
        /// Node searched
        node: NodeId,
        /// Port name requested
        name: String,
    },

    /// Connections run from an output to an input
    #[error("Connections must run from an output port to an input port")]
    DirectionMismatch,

    /// Capacity policy forbids another connection
    #[error("Port capacity exceeded: {0:?}")]
    CapacityExceeded(PortId),

    /// The same pair of ports is already connected
    #[error("Ports already connected")]
    AlreadyConnected,
}

/// Structural problems that make a graph untraversable
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StructuralError {
    /// No node is flagged as start
    #[error("Graph has no start node")]
    MissingStartNode,

    /// More than one node is flagged as start
    #[error("Graph has {} start nodes", .0.len())]
    AmbiguousStartNode(Vec<NodeId>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::ActionNode;
    use crate::port::{Capacity, Port, ENTER, FALSE, NEXT, TRUE};
    use waymark_core::Condition;

    fn chain() -> (Graph, NodeId, NodeId, NodeId) {
        let mut graph = Graph::new("chain");
        let start = graph.add_node(Node::start("start")).unwrap();
        let wave = graph.add_node(Node::action("wave", ActionNode::default())).unwrap();
        let end = graph.add_node(Node::end("end")).unwrap();
        graph.link(start, NEXT, wave, ENTER).unwrap();
        graph.link(wave, NEXT, end, ENTER).unwrap();
        (graph, start, wave, end)
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut graph = Graph::new("dup");
        let node = Node::end("end");
        let id = node.id;
        graph.add_node(node).unwrap();

        let mut twin = Node::end("end again");
        twin.id = id;
        assert_eq!(graph.add_node(twin), Err(GraphError::DuplicateNode(id)));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_single_capacity_is_atomic() {
        let (mut graph, start, _wave, end) = chain();
        let before = graph.revision();
        let connections = graph.connection_count();

        // `start.next` already leads to `wave`
        let err = graph.link(start, NEXT, end, ENTER).unwrap_err();
        let start_next = graph.node(start).unwrap().output(NEXT).unwrap().id;
        assert_eq!(err, ConnectionError::CapacityExceeded(start_next));
        assert_eq!(graph.connection_count(), connections);
        assert_eq!(graph.revision(), before);
    }

    #[test]
    fn test_single_input_capacity() {
        let mut graph = Graph::new("inputs");
        let a = graph.add_node(Node::start("a")).unwrap();
        let b = graph
            .add_node(Node::action("b", ActionNode::default()))
            .unwrap();
        let gate = Node::end("gate").with_ports(
            vec![Port::input(ENTER).with_capacity(Capacity::Single)],
            vec![],
        );
        let gate = graph.add_node(gate).unwrap();

        graph.link(a, NEXT, gate, ENTER).unwrap();
        let gate_in = graph.node(gate).unwrap().input(ENTER).unwrap().id;
        assert_eq!(
            graph.link(b, NEXT, gate, ENTER),
            Err(ConnectionError::CapacityExceeded(gate_in))
        );
    }

    #[test]
    fn test_cross_graph_rejected() {
        let (mut graph, start, _, _) = chain();
        let mut other = Graph::new("other");
        let stranger = other.add_node(Node::end("stranger")).unwrap();
        assert_eq!(
            graph.link(start, NEXT, stranger, ENTER),
            Err(ConnectionError::CrossGraph(stranger))
        );
    }

    #[test]
    fn test_direction_and_duplicates() {
        let mut graph = Graph::new("dirs");
        let a = graph
            .add_node(Node::action("a", ActionNode::default()))
            .unwrap();
        let b = graph
            .add_node(Node::action("b", ActionNode::default()))
            .unwrap();
        let a_in = graph.node(a).unwrap().input(ENTER).unwrap().id;
        let b_in = graph.node(b).unwrap().input(ENTER).unwrap().id;
        assert_eq!(
            graph.connect(a, a_in, b, b_in),
            Err(ConnectionError::DirectionMismatch)
        );

        let a_out = graph.node(a).unwrap().output(NEXT).unwrap().id;
        graph.connect(a, a_out, b, b_in).unwrap();
        assert_eq!(
            graph.connect(a, a_out, b, b_in),
            Err(ConnectionError::AlreadyConnected)
        );
        assert!(matches!(
            graph.link(a, "missing", b, ENTER),
            Err(ConnectionError::UnknownPortName { .. })
        ));
    }

    #[test]
    fn test_start_node_lookup() {
        let mut graph = Graph::new("starts");
        assert_eq!(graph.start_node(), Err(StructuralError::MissingStartNode));

        let first = graph.add_node(Node::start("first")).unwrap();
        assert_eq!(graph.start_node(), Ok(first));

        let second = graph.add_node(Node::start("second")).unwrap();
        assert_eq!(
            graph.start_node(),
            Err(StructuralError::AmbiguousStartNode(vec![first, second]))
        );
    }

    #[test]
    fn test_next_node() {
        let (graph, start, wave, end) = chain();
        assert_eq!(graph.next_node(start, NEXT), Ok(Some(wave)));
        assert_eq!(graph.next_node(wave, NEXT), Ok(Some(end)));
        assert!(matches!(
            graph.next_node(end, NEXT),
            Err(TraversalError::UnknownPort { .. })
        ));

        let mut graph = Graph::new("open");
        let ask = graph
            .add_node(Node::decision("ask", Condition::Always))
            .unwrap();
        assert_eq!(graph.next_node(ask, TRUE), Ok(None));
        assert_eq!(graph.next_node(ask, FALSE), Ok(None));
    }

    #[test]
    fn test_next_node_ambiguous_on_multi_output() {
        let mut graph = Graph::new("fan");
        let hub = Node::start("hub")
            .with_ports(vec![], vec![Port::output(NEXT).with_capacity(Capacity::Multiple)]);
        let hub = graph.add_node(hub).unwrap();
        let a = graph.add_node(Node::end("a")).unwrap();
        let b = graph.add_node(Node::end("b")).unwrap();
        graph.link(hub, NEXT, a, ENTER).unwrap();
        graph.link(hub, NEXT, b, ENTER).unwrap();
        assert!(matches!(
            graph.next_node(hub, NEXT),
            Err(TraversalError::AmbiguousConnection { .. })
        ));
    }

    #[test]
    fn test_remove_node_drops_connections() {
        let (mut graph, start, wave, end) = chain();
        assert_eq!(graph.reachable_from(start).len(), 3);

        graph.remove_node(wave).unwrap();
        assert_eq!(graph.connection_count(), 0);
        assert_eq!(graph.next_node(start, NEXT), Ok(None));
        assert!(!graph.reachable_from(start).contains(&end));
    }

    #[test]
    fn test_cycles_allowed() {
        let mut graph = Graph::new("loop");
        let a = graph
            .add_node(Node::action("a", ActionNode::default()))
            .unwrap();
        graph.link(a, NEXT, a, ENTER).unwrap();
        assert_eq!(graph.next_node(a, NEXT), Ok(Some(a)));
        assert_eq!(graph.reachable_from(a).len(), 1);
    }
}
