// SPDX-License-Identifier: MIT OR Apache-2.0
//! On-disk graph format.
//!
//! A [`GraphAsset`] names its nodes by string keys and wires them by port
//! name, so the RON stays readable and diffable. Building it produces a
//! [`Graph`] with fresh ids. Start-node validity is left to analysis.

use crate::behavior::{ActionNode, DecisionNode};
use crate::graph::{ConnectionError, Graph, GraphError};
use crate::node::{Node, NodeId, NodeKind};
use crate::port::{PortId, ENTER, NEXT};
use indexmap::IndexMap;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

/// Serializable node variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeSpec {
    /// Traversal entry point
    Start,
    /// Terminal node
    End,
    /// Effects with an optional wait
    Action(ActionNode),
    /// Two-way branch on a condition
    Decision(DecisionNode),
}

impl From<NodeSpec> for NodeKind {
    fn from(spec: NodeSpec) -> Self {
        match spec {
            NodeSpec::Start => Self::Start,
            NodeSpec::End => Self::End,
            NodeSpec::Action(action) => Self::Action(action),
            NodeSpec::Decision(decision) => Self::Decision(decision),
        }
    }
}

impl NodeKind {
    /// Serializable form of this variant; `None` for host-defined nodes
    pub fn to_spec(&self) -> Option<NodeSpec> {
        match self {
            Self::Start => Some(NodeSpec::Start),
            Self::End => Some(NodeSpec::End),
            Self::Action(action) => Some(NodeSpec::Action(action.clone())),
            Self::Decision(decision) => Some(NodeSpec::Decision(decision.clone())),
            Self::Custom(_) => None,
        }
    }
}

/// A node entry in an asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAsset {
    /// Key used by connections; unique within the asset
    pub key: String,
    /// Display name; defaults to the key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Node variant
    pub kind: NodeSpec,
}

/// A connection entry in an asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkAsset {
    /// Source node key
    pub from: String,
    /// Source output port name
    #[serde(default = "default_output")]
    pub output: String,
    /// Target node key
    pub to: String,
    /// Target input port name
    #[serde(default = "default_input")]
    pub input: String,
}

fn default_output() -> String {
    NEXT.to_string()
}

fn default_input() -> String {
    ENTER.to_string()
}

/// Serializable graph description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphAsset {
    /// Graph name
    pub name: String,
    /// Nodes in order
    #[serde(default)]
    pub nodes: Vec<NodeAsset>,
    /// Connections in order
    #[serde(default)]
    pub connections: Vec<LinkAsset>,
}

impl GraphAsset {
    /// Parse an asset from RON
    pub fn from_ron(text: &str) -> Result<Self, AssetError> {
        Ok(ron::from_str(text)?)
    }

    /// Write the asset as pretty RON
    pub fn to_ron(&self) -> Result<String, AssetError> {
        Ok(ron::ser::to_string_pretty(self, PrettyConfig::default())?)
    }

    /// Instantiate a graph
    pub fn build(&self) -> Result<Graph, AssetError> {
        let mut graph = Graph::new(self.name.clone());
        let mut keys: IndexMap<&str, NodeId> = IndexMap::new();

        for entry in &self.nodes {
            if keys.contains_key(entry.key.as_str()) {
                return Err(AssetError::DuplicateKey(entry.key.clone()));
            }
            let name = entry.name.clone().unwrap_or_else(|| entry.key.clone());
            let id = graph.add_node(Node::new(name, entry.kind.clone().into()))?;
            keys.insert(&entry.key, id);
        }

        let lookup = |key: &str| {
            keys.get(key)
                .copied()
                .ok_or_else(|| AssetError::UnknownKey(key.to_string()))
        };
        for link in &self.connections {
            let from = lookup(&link.from)?;
            let to = lookup(&link.to)?;
            graph.link(from, &link.output, to, &link.input)?;
        }

        tracing::debug!(
            graph = %graph.name,
            nodes = graph.node_count(),
            connections = graph.connection_count(),
            "Built graph from asset"
        );
        Ok(graph)
    }
}

impl Graph {
    /// Load a graph from RON asset text
    pub fn from_ron(text: &str) -> Result<Self, AssetError> {
        GraphAsset::from_ron(text)?.build()
    }

    /// Save the graph as RON asset text
    pub fn to_ron(&self) -> Result<String, AssetError> {
        self.to_asset()?.to_ron()
    }

    /// Describe the graph as an asset.
    ///
    /// Keys are node names, suffixed when names repeat. Custom port layouts
    /// are not kept; nodes come back with their stock ports.
    pub fn to_asset(&self) -> Result<GraphAsset, AssetError> {
        let mut keys: IndexMap<NodeId, String> = IndexMap::new();
        let mut nodes = Vec::with_capacity(self.node_count());

        for node in self.nodes() {
            let kind = node
                .kind
                .to_spec()
                .ok_or_else(|| AssetError::Unserializable(node.name.clone()))?;
            let mut key = node.name.clone();
            let mut suffix = 2;
            while keys.values().any(|k| *k == key) {
                key = format!("{}_{suffix}", node.name);
                suffix += 1;
            }
            nodes.push(NodeAsset {
                name: (key != node.name).then(|| node.name.clone()),
                key: key.clone(),
                kind,
            });
            keys.insert(node.id, key);
        }

        let mut connections = Vec::with_capacity(self.connection_count());
        for conn in self.connections() {
            let port_name = |node: NodeId, port: &PortId| {
                self.node(node)
                    .and_then(|n| n.port(port))
                    .map(|p| p.name.clone())
            };
            let (Some(from), Some(to), Some(output), Some(input)) = (
                keys.get(&conn.from_node),
                keys.get(&conn.to_node),
                port_name(conn.from_node, &conn.from_port),
                port_name(conn.to_node, &conn.to_port),
            ) else {
                continue;
            };
            connections.push(LinkAsset {
                from: from.clone(),
                output,
                to: to.clone(),
                input,
            });
        }

        Ok(GraphAsset {
            name: self.name.clone(),
            nodes,
            connections,
        })
    }
}

/// Errors loading or saving graph assets
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// Invalid RON
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serialization failed
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),

    /// Two nodes share a key
    #[error("Duplicate node key '{0}'")]
    DuplicateKey(String),

    /// A connection names a key with no node
    #[error("Unknown node key '{0}'")]
    UnknownKey(String),

    /// A host-defined node cannot be written out
    #[error("Node '{0}' has custom behavior and cannot be saved")]
    Unserializable(String),

    /// Adding a node failed
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Wiring a connection failed
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}
