// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node graph runtime for Waymark.
//!
//! Dialogs, quest logic and cutscenes are authored as directed graphs of
//! nodes joined port to port. This crate provides:
//! - The graph model: nodes, ports, connections
//! - A traversal engine that visits one node at a time and can suspend
//! - Offline completeness analysis for content checks
//! - A RON asset format
//!
//! ## Architecture
//!
//! The engine borrows a [`Graph`] on every call and owns the host [`World`]
//! handed to it at construction. Nodes describe their work through the
//! [`NodeBehavior`] hooks; tooling inspects them through [`NodeVisitor`].
//!
//! [`World`]: waymark_core::World

pub mod analysis;
pub mod asset;
pub mod behavior;
pub mod connection;
pub mod engine;
pub mod graph;
pub mod node;
pub mod port;
pub mod visit;

pub use analysis::{analyze, AnalysisReport, Issue, Severity};
pub use asset::{AssetError, GraphAsset, LinkAsset, NodeAsset, NodeSpec};
pub use behavior::{ActionNode, DecisionNode, NodeBehavior, NodeContext, Step, Suspension, WaitFor};
pub use connection::{Connection, ConnectionId};
pub use engine::{Engine, EngineConfig, EngineError, EngineState, Finish, RunStatus, TraversalError};
pub use graph::{ConnectionError, Graph, GraphError, GraphId, StructuralError};
pub use node::{Node, NodeId, NodeKind};
pub use port::{Capacity, Port, PortDirection, PortId};
pub use visit::NodeVisitor;
