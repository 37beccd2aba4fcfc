// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph traversal engine.
//!
//! The engine walks a [`Graph`] from its start node. Each visit runs the
//! node's `handle` then `post_handle`, and then follows exactly one output:
//! the decision's branch for decision nodes, the single output otherwise.
//!
//! Traversal is cooperative. When a node asks to wait, the engine hands
//! control back to the caller and picks up at that node's `post_handle` on
//! [`Engine::resume`] or [`Engine::complete_effect`]. Content problems found
//! on the way (dangling outputs, ambiguous branches) end the traversal
//! gracefully; calling the engine wrong is an [`EngineError`].

use crate::behavior::{NodeBehavior, NodeContext, Step, Suspension};
use crate::graph::{Graph, GraphId, StructuralError};
use crate::node::{NodeId, NodeKind};
use serde::{Deserialize, Serialize};
use waymark_core::{EffectTicket, HookError, StateAccessError, World};

/// Engine tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Node visits allowed between two suspension points
    pub max_visits_per_run: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_visits_per_run: 1024,
        }
    }
}

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    /// No active traversal
    #[default]
    Idle,
    /// Visiting nodes
    Running,
    /// Paused until resumed by the caller
    Suspended,
}

/// How a traversal ended
#[derive(Debug, Clone, PartialEq)]
pub enum Finish {
    /// Reached a node without outputs
    EndReached,
    /// Cancelled by [`Engine::stop`]
    Stopped,
    /// Ended early on a content problem
    Faulted(TraversalError),
}

/// Result of driving the engine
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    /// Paused; call `resume` or `complete_effect` to continue
    Suspended(Suspension),
    /// Back to idle
    Finished(Finish),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Handle,
    PostHandle,
}

#[derive(Debug)]
struct Traversal {
    graph: GraphId,
    revision: u64,
    current: NodeId,
    suspended: Option<Suspension>,
    visits: usize,
}

/// Single-traversal graph executor bound to a host world
pub struct Engine<W> {
    world: W,
    config: EngineConfig,
    state: EngineState,
    traversal: Option<Traversal>,
    trail: Vec<NodeId>,
}

impl<W: World> Engine<W> {
    /// Create an engine with default config
    pub fn new(world: W) -> Self {
        Self::with_config(world, EngineConfig::default())
    }

    /// Create an engine with explicit config
    pub fn with_config(world: W, config: EngineConfig) -> Self {
        Self {
            world,
            config,
            state: EngineState::Idle,
            traversal: None,
            trail: Vec::new(),
        }
    }

    /// The host world
    pub fn world(&self) -> &W {
        &self.world
    }

    /// The host world, mutably
    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// Consume the engine and return its world
    pub fn into_world(self) -> W {
        self.world
    }

    /// Engine config
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current lifecycle state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Node the active traversal is at
    pub fn current_node(&self) -> Option<NodeId> {
        self.traversal.as_ref().map(|t| t.current)
    }

    /// What the active traversal is waiting for
    pub fn suspension(&self) -> Option<Suspension> {
        self.traversal.as_ref().and_then(|t| t.suspended)
    }

    /// Nodes visited by the current or most recent traversal, in order
    pub fn trail(&self) -> &[NodeId] {
        &self.trail
    }

    /// Begin traversing a graph at its start node
    pub fn start(&mut self, graph: &mut Graph) -> Result<RunStatus, EngineError> {
        if self.traversal.is_some() {
            return Err(EngineError::AlreadyRunning);
        }
        let start = graph.start_node()?;

        tracing::info!(graph = %graph.name, "Starting traversal");
        self.trail.clear();
        self.traversal = Some(Traversal {
            graph: graph.id(),
            revision: graph.revision(),
            current: start,
            suspended: None,
            visits: 0,
        });
        self.drive(graph, Phase::Handle)
    }

    /// Continue a suspended traversal from the waiting node's `post_handle`
    pub fn resume(&mut self, graph: &mut Graph) -> Result<RunStatus, EngineError> {
        let traversal = self.traversal.as_mut().ok_or(EngineError::NotRunning)?;
        check_graph(traversal, graph)?;
        let suspension = traversal.suspended.take().ok_or(EngineError::NotSuspended)?;
        traversal.visits = 0;

        tracing::debug!(graph = %graph.name, ?suspension, "Resuming traversal");
        self.drive(graph, Phase::PostHandle)
    }

    /// Report a finished effect.
    ///
    /// Resumes the traversal when it is waiting on this ticket. Completions
    /// nobody waits for (late, duplicate, or after `stop`) are ignored.
    pub fn complete_effect(
        &mut self,
        graph: &mut Graph,
        ticket: EffectTicket,
    ) -> Result<Option<RunStatus>, EngineError> {
        match self.suspension() {
            Some(Suspension::Effect(waiting)) if waiting == ticket => self.resume(graph).map(Some),
            _ => {
                tracing::debug!(%ticket, "Ignoring completion of an effect nobody waits on");
                Ok(None)
            }
        }
    }

    /// Abort the active traversal.
    ///
    /// A suspended node still gets its `post_handle` so it can clean up. When
    /// the graph passed in is not the traversed one, or was edited since the
    /// traversal started, cleanup is skipped but the traversal still ends.
    /// Returns `None` when there was nothing to stop.
    pub fn stop(&mut self, graph: &mut Graph) -> Result<Option<Finish>, EngineError> {
        let Some(traversal) = self.traversal.take() else {
            return Ok(None);
        };
        self.state = EngineState::Idle;
        let node_id = traversal.current;

        let cleanup = match check_graph(&traversal, graph) {
            Ok(()) => traversal.suspended.is_some(),
            Err(err) => {
                tracing::warn!(graph = %graph.name, error = %err, "Stopping without cleanup");
                false
            }
        };
        tracing::info!(graph = %graph.name, "Traversal stopped");

        if cleanup {
            if let Some(node) = graph.node_mut(node_id) {
                let mut cx = NodeContext::new(node_id, &mut self.world);
                node.kind
                    .post_handle(&mut cx)
                    .map_err(|source| EngineError::Hook {
                        node: node_id,
                        source,
                    })?;
            }
        }
        Ok(Some(Finish::Stopped))
    }

    fn drive(&mut self, graph: &mut Graph, phase: Phase) -> Result<RunStatus, EngineError> {
        self.state = EngineState::Running;
        match self.visit(graph, phase) {
            Ok(RunStatus::Suspended(suspension)) => {
                self.state = EngineState::Suspended;
                tracing::debug!(graph = %graph.name, ?suspension, "Traversal suspended");
                Ok(RunStatus::Suspended(suspension))
            }
            Ok(RunStatus::Finished(finish)) => {
                self.traversal = None;
                self.state = EngineState::Idle;
                match &finish {
                    Finish::Faulted(err) => {
                        tracing::warn!(graph = %graph.name, error = %err, "Traversal ended early");
                    }
                    _ => tracing::info!(graph = %graph.name, "Traversal finished"),
                }
                Ok(RunStatus::Finished(finish))
            }
            Err(err) => {
                self.traversal = None;
                self.state = EngineState::Idle;
                tracing::error!(graph = %graph.name, error = %err, "Traversal aborted");
                Err(err)
            }
        }
    }

    fn visit(&mut self, graph: &mut Graph, mut phase: Phase) -> Result<RunStatus, EngineError> {
        let traversal = self.traversal.as_mut().ok_or(EngineError::NotRunning)?;
        loop {
            let node_id = traversal.current;
            let Some(node) = graph.node_mut(node_id) else {
                return Ok(faulted(TraversalError::UnknownNode(node_id)));
            };
            let mut cx = NodeContext::new(node_id, &mut self.world);

            if phase == Phase::Handle {
                if traversal.visits >= self.config.max_visits_per_run {
                    return Ok(faulted(TraversalError::VisitBudgetExceeded {
                        node: node_id,
                        limit: self.config.max_visits_per_run,
                    }));
                }
                traversal.visits += 1;
                self.trail.push(node_id);
                tracing::debug!(node = %node.name, kind = node.kind.label(), "Visiting node");

                let step = node
                    .kind
                    .handle(&mut cx)
                    .map_err(|source| EngineError::Hook {
                        node: node_id,
                        source,
                    })?;
                if let Step::Wait(suspension) = step {
                    traversal.suspended = Some(suspension);
                    return Ok(RunStatus::Suspended(suspension));
                }
            }
            phase = Phase::Handle;

            node.kind
                .post_handle(&mut cx)
                .map_err(|source| EngineError::Hook {
                    node: node_id,
                    source,
                })?;

            let output = match &node.kind {
                NodeKind::Decision(decision) => decision
                    .choose(cx.state())
                    .map_err(|source| EngineError::Condition {
                        node: node_id,
                        source,
                    })?
                    .to_string(),
                _ => match node.outputs.as_slice() {
                    [] => return Ok(RunStatus::Finished(Finish::EndReached)),
                    [only] => only.name.clone(),
                    _ => return Ok(faulted(TraversalError::AmbiguousBranch(node_id))),
                },
            };

            match graph.next_node(node_id, &output) {
                Ok(Some(next)) => traversal.current = next,
                Ok(None) => {
                    return Ok(faulted(TraversalError::DanglingOutput {
                        node: node_id,
                        port: output,
                    }))
                }
                Err(err) => return Ok(faulted(err)),
            }
        }
    }
}

fn faulted(err: TraversalError) -> RunStatus {
    RunStatus::Finished(Finish::Faulted(err))
}

fn check_graph(traversal: &Traversal, graph: &Graph) -> Result<(), EngineError> {
    if traversal.graph != graph.id() {
        return Err(EngineError::GraphMismatch(graph.id()));
    }
    if traversal.revision != graph.revision() {
        return Err(EngineError::GraphModified);
    }
    Ok(())
}

/// Content problem met during traversal; ends the traversal gracefully
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TraversalError {
    /// The traversal points at a node that no longer exists
    #[error("Node not found: {0}")]
    UnknownNode(NodeId),

    /// No output port with this name
    #[error("Node {node} has no output '{port}'")]
    UnknownPort {
        /// Node searched
        node: NodeId,
        /// Port requested
        port: String,
    },

    /// A non-decision node has more than one output
    #[error("Node {0} has more than one unconditional output")]
    AmbiguousBranch(NodeId),

    /// An output leads to more than one node
    #[error("Output '{port}' of node {node} has more than one connection")]
    AmbiguousConnection {
        /// Node holding the port
        node: NodeId,
        /// Port name
        port: String,
    },

    /// The output to follow is not connected
    #[error("Output '{port}' of node {node} is not connected")]
    DanglingOutput {
        /// Node holding the port
        node: NodeId,
        /// Port name
        port: String,
    },

    /// Too many visits without a suspension point
    #[error("Visit budget of {limit} exhausted at node {node}")]
    VisitBudgetExceeded {
        /// Node about to be visited
        node: NodeId,
        /// Configured budget
        limit: usize,
    },
}

/// Misuse of the engine, or a failure raised while visiting a node
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A traversal is already active on this engine
    #[error("A traversal is already running on this engine")]
    AlreadyRunning,

    /// No traversal is active
    #[error("No traversal is running")]
    NotRunning,

    /// The traversal is running but not waiting
    #[error("Traversal is not suspended")]
    NotSuspended,

    /// A different graph was passed than the one being traversed
    #[error("Graph {0:?} is not the graph being traversed")]
    GraphMismatch(GraphId),

    /// The graph changed structure since the traversal started
    #[error("Graph was modified during traversal")]
    GraphModified,

    /// The graph cannot be traversed at all
    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// A node hook failed; the traversal was aborted
    #[error("Node {node} failed: {source}")]
    Hook {
        /// Node whose hook failed
        node: NodeId,
        /// Hook failure
        source: HookError,
    },

    /// A decision condition could not read game state; the traversal was aborted
    #[error("Decision {node} could not be evaluated: {source}")]
    Condition {
        /// Decision node
        node: NodeId,
        /// State access failure
        source: StateAccessError,
    },
}
