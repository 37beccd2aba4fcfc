// SPDX-License-Identifier: MIT OR Apache-2.0
//! Offline completeness analysis.
//!
//! Runs over a whole graph before content ships. Nothing here is used on the
//! traversal path; the engine tolerates everything reported as an error.

use crate::behavior::{ActionNode, DecisionNode, NodeBehavior};
use crate::graph::{Graph, StructuralError};
use crate::node::{Node, NodeId};
use crate::visit::NodeVisitor;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How serious an issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Blocks shipping
    Error,
    /// Worth a look
    Warning,
}

/// A single finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum Issue {
    /// No start node
    MissingStartNode,
    /// More than one start node
    AmbiguousStartNode {
        /// All start nodes found
        nodes: Vec<NodeId>,
    },
    /// Required ports are not connected
    IncompleteNode {
        /// Offending node
        node: NodeId,
        /// Node display name
        name: String,
        /// Names of the unconnected required ports
        ports: Vec<String>,
    },
    /// A non-decision node has more than one output
    AmbiguousBranch {
        /// Offending node
        node: NodeId,
        /// Node display name
        name: String,
    },
    /// The node can never be visited from the start node
    UnreachableNode {
        /// Offending node
        node: NodeId,
        /// Node display name
        name: String,
    },
}

impl Issue {
    /// Severity of this issue
    pub fn severity(&self) -> Severity {
        match self {
            Self::UnreachableNode { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStartNode => write!(f, "graph has no start node"),
            Self::AmbiguousStartNode { nodes } => {
                write!(f, "graph has {} start nodes", nodes.len())
            }
            Self::IncompleteNode { name, ports, .. } => {
                write!(f, "node '{name}' has unconnected required ports: {}", ports.join(", "))
            }
            Self::AmbiguousBranch { name, .. } => {
                write!(f, "node '{name}' has more than one unconditional output")
            }
            Self::UnreachableNode { name, .. } => {
                write!(f, "node '{name}' is not reachable from the start node")
            }
        }
    }
}

/// Everything found in one graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Graph name
    pub graph: String,
    /// Findings in node order, structural issues first
    pub issues: Vec<Issue>,
}

impl AnalysisReport {
    /// Whether the graph has no errors (warnings are allowed)
    pub fn is_shippable(&self) -> bool {
        self.errors().next().is_none()
    }

    /// Error-level issues
    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|i| i.severity() == Severity::Error)
    }

    /// Warning-level issues
    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|i| i.severity() == Severity::Warning)
    }

    /// Whether any issue concerns the given node
    pub fn mentions(&self, node: NodeId) -> bool {
        self.issues.iter().any(|issue| match issue {
            Issue::MissingStartNode => false,
            Issue::AmbiguousStartNode { nodes } => nodes.contains(&node),
            Issue::IncompleteNode { node: n, .. }
            | Issue::AmbiguousBranch { node: n, .. }
            | Issue::UnreachableNode { node: n, .. } => *n == node,
        })
    }
}

/// Analyze a graph for shipping
pub fn analyze(graph: &Graph) -> AnalysisReport {
    let mut issues = Vec::new();
    let reachable = match graph.start_node() {
        Ok(start) => Some(graph.reachable_from(start)),
        Err(StructuralError::MissingStartNode) => {
            issues.push(Issue::MissingStartNode);
            None
        }
        Err(StructuralError::AmbiguousStartNode(nodes)) => {
            issues.push(Issue::AmbiguousStartNode { nodes });
            None
        }
    };

    let mut analyzer = CompletenessAnalyzer {
        graph,
        reachable,
        issues,
    };
    graph.walk(&mut analyzer);

    let report = AnalysisReport {
        graph: graph.name.clone(),
        issues: analyzer.issues,
    };
    tracing::debug!(
        graph = %report.graph,
        errors = report.errors().count(),
        warnings = report.warnings().count(),
        "Analysis complete"
    );
    report
}

struct CompletenessAnalyzer<'a> {
    graph: &'a Graph,
    reachable: Option<IndexSet<NodeId>>,
    issues: Vec<Issue>,
}

impl CompletenessAnalyzer<'_> {
    fn single_output(&mut self, node: &Node) {
        if node.outputs.len() > 1 {
            self.issues.push(Issue::AmbiguousBranch {
                node: node.id,
                name: node.name.clone(),
            });
        }
    }
}

impl NodeVisitor for CompletenessAnalyzer<'_> {
    fn visit_node(&mut self, node: &Node) {
        let ports: Vec<String> = node
            .ports()
            .filter(|p| p.required && !self.graph.is_port_connected(p.id))
            .map(|p| p.name.clone())
            .collect();
        if !ports.is_empty() {
            self.issues.push(Issue::IncompleteNode {
                node: node.id,
                name: node.name.clone(),
                ports,
            });
        }

        if let Some(reachable) = &self.reachable {
            if !reachable.contains(&node.id) {
                self.issues.push(Issue::UnreachableNode {
                    node: node.id,
                    name: node.name.clone(),
                });
            }
        }
    }

    fn visit_start(&mut self, node: &Node) {
        self.single_output(node);
    }

    fn visit_end(&mut self, node: &Node) {
        self.single_output(node);
    }

    fn visit_action(&mut self, node: &Node, _action: &ActionNode) {
        self.single_output(node);
    }

    // Decisions may have any number of outputs
    fn visit_decision(&mut self, _node: &Node, _decision: &DecisionNode) {}

    fn visit_custom(&mut self, node: &Node, _behavior: &dyn NodeBehavior) {
        self.single_output(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{Port, ENTER, FALSE, NEXT, TRUE};
    use waymark_core::Condition;

    #[test]
    fn test_complete_graph_is_shippable() {
        let mut graph = Graph::new("intro");
        let start = graph.add_node(Node::start("start")).unwrap();
        let end = graph.add_node(Node::end("end")).unwrap();
        graph.link(start, NEXT, end, ENTER).unwrap();

        let report = analyze(&graph);
        assert!(report.is_shippable());
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_missing_start() {
        let mut graph = Graph::new("headless");
        graph.add_node(Node::end("end")).unwrap();
        let report = analyze(&graph);
        assert!(!report.is_shippable());
        assert_eq!(report.issues[0], Issue::MissingStartNode);
        // Without a start node reachability is not reported
        assert_eq!(report.warnings().count(), 0);
    }

    #[test]
    fn test_two_starts() {
        let mut graph = Graph::new("twins");
        let a = graph.add_node(Node::start("a")).unwrap();
        let b = graph.add_node(Node::start("b")).unwrap();
        let end = graph.add_node(Node::end("end")).unwrap();
        graph.link(a, NEXT, end, ENTER).unwrap();
        graph.link(b, NEXT, end, ENTER).unwrap();

        let report = analyze(&graph);
        assert_eq!(
            report.issues,
            vec![Issue::AmbiguousStartNode { nodes: vec![a, b] }]
        );
        assert!(report.mentions(b));
    }

    #[test]
    fn test_unconnected_required_port_reported() {
        let mut graph = Graph::new("draft");
        let start = graph.add_node(Node::start("start")).unwrap();
        let ask = graph
            .add_node(Node::decision("ask", Condition::Always))
            .unwrap();
        let end = graph.add_node(Node::end("end")).unwrap();
        graph.link(start, NEXT, ask, ENTER).unwrap();
        graph.link(ask, TRUE, end, ENTER).unwrap();

        let report = analyze(&graph);
        assert_eq!(
            report.issues,
            vec![Issue::IncompleteNode {
                node: ask,
                name: "ask".into(),
                ports: vec![FALSE.to_string()],
            }]
        );
        assert!(!report.is_shippable());
        assert!(report.issues[0].to_string().contains("false"));
    }

    #[test]
    fn test_optional_port_is_not_required() {
        let mut graph = Graph::new("optional");
        let start = graph
            .add_node(Node::start("start").with_ports(vec![], vec![Port::output(NEXT)]))
            .unwrap();
        let report = analyze(&graph);
        assert!(report.is_shippable());
        assert!(!report.mentions(start));
    }

    #[test]
    fn test_unreachable_is_a_warning() {
        let mut graph = Graph::new("orphans");
        let start = graph.add_node(Node::start("start")).unwrap();
        let end = graph.add_node(Node::end("end")).unwrap();
        let island = graph.add_node(Node::end("island")).unwrap();
        let feeder = graph
            .add_node(Node::action("feeder", Default::default()))
            .unwrap();
        graph.link(start, NEXT, end, ENTER).unwrap();
        graph.link(feeder, NEXT, island, ENTER).unwrap();

        let report = analyze(&graph);
        let unreachable: Vec<_> = report
            .warnings()
            .filter_map(|i| match i {
                Issue::UnreachableNode { node, .. } => Some(*node),
                _ => None,
            })
            .collect();
        assert_eq!(unreachable, vec![island, feeder]);
        // feeder's own input is unconnected too
        assert_eq!(report.errors().count(), 1);
    }

    #[test]
    fn test_extra_output_is_ambiguous() {
        let mut graph = Graph::new("fork");
        let start = graph
            .add_node(Node::start("start").with_output(Port::output("also")))
            .unwrap();
        let a = graph.add_node(Node::end("a")).unwrap();
        let b = graph.add_node(Node::end("b")).unwrap();
        graph.link(start, NEXT, a, ENTER).unwrap();
        graph.link(start, "also", b, ENTER).unwrap();

        let report = analyze(&graph);
        assert_eq!(
            report.issues,
            vec![Issue::AmbiguousBranch {
                node: start,
                name: "start".into(),
            }]
        );
    }

    #[test]
    fn test_report_serializes_with_tags() {
        let mut graph = Graph::new("headless");
        graph.add_node(Node::end("end")).unwrap();
        let json = serde_json::to_value(analyze(&graph)).unwrap();
        assert_eq!(json["graph"], "headless");
        assert_eq!(json["issues"][0]["issue"], "missing_start_node");
    }
}
