// SPDX-License-Identifier: MIT OR Apache-2.0
//! `waymark check`: offline analysis of graph assets.

use crate::error::{Result, ToolError};
use clap::Parser;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use waymark_graph::{analyze, AnalysisReport, Graph, Severity};

/// Check graph assets for shipping
#[derive(Parser)]
pub struct Check {
    /// Graph asset files (RON)
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Print the reports as JSON
    #[arg(long)]
    json: bool,
}

impl Check {
    /// Run the command; `Ok(false)` when any graph has errors
    pub fn execute(self) -> Result<bool> {
        let mut reports = Vec::with_capacity(self.files.len());
        for path in &self.files {
            let graph = load_graph(path)?;
            reports.push(analyze(&graph));
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        } else {
            for (path, report) in self.files.iter().zip(&reports) {
                print!("{}", render(path, report));
            }
        }
        Ok(reports.iter().all(AnalysisReport::is_shippable))
    }
}

/// Read and build a graph asset
pub fn load_graph(path: &Path) -> Result<Graph> {
    let text = std::fs::read_to_string(path).map_err(|source| ToolError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Graph::from_ron(&text).map_err(|source| ToolError::Asset {
        path: path.to_path_buf(),
        source,
    })
}

/// Human-readable report
pub fn render(path: &Path, report: &AnalysisReport) -> String {
    let errors = report.errors().count();
    let warnings = report.warnings().count();
    let mut out = format!("{} ({}): ", path.display(), report.graph);
    if report.issues.is_empty() {
        out.push_str("ok\n");
        return out;
    }

    let _ = writeln!(
        out,
        "{errors} {}, {warnings} {}",
        plural(errors, "error"),
        plural(warnings, "warning")
    );
    for issue in &report.issues {
        let level = match issue.severity() {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        let _ = writeln!(out, "  {level}: {issue}");
    }
    out
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DRAFT: &str = r#"(
        name: "draft",
        nodes: [
            (key: "start", kind: Start),
            (key: "ask", kind: Decision((condition: Flag("met_elder")))),
            (key: "end", kind: End),
            (key: "stray", kind: End),
        ],
        connections: [
            (from: "start", to: "ask"),
            (from: "ask", output: "true", to: "end"),
        ],
    )"#;

    fn write_temp(text: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("waymark-check-{}.ron", uuid::Uuid::new_v4()));
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_render_lists_issues() {
        let path = write_temp(DRAFT);
        let graph = load_graph(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let text = render(Path::new("draft.ron"), &analyze(&graph));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "draft.ron (draft): 2 errors, 1 warning");
        assert!(lines.contains(&"  error: node 'ask' has unconnected required ports: false"));
        assert!(lines.contains(&"  error: node 'stray' has unconnected required ports: enter"));
        assert!(lines.contains(&"  warning: node 'stray' is not reachable from the start node"));
    }

    #[test]
    fn test_clean_graph_renders_ok() {
        let mut graph = Graph::new("intro");
        let start = graph.add_node(waymark_graph::Node::start("start")).unwrap();
        let end = graph.add_node(waymark_graph::Node::end("end")).unwrap();
        graph.link(start, "next", end, "enter").unwrap();
        assert_eq!(
            render(Path::new("intro.ron"), &analyze(&graph)),
            "intro.ron (intro): ok\n"
        );
    }

    #[test]
    fn test_load_errors_name_the_file() {
        let path = write_temp("(name: \"broken\", nodes: [(key: \"a\", kind: Sideways)])");
        let err = load_graph(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, ToolError::Asset { .. }));
        assert!(err.to_string().starts_with(&path.display().to_string()));

        let missing = std::env::temp_dir().join("waymark-check-missing.ron");
        assert!(matches!(load_graph(&missing), Err(ToolError::Read { .. })));
    }

    #[test]
    fn test_execute_reports_failure() {
        let path = write_temp(DRAFT);
        let check = Check {
            files: vec![path.clone()],
            json: true,
        };
        let shippable = check.execute().unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(!shippable);
    }
}
