// SPDX-License-Identifier: MIT OR Apache-2.0
//! `waymark run`: play a graph in the sandbox.
//!
//! The graph engine and a stock character machine share one sandbox world.
//! The character is locked for the length of the traversal, every
//! suspension counts as one frame, and transition effects complete at once.

use crate::check::load_graph;
use crate::error::{Result, ToolError};
use crate::settings::Settings;
use clap::Parser;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use waymark_core::{EffectRecord, SandboxWorld, SharedWorld};
use waymark_fsm::{character_machine, CharacterState, Signal};
use waymark_graph::{analyze, Engine, Finish, Graph, NodeId, RunStatus, Suspension};

/// Play a graph against the sandbox world
#[derive(Parser)]
pub struct Run {
    /// Graph asset file (RON)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Initial sandbox world (RON)
    #[arg(long, value_name = "FILE")]
    world: Option<PathBuf>,

    /// Settings file; defaults to ./waymark.ron when present
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,
}

impl Run {
    /// Run the command; `Ok(false)` unless the traversal reached its end
    pub fn execute(self) -> Result<bool> {
        let settings = Settings::load_or_default(self.settings.as_deref())?;
        let mut graph = load_graph(&self.file)?;
        let world = match &self.world {
            Some(path) => load_world(path)?,
            None => SandboxWorld::new(),
        };

        let outcome = play(&mut graph, world, &settings)?;
        print!("{}", outcome.render(&graph));
        Ok(outcome.finish == Finish::EndReached)
    }
}

/// Read a sandbox world file
pub fn load_world(path: &Path) -> Result<SandboxWorld> {
    let text = std::fs::read_to_string(path).map_err(|source| ToolError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&text).map_err(|source| ToolError::World {
        path: path.to_path_buf(),
        source,
    })
}

/// What a sandbox run did
#[derive(Debug)]
pub struct Outcome {
    /// How the traversal ended
    pub finish: Finish,
    /// Nodes visited in order
    pub trail: Vec<NodeId>,
    /// Effects received by the world, from the graph and the character
    pub effects: Vec<EffectRecord>,
    /// Suspensions resumed
    pub resumes: usize,
    /// Character state after the run
    pub character: Option<CharacterState>,
}

impl Outcome {
    /// Human-readable summary
    pub fn render(&self, graph: &Graph) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "graph: {}", graph.name);
        for (step, id) in self.trail.iter().enumerate() {
            let name = graph.node(*id).map_or("?", |n| n.name.as_str());
            let _ = writeln!(out, "  {:>3}. {name}", step + 1);
        }
        for effect in &self.effects {
            let _ = writeln!(out, "  effect: {effect:?}");
        }
        let finish = match &self.finish {
            Finish::EndReached => "end reached".to_string(),
            Finish::Stopped => "stopped".to_string(),
            Finish::Faulted(err) => format!("ended early: {err}"),
        };
        let _ = writeln!(out, "result: {finish} after {} resumes", self.resumes);
        if let Some(state) = self.character {
            let _ = writeln!(out, "character: {state:?}");
        }
        out
    }
}

/// Run a graph to completion in the sandbox
pub fn play(graph: &mut Graph, world: SandboxWorld, settings: &Settings) -> Result<Outcome> {
    let report = analyze(graph);
    for issue in report.errors() {
        tracing::warn!(graph = %graph.name, "{issue}");
    }

    let world = SharedWorld::new(world);
    let mut character = character_machine(world.clone(), &settings.movement);
    *character.config_mut() = settings.machine.clone();
    character.start(CharacterState::Idle)?;
    character.trigger(Signal::DialogueStarted)?;

    let mut engine = Engine::with_config(world.clone(), settings.engine.clone());
    let mut status = engine.start(graph)?;
    let mut resumes = 0;
    let finish = loop {
        let suspension = match status {
            RunStatus::Finished(finish) => break finish,
            RunStatus::Suspended(suspension) => suspension,
        };
        if resumes == settings.sandbox.max_resumes {
            engine.stop(graph)?;
            return Err(ToolError::ResumeLimit(resumes));
        }
        resumes += 1;
        character.tick()?;

        status = match suspension {
            Suspension::Signal => engine.resume(graph)?,
            Suspension::Effect(ticket) => match engine.complete_effect(graph, ticket)? {
                Some(status) => status,
                None => engine.resume(graph)?,
            },
        };
    };

    character.trigger(Signal::DialogueEnded)?;
    tracing::info!(graph = %graph.name, resumes, "Sandbox run finished");

    Ok(Outcome {
        finish,
        trail: engine.trail().to_vec(),
        effects: world.with(SandboxWorld::take_log),
        resumes,
        character: character.current(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use waymark_graph::TraversalError;

    const FERRY: &str = r#"(
        name: "ferry",
        nodes: [
            (key: "start", kind: Start),
            (key: "fare", kind: Decision((condition: Currency(kind: "gold", compare: GreaterOrEqual, value: 5.0)))),
            (key: "board", kind: Action((
                effects: [Line(speaker: "Ferryman", text: "Step aboard.")],
                wait: Advance,
            ))),
            (key: "crossing", kind: Action((wait: Transition("fade_to_black")))),
            (key: "refuse", kind: Action((effects: [Line(speaker: "Ferryman", text: "No coin, no crossing.")]))),
            (key: "end", kind: End),
        ],
        connections: [
            (from: "start", to: "fare"),
            (from: "fare", output: "true", to: "board"),
            (from: "fare", output: "false", to: "refuse"),
            (from: "board", to: "crossing"),
            (from: "crossing", to: "end"),
            (from: "refuse", to: "end"),
        ],
    )"#;

    fn names(graph: &Graph, trail: &[NodeId]) -> Vec<String> {
        trail
            .iter()
            .map(|id| graph.node(*id).unwrap().name.clone())
            .collect()
    }

    #[test]
    fn test_play_with_fare() {
        let mut graph = Graph::from_ron(FERRY).unwrap();
        let world = SandboxWorld::new().with_currency("gold", 8.0);
        let outcome = play(&mut graph, world, &Settings::default()).unwrap();

        assert_eq!(outcome.finish, Finish::EndReached);
        assert_eq!(outcome.resumes, 2);
        assert_eq!(
            names(&graph, &outcome.trail),
            ["start", "fare", "board", "crossing", "end"]
        );
        assert_eq!(outcome.character, Some(CharacterState::Idle));

        // The character is frozen around the dialogue
        let lock = outcome
            .effects
            .iter()
            .position(|e| *e == EffectRecord::DisableMovement)
            .unwrap();
        let line = outcome
            .effects
            .iter()
            .position(|e| matches!(e, EffectRecord::Line(..)))
            .unwrap();
        let unlock = outcome
            .effects
            .iter()
            .position(|e| *e == EffectRecord::EnableMovement)
            .unwrap();
        assert!(lock < line && line < unlock);
        assert!(outcome
            .effects
            .iter()
            .any(|e| matches!(e, EffectRecord::Transition(name, _) if name == "fade_to_black")));

        let text = outcome.render(&graph);
        assert!(text.contains("result: end reached after 2 resumes"));
    }

    #[test]
    fn test_play_without_fare() {
        let mut graph = Graph::from_ron(FERRY).unwrap();
        let outcome = play(&mut graph, SandboxWorld::new(), &Settings::default()).unwrap();
        assert_eq!(outcome.resumes, 0);
        assert_eq!(names(&graph, &outcome.trail), ["start", "fare", "refuse", "end"]);
    }

    #[test]
    fn test_dangling_output_is_reported() {
        let mut graph = Graph::from_ron(FERRY).unwrap();
        let crossing = graph.node_by_name("crossing").unwrap().id;
        let link = graph.connections_for_node(crossing).map(|c| c.id).last().unwrap();
        graph.disconnect(link);

        let world = SandboxWorld::new().with_currency("gold", 5.0);
        let outcome = play(&mut graph, world, &Settings::default()).unwrap();
        assert!(matches!(
            outcome.finish,
            Finish::Faulted(TraversalError::DanglingOutput { node, .. }) if node == crossing
        ));
        assert!(outcome.render(&graph).contains("ended early"));
    }

    #[test]
    fn test_resume_limit() {
        let text = r#"(
            name: "chatter",
            nodes: [
                (key: "start", kind: Start),
                (key: "talk", kind: Action((effects: [Line(speaker: "Parrot", text: "Again!")], wait: Advance))),
            ],
            connections: [
                (from: "start", to: "talk"),
                (from: "talk", to: "talk"),
            ],
        )"#;
        let mut graph = Graph::from_ron(text).unwrap();
        let mut settings = Settings::default();
        settings.sandbox.max_resumes = 3;

        let err = play(&mut graph, SandboxWorld::new(), &settings).unwrap_err();
        assert!(matches!(err, ToolError::ResumeLimit(3)));
    }

    #[test]
    fn test_world_file() {
        let path = std::env::temp_dir().join(format!("waymark-world-{}.ron", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"(currencies: {"gold": 12.0}, flags: ["met_ferryman"])"#).unwrap();
        let world = load_world(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(world.currencies.get("gold"), Some(&12.0));
        assert!(world.flags.contains("met_ferryman"));
        assert!(world.grounded);
    }
}
