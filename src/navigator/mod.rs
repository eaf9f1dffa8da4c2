//! Sequential/branching step navigator.
//!
//! `Navigator` pairs an immutable `StepCatalog` with the `NavigationState` it
//! exclusively owns. Commands run the pure functions in `engine`; on success
//! the new state replaces the old one and a fresh `Snapshot` is returned, on
//! failure the error goes back to the caller and nothing changes. The
//! navigator never renders and never performs I/O.

pub mod command;
pub mod engine;
pub mod error;
pub mod snapshot;
pub mod state;

pub use command::{Command, CommandParseError};
pub use error::NavError;
pub use snapshot::{Commands, Content, Progress, SectionInfo, SectionTab, Snapshot};
pub use state::{NavigationState, Position, ViewMode};

use crate::catalog::{PathKey, StepCatalog};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Navigator {
    catalog: Arc<StepCatalog>,
    state: NavigationState,
}

impl Navigator {
    /// Construct a navigator positioned at the catalog's start.
    pub fn new(catalog: Arc<StepCatalog>) -> Self {
        let state = NavigationState::start(&catalog);
        Self { catalog, state }
    }

    pub fn catalog(&self) -> &StepCatalog {
        &self.catalog
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        snapshot::project(&self.catalog, &self.state)
    }

    fn transition<F>(&mut self, command: &'static str, apply: F) -> Result<Snapshot<'_>, NavError>
    where
        F: FnOnce(&StepCatalog, &NavigationState) -> Result<NavigationState, NavError>,
    {
        match apply(self.catalog.as_ref(), &self.state) {
            Ok(next) => {
                log::trace!(
                    "{}: {command} {:?} -> {:?}",
                    self.catalog.key(),
                    self.state.position,
                    next.position
                );
                self.state = next;
                Ok(self.snapshot())
            }
            Err(err) => {
                log::debug!("{}: {command} rejected: {err}", self.catalog.key());
                Err(err)
            }
        }
    }

    pub fn next(&mut self) -> Result<Snapshot<'_>, NavError> {
        self.transition("next", engine::next)
    }

    pub fn prev(&mut self) -> Result<Snapshot<'_>, NavError> {
        self.transition("prev", engine::prev)
    }

    /// Follow the zero-based choice `index` of the current question.
    pub fn choose(&mut self, index: usize) -> Result<Snapshot<'_>, NavError> {
        self.transition("choose", |catalog, state| {
            engine::choose(catalog, state, index)
        })
    }

    pub fn jump_to(&mut self, key: &str, index: usize) -> Result<Snapshot<'_>, NavError> {
        self.transition("jump_to", |catalog, state| {
            engine::jump_to(catalog, state, key, index)
        })
    }

    pub fn reset(&mut self) -> Snapshot<'_> {
        self.state = engine::reset(&self.catalog, &self.state);
        log::trace!("{}: reset", self.catalog.key());
        self.snapshot()
    }

    pub fn toggle_show_all(&mut self) -> Result<Snapshot<'_>, NavError> {
        self.transition("toggle_show_all", engine::toggle_show_all)
    }

    pub fn select_path(&mut self, path: &PathKey) -> Result<Snapshot<'_>, NavError> {
        self.transition("select_path", |catalog, state| {
            engine::select_path(catalog, state, path)
        })
    }

    pub fn main_path(&mut self) -> Result<Snapshot<'_>, NavError> {
        self.transition("main_path", engine::main_path)
    }

    /// Dispatch a parsed `Command`.
    pub fn apply(&mut self, command: &Command) -> Result<Snapshot<'_>, NavError> {
        match command {
            Command::Next => self.next(),
            Command::Prev => self.prev(),
            Command::Choose(index) => self.choose(*index),
            Command::Jump(target) => self.jump_to(&target.key, target.index),
            Command::Reset => Ok(self.reset()),
            Command::ToggleShowAll => self.toggle_show_all(),
            Command::SelectPath(path) => self.select_path(path),
            Command::MainPath => self.main_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NodeId;
    use serde_json::json;

    fn navigator() -> Navigator {
        let catalog = StepCatalog::load(&json!({
            "schema_version": "step_catalog_v1",
            "key": "tree",
            "kind": "graph",
            "start": "q1",
            "nodes": [
                {"id": "q1", "type": "question", "title": "Q1",
                 "choices": [{"label": "one", "next": "r1"}]},
                {"id": "r1", "type": "result", "title": "R1",
                 "actions": [{"label": "Copy", "effect": {"kind": "copy_text", "text": "hi"}}]}
            ]
        }))
        .unwrap();
        Navigator::new(Arc::new(catalog))
    }

    #[test]
    fn failed_command_leaves_state_untouched() {
        let mut nav = navigator();
        nav.choose(0).unwrap();
        let before = nav.state().clone();
        assert!(nav.choose(0).is_err());
        assert!(nav.jump_to("nowhere", 0).is_err());
        assert_eq!(nav.state(), &before);
    }

    #[test]
    fn snapshot_exposes_terminal_actions() {
        let mut nav = navigator();
        let snapshot = nav.choose(0).unwrap();
        assert!(snapshot.commands.terminal);
        assert!(snapshot.commands.can_go_back);
        assert_eq!(snapshot.commands.actions.len(), 1);
        assert_eq!(snapshot.progress.ordinal, 2);
        assert!(matches!(snapshot.content, Content::Node { node } if node.id == NodeId("r1".to_string())));
    }

    #[test]
    fn apply_routes_parsed_commands() {
        let mut nav = navigator();
        nav.apply(&Command::parse("1").unwrap()).unwrap();
        assert_eq!(nav.state().node_id(), Some(&NodeId("r1".to_string())));
        nav.apply(&Command::Reset).unwrap();
        assert_eq!(nav.state().node_id(), Some(&NodeId("q1".to_string())));
        assert!(nav.state().history().is_empty());
    }
}
