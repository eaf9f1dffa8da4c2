use crate::catalog::{CatalogBody, NodeId, PathKey, StepCatalog};
use serde::Serialize;

/// Where a navigator currently points.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Position {
    /// Zero-based section and step indexes.
    Linear { section: usize, step: usize },
    Graph { node: NodeId },
}

/// Whether a linear navigator shows one step or every step of the section.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Step,
    ShowAll,
}

/// Mutable half of a navigator. Only the engine produces new states.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NavigationState {
    pub(crate) position: Position,
    pub(crate) history: Vec<Position>,
    pub(crate) view: ViewMode,
    pub(crate) path: Option<PathKey>,
}

impl NavigationState {
    /// State at the catalog's start: first step of the first section, or `start`.
    pub fn start(catalog: &StepCatalog) -> Self {
        let position = match catalog.body() {
            CatalogBody::Linear(_) => Position::Linear {
                section: 0,
                step: 0,
            },
            CatalogBody::Graph(graph) => Position::Graph {
                node: graph.start().clone(),
            },
        };
        Self {
            position,
            history: Vec::new(),
            view: ViewMode::Step,
            path: None,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Prior positions, oldest first; only `prev` on a graph pops it.
    pub fn history(&self) -> &[Position] {
        &self.history
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    /// Active alternative path; `None` is the section's main steps.
    pub fn path(&self) -> Option<&PathKey> {
        self.path.as_ref()
    }

    pub fn section_index(&self) -> Option<usize> {
        match self.position {
            Position::Linear { section, .. } => Some(section),
            Position::Graph { .. } => None,
        }
    }

    pub fn step_index(&self) -> Option<usize> {
        match self.position {
            Position::Linear { step, .. } => Some(step),
            Position::Graph { .. } => None,
        }
    }

    pub fn node_id(&self) -> Option<&NodeId> {
        match &self.position {
            Position::Graph { node } => Some(node),
            Position::Linear { .. } => None,
        }
    }
}
