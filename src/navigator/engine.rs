//! Pure transition functions.
//!
//! Every function takes the catalog and the current state by reference and
//! returns the next state, so a failed command cannot leave a half-applied
//! state behind. Linear boundaries saturate; graph misuse is an error.

use crate::catalog::{CatalogBody, LinearCatalog, NodeId, PathKey, Section, Step, StepCatalog};
use crate::navigator::error::NavError;
use crate::navigator::state::{NavigationState, Position, ViewMode};

/// Linear cursor resolved against the catalog.
struct Cursor<'a> {
    section_index: usize,
    step: usize,
    section: &'a Section,
    steps: &'a [Step],
}

fn linear<'a>(catalog: &'a StepCatalog, command: &'static str) -> Result<&'a LinearCatalog, NavError> {
    catalog.as_linear().ok_or(NavError::Unsupported {
        command,
        kind: catalog.kind(),
    })
}

fn cursor<'a>(
    catalog: &'a StepCatalog,
    state: &NavigationState,
    command: &'static str,
) -> Result<Cursor<'a>, NavError> {
    let linear = linear(catalog, command)?;
    let Position::Linear { section, step } = state.position else {
        return Err(NavError::Unsupported {
            command,
            kind: catalog.kind(),
        });
    };
    let resolved = linear.section(section).ok_or_else(|| NavError::UnknownTarget {
        target: format!("section #{section}"),
    })?;
    let steps = resolved
        .steps_for(state.path.as_ref())
        .ok_or_else(|| NavError::UnknownTarget {
            target: state
                .path
                .as_ref()
                .map(|p| p.0.clone())
                .unwrap_or_default(),
        })?;
    Ok(Cursor {
        section_index: section,
        step,
        section: resolved,
        steps,
    })
}

fn current_node(state: &NavigationState, catalog: &StepCatalog, command: &'static str) -> Result<NodeId, NavError> {
    match &state.position {
        Position::Graph { node } if catalog.as_graph().is_some() => Ok(node.clone()),
        _ => Err(NavError::Unsupported {
            command,
            kind: catalog.kind(),
        }),
    }
}

fn with_step(state: &NavigationState, section: usize, step: usize) -> NavigationState {
    NavigationState {
        position: Position::Linear { section, step },
        ..state.clone()
    }
}

/// Advance one step, saturating at the last step of the active path.
pub fn next(catalog: &StepCatalog, state: &NavigationState) -> Result<NavigationState, NavError> {
    let cursor = cursor(catalog, state, "next")?;
    let last = cursor.steps.len().saturating_sub(1);
    Ok(with_step(
        state,
        cursor.section_index,
        (cursor.step + 1).min(last),
    ))
}

/// Step back: linear decrements (saturating at 0), graph pops the history.
pub fn prev(catalog: &StepCatalog, state: &NavigationState) -> Result<NavigationState, NavError> {
    match catalog.body() {
        CatalogBody::Linear(_) => {
            let cursor = cursor(catalog, state, "prev")?;
            Ok(with_step(
                state,
                cursor.section_index,
                cursor.step.saturating_sub(1),
            ))
        }
        CatalogBody::Graph(_) => {
            current_node(state, catalog, "prev")?;
            let mut next = state.clone();
            if let Some(previous) = next.history.pop() {
                next.position = previous;
            }
            Ok(next)
        }
    }
}

/// Follow choice `index` of the current question node.
pub fn choose(
    catalog: &StepCatalog,
    state: &NavigationState,
    index: usize,
) -> Result<NavigationState, NavError> {
    let node_id = current_node(state, catalog, "choose")?;
    let graph = catalog.as_graph().ok_or(NavError::Unsupported {
        command: "choose",
        kind: catalog.kind(),
    })?;
    let node = graph.node(&node_id).ok_or_else(|| NavError::UnknownTarget {
        target: node_id.0.clone(),
    })?;
    let choices = node.choices();
    let Some(choice) = choices.get(index) else {
        return Err(NavError::InvalidChoice {
            node: node_id,
            index,
            choices: choices.len(),
        });
    };

    let mut next = state.clone();
    next.history.push(state.position.clone());
    next.position = Position::Graph {
        node: choice.next.clone(),
    };
    Ok(next)
}

/// Move straight to a section (linear) or node (graph) named by `key`.
///
/// The linear step index is clamped to the section's main path. History is
/// cleared and the view returns to single steps.
pub fn jump_to(
    catalog: &StepCatalog,
    _state: &NavigationState,
    key: &str,
    index: usize,
) -> Result<NavigationState, NavError> {
    let position = match catalog.body() {
        CatalogBody::Linear(linear) => {
            let section = linear
                .section_index(key)
                .ok_or_else(|| NavError::UnknownTarget {
                    target: key.to_string(),
                })?;
            let len = linear.sections()[section].steps.len();
            Position::Linear {
                section,
                step: index.min(len.saturating_sub(1)),
            }
        }
        CatalogBody::Graph(graph) => {
            let node = graph.node_by_key(key).ok_or_else(|| NavError::UnknownTarget {
                target: key.to_string(),
            })?;
            Position::Graph {
                node: node.id.clone(),
            }
        }
    };
    Ok(NavigationState {
        position,
        history: Vec::new(),
        view: ViewMode::Step,
        path: None,
    })
}

/// Back to the catalog's start with an empty history.
pub fn reset(catalog: &StepCatalog, _state: &NavigationState) -> NavigationState {
    NavigationState::start(catalog)
}

/// Flip between single-step and show-all views without moving.
pub fn toggle_show_all(
    catalog: &StepCatalog,
    state: &NavigationState,
) -> Result<NavigationState, NavError> {
    cursor(catalog, state, "toggle_show_all")?;
    let mut next = state.clone();
    next.view = match state.view {
        ViewMode::Step => ViewMode::ShowAll,
        ViewMode::ShowAll => ViewMode::Step,
    };
    Ok(next)
}

/// Switch the current section to a named alternative path, at its first step.
pub fn select_path(
    catalog: &StepCatalog,
    state: &NavigationState,
    path: &PathKey,
) -> Result<NavigationState, NavError> {
    let cursor = cursor(catalog, state, "select_path")?;
    if !cursor.section.alternatives.contains_key(path) {
        return Err(NavError::UnknownTarget {
            target: path.0.clone(),
        });
    }
    Ok(NavigationState {
        position: Position::Linear {
            section: cursor.section_index,
            step: 0,
        },
        history: state.history.clone(),
        view: ViewMode::Step,
        path: Some(path.clone()),
    })
}

/// Return the current section to its main steps. No-op when already there.
pub fn main_path(catalog: &StepCatalog, state: &NavigationState) -> Result<NavigationState, NavError> {
    let cursor = cursor(catalog, state, "main_path")?;
    if state.path.is_none() {
        return Ok(state.clone());
    }
    Ok(NavigationState {
        position: Position::Linear {
            section: cursor.section_index,
            step: 0,
        },
        history: state.history.clone(),
        view: ViewMode::Step,
        path: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn six_steps() -> StepCatalog {
        let steps: Vec<_> = (0..6).map(|i| json!({"title": format!("Step {i}")})).collect();
        StepCatalog::load(&json!({
            "schema_version": "step_catalog_v1",
            "key": "six",
            "kind": "linear",
            "sections": [
                {"key": "only", "label": "Only", "steps": steps,
                 "alternatives": {"alt": {"label": "Alt", "steps": [{"title": "A0"}, {"title": "A1"}]}}}
            ]
        }))
        .expect("valid catalog")
    }

    fn tree() -> StepCatalog {
        StepCatalog::load(&json!({
            "schema_version": "step_catalog_v1",
            "key": "tree",
            "kind": "graph",
            "start": "q1",
            "nodes": [
                {"id": "q1", "type": "question", "title": "Q1",
                 "choices": [{"label": "one", "next": "r1"}, {"label": "two", "next": "r2"}]},
                {"id": "r1", "type": "result", "title": "R1"},
                {"id": "r2", "type": "result", "title": "R2"}
            ]
        }))
        .expect("valid catalog")
    }

    #[test]
    fn next_saturates_at_last_step() {
        let catalog = six_steps();
        let mut state = NavigationState::start(&catalog);
        for _ in 0..100 {
            state = next(&catalog, &state).unwrap();
        }
        assert_eq!(state.step_index(), Some(5));
    }

    #[test]
    fn prev_saturates_at_zero() {
        let catalog = six_steps();
        let state = NavigationState::start(&catalog);
        let back = prev(&catalog, &state).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn graph_rejects_linear_only_commands() {
        let catalog = tree();
        let state = NavigationState::start(&catalog);
        assert!(matches!(
            next(&catalog, &state),
            Err(NavError::Unsupported { command: "next", .. })
        ));
        assert!(matches!(
            toggle_show_all(&catalog, &state),
            Err(NavError::Unsupported { .. })
        ));
    }

    #[test]
    fn choose_out_of_range_reports_choice_count() {
        let catalog = tree();
        let state = NavigationState::start(&catalog);
        let err = choose(&catalog, &state, 7).unwrap_err();
        assert_eq!(
            err,
            NavError::InvalidChoice {
                node: NodeId("q1".to_string()),
                index: 7,
                choices: 2
            }
        );
    }

    #[test]
    fn select_path_restarts_and_main_path_returns() {
        let catalog = six_steps();
        let start = NavigationState::start(&catalog);
        let moved = next(&catalog, &start).unwrap();
        let alt = select_path(&catalog, &moved, &PathKey("alt".to_string())).unwrap();
        assert_eq!(alt.step_index(), Some(0));
        assert_eq!(alt.path(), Some(&PathKey("alt".to_string())));

        let saturated = next(&catalog, &next(&catalog, &alt).unwrap()).unwrap();
        assert_eq!(saturated.step_index(), Some(1), "alt path has two steps");

        let main = main_path(&catalog, &saturated).unwrap();
        assert_eq!(main.path(), None);
        assert_eq!(main.step_index(), Some(0));

        let missing = select_path(&catalog, &start, &PathKey("nope".to_string()));
        assert!(matches!(missing, Err(NavError::UnknownTarget { .. })));
    }

    #[test]
    fn jump_clamps_index_to_section_length() {
        let catalog = six_steps();
        let state = NavigationState::start(&catalog);
        let jumped = jump_to(&catalog, &state, "only", 40).unwrap();
        assert_eq!(jumped.step_index(), Some(5));
    }
}
