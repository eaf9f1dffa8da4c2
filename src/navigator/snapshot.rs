//! Read-only projection of a navigator for renderers.
//!
//! A snapshot borrows from the catalog, so producing one after every
//! transition costs nothing beyond a few small vectors. It serializes to the
//! JSON shape consumed by `guide-walk --json`.

use crate::catalog::{
    Action, CatalogBody, CatalogKey, Node, PathKey, SectionKey, Step, StepCatalog,
};
use crate::navigator::state::{NavigationState, Position, ViewMode};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub catalog: &'a CatalogKey,
    pub title: &'a str,
    pub view: ViewMode,
    pub content: Content<'a>,
    pub progress: Progress,
    pub commands: Commands<'a>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Content<'a> {
    Step {
        section: SectionInfo<'a>,
        index: usize,
        step: &'a Step,
    },
    AllSteps {
        section: SectionInfo<'a>,
        steps: &'a [Step],
    },
    Node {
        node: &'a Node,
    },
    /// The state does not resolve against the catalog.
    Missing,
}

#[derive(Debug, Serialize)]
pub struct SectionInfo<'a> {
    pub key: &'a SectionKey,
    pub label: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<&'a PathKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_label: Option<&'a str>,
}

/// Position for progress indicators. `ordinal` is 1-based.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Progress {
    pub ordinal: usize,
    /// Unknown for graphs, where only the depth walked so far is known.
    pub total: Option<usize>,
    pub percent: Option<u8>,
}

#[derive(Debug, Default, Serialize)]
pub struct Commands<'a> {
    pub can_go_back: bool,
    pub can_go_next: bool,
    pub can_show_all: bool,
    pub choices: Vec<&'a str>,
    pub sections: Vec<SectionTab<'a>>,
    pub paths: Vec<&'a PathKey>,
    pub offered_path: Option<&'a PathKey>,
    pub actions: &'a [Action],
    /// A result node was reached; only `prev`/`reset` remain useful.
    pub terminal: bool,
}

#[derive(Debug, Serialize)]
pub struct SectionTab<'a> {
    pub key: &'a SectionKey,
    pub label: &'a str,
    pub active: bool,
}

/// Percent through `total` steps, matching the site's progress bars.
pub fn percent(index: usize, total: usize) -> u8 {
    if total <= 1 {
        return 100;
    }
    let ratio = index.min(total - 1) as f64 / (total - 1) as f64;
    (ratio * 100.0).round() as u8
}

pub(crate) fn project<'a>(catalog: &'a StepCatalog, state: &'a NavigationState) -> Snapshot<'a> {
    let (content, progress, commands) = match (catalog.body(), &state.position) {
        (CatalogBody::Linear(linear), Position::Linear { section, step }) => {
            let resolved = linear.section(*section).and_then(|sec| {
                sec.steps_for(state.path.as_ref())
                    .map(|steps| (sec, steps))
            });
            match resolved {
                Some((sec, steps)) if !steps.is_empty() => {
                    let index = (*step).min(steps.len() - 1);
                    let info = SectionInfo {
                        key: &sec.key,
                        label: &sec.label,
                        path: state.path.as_ref(),
                        path_label: sec.path_label(state.path.as_ref()),
                    };
                    let content = match state.view {
                        ViewMode::Step => Content::Step {
                            section: info,
                            index,
                            step: &steps[index],
                        },
                        ViewMode::ShowAll => Content::AllSteps {
                            section: info,
                            steps,
                        },
                    };
                    // Show-all ends with the last step, so its actions close the list.
                    let actions = match state.view {
                        ViewMode::Step => steps[index].actions.as_slice(),
                        ViewMode::ShowAll => steps[steps.len() - 1].actions.as_slice(),
                    };
                    let offered_path = match state.path {
                        None => steps[index]
                            .offer_path
                            .as_ref()
                            .filter(|path| sec.alternatives.contains_key(*path)),
                        Some(_) => None,
                    };
                    let commands = Commands {
                        can_go_back: index > 0,
                        can_go_next: index + 1 < steps.len(),
                        can_show_all: true,
                        sections: linear
                            .sections()
                            .iter()
                            .enumerate()
                            .map(|(i, tab)| SectionTab {
                                key: &tab.key,
                                label: &tab.label,
                                active: i == *section,
                            })
                            .collect(),
                        paths: sec.alternatives.keys().collect(),
                        offered_path,
                        actions,
                        ..Commands::default()
                    };
                    let progress = Progress {
                        ordinal: index + 1,
                        total: Some(steps.len()),
                        percent: Some(percent(index, steps.len())),
                    };
                    (content, progress, commands)
                }
                _ => missing(),
            }
        }
        (CatalogBody::Graph(graph), Position::Graph { node }) => match graph.node(node) {
            Some(node) => {
                let commands = Commands {
                    can_go_back: !state.history.is_empty(),
                    choices: node.choices().iter().map(|c| c.label.as_str()).collect(),
                    actions: node.actions(),
                    terminal: node.is_terminal(),
                    ..Commands::default()
                };
                let progress = Progress {
                    ordinal: state.history.len() + 1,
                    total: None,
                    percent: None,
                };
                (Content::Node { node }, progress, commands)
            }
            None => missing(),
        },
        _ => missing(),
    };

    Snapshot {
        catalog: catalog.key(),
        title: catalog.title(),
        view: state.view,
        content,
        progress,
        commands,
    }
}

fn missing<'a>() -> (Content<'a>, Progress, Commands<'a>) {
    (
        Content::Missing,
        Progress {
            ordinal: 0,
            total: None,
            percent: None,
        },
        Commands::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_matches_progress_bar_rounding() {
        assert_eq!(percent(0, 6), 0);
        assert_eq!(percent(1, 6), 20);
        assert_eq!(percent(2, 7), 33);
        assert_eq!(percent(5, 6), 100);
        assert_eq!(percent(0, 1), 100);
        assert_eq!(percent(9, 3), 100);
    }
}
