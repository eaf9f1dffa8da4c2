use crate::catalog::{CatalogKind, NodeId};
use std::fmt;

/// Recoverable navigation failures. The navigator's state is left unchanged.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NavError {
    /// `choose` on a result node, or with an index past the node's choices.
    InvalidChoice {
        node: NodeId,
        index: usize,
        choices: usize,
    },
    /// A jump key, path name or stored position does not resolve.
    UnknownTarget { target: String },
    /// The command has no meaning for this kind of catalog.
    Unsupported {
        command: &'static str,
        kind: CatalogKind,
    },
    /// The navigator is borrowed elsewhere, e.g. by a renderer mid-read.
    Busy,
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavError::InvalidChoice {
                node,
                index,
                choices: 0,
            } => write!(
                f,
                "cannot choose {index} at node '{node}': it is a result and offers no choices"
            ),
            NavError::InvalidChoice {
                node,
                index,
                choices,
            } => write!(
                f,
                "choice {index} is out of range for node '{node}' ({choices} choices)"
            ),
            NavError::UnknownTarget { target } => write!(f, "unknown navigation target '{target}'"),
            NavError::Unsupported { command, kind } => {
                write!(f, "'{command}' is not available in a {} catalog", kind.as_str())
            }
            NavError::Busy => write!(f, "navigator is busy; try again once it is released"),
        }
    }
}

impl std::error::Error for NavError {}
