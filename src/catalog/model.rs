//! Deserializable representation of a step catalog document.
//!
//! The types mirror `schema/step_catalog.schema.json` so catalog authors and
//! tests can reason about content without ad-hoc JSON handling. Use
//! `StepCatalog::load` for validation; sections and nodes are decoded one at
//! a time there so a single broken entry does not hide the rest. Content
//! types (`Step`, `Choice`, `Action`) are shared with the validated catalog
//! unchanged.

use crate::catalog::identity::{Layout, NodeId, NodeKind, PathKey, SectionKey};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Deserialize)]
/// One section of a linear catalog plus its optional alternative paths.
pub struct SectionDocument {
    pub key: SectionKey,
    pub label: String,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub alternatives: BTreeMap<PathKey, PathDocument>,
}

#[derive(Clone, Debug, Deserialize)]
/// Alternative step sequence for a section.
pub struct PathDocument {
    pub label: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Clone, Debug, Deserialize)]
/// Graph node as authored; `type` decides which of the lists may be filled.
pub struct NodeDocument {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
/// A single unit of linear content.
pub struct Step {
    pub title: String,
    /// Short label used for tab strips; falls back to `title`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub layout: Layout,
    /// Alternative path the renderer should offer while this step is shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_path: Option<PathKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
}

impl Step {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.title)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(from = "ImageDocument")]
/// Asset reference attached to a step.
pub struct ImageRef {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
}

// Authors may list a bare asset path or a detailed object.
#[derive(Deserialize)]
#[serde(untagged)]
enum ImageDocument {
    Path(String),
    Detailed {
        src: String,
        #[serde(default)]
        alt: Option<String>,
        #[serde(default)]
        width: Option<String>,
    },
}

impl From<ImageDocument> for ImageRef {
    fn from(doc: ImageDocument) -> Self {
        match doc {
            ImageDocument::Path(src) => ImageRef {
                src,
                alt: None,
                width: None,
            },
            ImageDocument::Detailed { src, alt, width } => ImageRef { src, alt, width },
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
/// Answer offered by a question node.
pub struct Choice {
    pub label: String,
    pub next: NodeId,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
/// Host-interpreted action attached to a result node or a step.
pub struct Action {
    pub label: String,
    pub effect: Effect,
}

/// Declarative side effect; the host decides how to carry it out.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    CopyText {
        text: String,
    },
    OpenSection {
        fragment: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        anchor: Option<String>,
    },
    OpenUrl {
        url: String,
    },
}

/// Read a catalog file as raw JSON without any validation.
pub fn read_catalog_value(path: &Path) -> Result<Value> {
    let data =
        fs::read_to_string(path).with_context(|| format!("reading catalog {}", path.display()))?;
    let value: Value = serde_json::from_str(&data)
        .with_context(|| format!("parsing catalog {}", path.display()))?;
    Ok(value)
}
