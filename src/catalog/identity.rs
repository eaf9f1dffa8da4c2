use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Key of a step catalog (e.g., `troubleshooter`).
///
/// Hosts use it to pick a catalog out of a `CatalogRepository` and it is
/// echoed in every snapshot so renderers know which widget they are drawing.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogKey(pub String);

/// Stable key of a section inside a linear catalog (e.g., `finish`).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionKey(pub String);

/// Identifier of a node inside a graph catalog.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

/// Name of an alternative step path within a section (e.g., `alt`).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathKey(pub String);

impl fmt::Display for CatalogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Presentation hint for the images attached to a step.
///
/// Known variants keep serialization consistent; `Other` preserves hints a
/// newer catalog may introduce so older renderers can fall back to stacking.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Layout {
    #[default]
    Stacked,
    Pair,
    Other(String),
}

impl Layout {
    pub fn as_str(&self) -> &str {
        match self {
            Layout::Stacked => "stacked",
            Layout::Pair => "pair",
            Layout::Other(value) => value.as_str(),
        }
    }

    fn from_str(value: &str) -> Self {
        match value {
            "stacked" => Layout::Stacked,
            // The site markup called the side-by-side layout "two".
            "pair" | "two" => Layout::Pair,
            other => Layout::Other(other.to_string()),
        }
    }
}

impl Serialize for Layout {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Layout {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_str(&value))
    }
}

/// Whether a catalog is a sequence of sections or a decision graph.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Linear,
    Graph,
}

impl CatalogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CatalogKind::Linear => "linear",
            CatalogKind::Graph => "graph",
        }
    }
}

/// Node flavour in a graph catalog. Result nodes are terminal.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Question,
    Result,
}
