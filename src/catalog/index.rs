//! Validated, immutable view of a step catalog.
//!
//! Loading runs two collect-all passes: the structural JSON Schema pass and
//! a semantic pass (unique keys, resolvable references, non-empty content).
//! Both passes always run and their violations land in one `SchemaError`, so
//! a catalog author fixes a broken file in one round instead of one error at
//! a time. A `StepCatalog` that exists is always navigable.

use crate::catalog::error::{SchemaError, Violation};
use crate::catalog::identity::{CatalogKey, CatalogKind, Layout, NodeId, NodeKind, PathKey, SectionKey};
use crate::catalog::model::{
    Action, Choice, NodeDocument, SectionDocument, Step, read_catalog_value,
};
use crate::schema_loader::{CatalogSchema, embedded_schema};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Clone, Debug)]
/// Catalog that passed validation.
pub struct StepCatalog {
    key: CatalogKey,
    title: String,
    body: CatalogBody,
}

#[derive(Clone, Debug)]
pub enum CatalogBody {
    Linear(LinearCatalog),
    Graph(GraphCatalog),
}

#[derive(Clone, Debug)]
pub struct LinearCatalog {
    sections: Vec<Section>,
}

#[derive(Clone, Debug, Serialize)]
/// Ordered steps under a stable key, plus named alternative paths.
pub struct Section {
    pub key: SectionKey,
    pub label: String,
    pub steps: Vec<Step>,
    pub alternatives: BTreeMap<PathKey, StepPath>,
}

#[derive(Clone, Debug, Serialize)]
pub struct StepPath {
    pub label: String,
    pub steps: Vec<Step>,
}

#[derive(Clone, Debug)]
pub struct GraphCatalog {
    start: NodeId,
    nodes: BTreeMap<NodeId, Node>,
    order: Vec<NodeId>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub title: String,
    pub text: String,
    #[serde(flatten)]
    pub body: NodeBody,
}

/// Question nodes branch; result nodes are terminal by construction.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeBody {
    Question { choices: Vec<Choice> },
    Result { actions: Vec<Action> },
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self.body {
            NodeBody::Question { .. } => NodeKind::Question,
            NodeBody::Result { .. } => NodeKind::Result,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.body, NodeBody::Result { .. })
    }

    pub fn choices(&self) -> &[Choice] {
        match &self.body {
            NodeBody::Question { choices } => choices,
            NodeBody::Result { .. } => &[],
        }
    }

    pub fn actions(&self) -> &[Action] {
        match &self.body {
            NodeBody::Question { .. } => &[],
            NodeBody::Result { actions } => actions,
        }
    }
}

impl Section {
    /// Steps of the main path (`None`) or of a named alternative.
    pub fn steps_for(&self, path: Option<&PathKey>) -> Option<&[Step]> {
        match path {
            None => Some(&self.steps),
            Some(key) => self.alternatives.get(key).map(|alt| alt.steps.as_slice()),
        }
    }

    pub fn path_label(&self, path: Option<&PathKey>) -> Option<&str> {
        path.and_then(|key| self.alternatives.get(key))
            .map(|alt| alt.label.as_str())
    }
}

impl LinearCatalog {
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    pub fn section_index(&self, key: &str) -> Option<usize> {
        self.sections.iter().position(|section| section.key.0 == key)
    }
}

impl GraphCatalog {
    pub fn start(&self) -> &NodeId {
        &self.start
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_by_key(&self, key: &str) -> Option<&Node> {
        self.nodes.get(&NodeId(key.to_string()))
    }

    /// Nodes in authored order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node ids that no choice path from `start` can reach.
    pub fn unreachable_nodes(&self) -> Vec<&NodeId> {
        let mut seen: BTreeSet<&NodeId> = BTreeSet::new();
        let mut pending = vec![&self.start];
        while let Some(id) = pending.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = self.nodes.get(id) {
                pending.extend(node.choices().iter().map(|choice| &choice.next));
            }
        }
        self.order.iter().filter(|id| !seen.contains(id)).collect()
    }
}

impl StepCatalog {
    /// Validate a raw catalog against the embedded schema and the semantic rules.
    pub fn load(raw: &Value) -> Result<Self, SchemaError> {
        let schema = embedded_schema()
            .map_err(|msg| SchemaError::single(key_hint(raw), "", msg))?;
        Self::load_with_schema(raw, schema)
    }

    /// Same as `load`, against a caller-supplied schema.
    ///
    /// The semantic pass runs even when the structural pass fails. Sections
    /// and nodes that do not decode are skipped there; the schema already
    /// reported them.
    pub fn load_with_schema(raw: &Value, schema: &CatalogSchema) -> Result<Self, SchemaError> {
        let mut violations = schema.check(raw);
        let structural_ok = violations.is_empty();
        match build_catalog(raw, structural_ok, &mut violations) {
            Some(catalog) if violations.is_empty() => Ok(catalog),
            _ => Err(SchemaError::new(key_hint(raw), violations)),
        }
    }

    /// Parse JSON text and validate it.
    pub fn load_from_str(data: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(data).context("parsing catalog JSON")?;
        Ok(Self::load(&value)?)
    }

    pub fn key(&self) -> &CatalogKey {
        &self.key
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn kind(&self) -> CatalogKind {
        match self.body {
            CatalogBody::Linear(_) => CatalogKind::Linear,
            CatalogBody::Graph(_) => CatalogKind::Graph,
        }
    }

    pub fn body(&self) -> &CatalogBody {
        &self.body
    }

    pub fn as_linear(&self) -> Option<&LinearCatalog> {
        match &self.body {
            CatalogBody::Linear(linear) => Some(linear),
            CatalogBody::Graph(_) => None,
        }
    }

    pub fn as_graph(&self) -> Option<&GraphCatalog> {
        match &self.body {
            CatalogBody::Graph(graph) => Some(graph),
            CatalogBody::Linear(_) => None,
        }
    }
}

/// Read a catalog file and validate it.
pub fn load_catalog_from_path(path: &Path) -> Result<StepCatalog> {
    let value = read_catalog_value(path)?;
    StepCatalog::load(&value).with_context(|| format!("validating catalog {}", path.display()))
}

fn key_hint(raw: &Value) -> Option<String> {
    raw.get("key").and_then(Value::as_str).map(str::to_string)
}

/// Entries of an authored array, decoded one at a time.
struct Decoded<T> {
    /// Entries that decoded, with their authored index.
    entries: Vec<(usize, T)>,
    /// Authored entry count, decoded or not.
    authored: usize,
    /// Ids of the entries that failed to decode.
    undecoded: BTreeSet<String>,
}

impl<T> Decoded<T> {
    fn is_empty(&self) -> bool {
        self.authored == 0
    }
}

fn decode_each<T: DeserializeOwned>(
    raw: &Value,
    field: &str,
    id_field: &str,
    report: bool,
    violations: &mut Vec<Violation>,
) -> Decoded<T> {
    let items = raw
        .get(field)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let mut decoded = Decoded {
        entries: Vec::with_capacity(items.len()),
        authored: items.len(),
        undecoded: BTreeSet::new(),
    };
    for (idx, item) in items.iter().enumerate() {
        match T::deserialize(item) {
            Ok(entry) => decoded.entries.push((idx, entry)),
            Err(err) => {
                if let Some(id) = item.get(id_field).and_then(Value::as_str) {
                    decoded.undecoded.insert(id.to_string());
                }
                if report {
                    violations.push(Violation::new(
                        format!("{field}[{idx}]"),
                        format!("unable to decode: {err}"),
                    ));
                }
            }
        }
    }
    decoded
}

fn non_empty_array(raw: &Value, field: &str) -> bool {
    raw.get(field)
        .and_then(Value::as_array)
        .is_some_and(|items| !items.is_empty())
}

/// Semantic pass over the raw document. `structural_ok` is false when the
/// schema already complained, in which case shape problems are not repeated.
/// Returns `None` only when the catalog kind itself is unusable.
fn build_catalog(
    raw: &Value,
    structural_ok: bool,
    violations: &mut Vec<Violation>,
) -> Option<StepCatalog> {
    let key = raw.get("key").and_then(Value::as_str).unwrap_or_default();
    if structural_ok || !key.is_empty() {
        validate_catalog_key(key, violations);
    }
    let title = raw
        .get("title")
        .and_then(Value::as_str)
        .filter(|title| !title.trim().is_empty())
        .unwrap_or(key);

    let Some(kind) = raw
        .get("kind")
        .and_then(|kind| CatalogKind::deserialize(kind).ok())
    else {
        if structural_ok {
            violations.push(Violation::new("kind", "catalog kind must be 'linear' or 'graph'"));
        }
        return None;
    };

    let body = match kind {
        CatalogKind::Linear => {
            if raw.get("start").is_some() || non_empty_array(raw, "nodes") {
                violations.push(Violation::new(
                    "",
                    "linear catalog must not declare start or nodes",
                ));
            }
            let sections = decode_each(raw, "sections", "key", structural_ok, violations);
            CatalogBody::Linear(build_linear(sections, violations))
        }
        CatalogKind::Graph => {
            if non_empty_array(raw, "sections") {
                violations.push(Violation::new("", "graph catalog must not declare sections"));
            }
            let start = raw
                .get("start")
                .and_then(Value::as_str)
                .map(|start| NodeId(start.to_string()));
            let nodes = decode_each(raw, "nodes", "id", structural_ok, violations);
            CatalogBody::Graph(build_graph(start, nodes, structural_ok, violations))
        }
    };

    Some(StepCatalog {
        key: CatalogKey(key.to_string()),
        title: title.to_string(),
        body,
    })
}

fn validate_catalog_key(key: &str, violations: &mut Vec<Violation>) {
    if key.is_empty() {
        violations.push(Violation::new("key", "catalog key must not be empty"));
    } else if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        violations.push(Violation::new(
            "key",
            format!("catalog key must match ^[A-Za-z0-9_.-]+$, got {key}"),
        ));
    }
}

fn build_linear(
    sections: Decoded<SectionDocument>,
    violations: &mut Vec<Violation>,
) -> LinearCatalog {
    if sections.is_empty() {
        violations.push(Violation::new("sections", "catalog contains no sections"));
    }

    let mut seen: BTreeSet<SectionKey> = BTreeSet::new();
    let mut built = Vec::with_capacity(sections.entries.len());
    for (idx, section) in sections.entries {
        let location = if section.key.0.is_empty() {
            format!("sections[{idx}]")
        } else {
            format!("sections[{}]", section.key.0)
        };
        if section.key.0.trim().is_empty() {
            violations.push(Violation::new(&location, "section key must not be empty"));
        } else if !seen.insert(section.key.clone()) {
            violations.push(Violation::new(
                &location,
                format!("duplicate section key '{}'", section.key.0),
            ));
        }
        if section.steps.is_empty() {
            violations.push(Violation::new(
                format!("{location}.steps"),
                format!("section '{}' has no steps", section.key.0),
            ));
        }
        let offered: BTreeSet<&PathKey> = section.alternatives.keys().collect();
        validate_steps(&format!("{location}.steps"), &section.steps, &offered, violations);
        for (path, alt) in &section.alternatives {
            let alt_location = format!("{location}.alternatives[{}]", path.0);
            if alt.steps.is_empty() {
                violations.push(Violation::new(
                    format!("{alt_location}.steps"),
                    format!("alternative path '{}' has no steps", path.0),
                ));
            }
            validate_steps(&format!("{alt_location}.steps"), &alt.steps, &offered, violations);
        }

        built.push(Section {
            key: section.key,
            label: section.label,
            steps: section.steps,
            alternatives: section
                .alternatives
                .into_iter()
                .map(|(path, alt)| {
                    (
                        path,
                        StepPath {
                            label: alt.label,
                            steps: alt.steps,
                        },
                    )
                })
                .collect(),
        });
    }
    LinearCatalog { sections: built }
}

fn validate_steps(
    location: &str,
    steps: &[Step],
    offered: &BTreeSet<&PathKey>,
    violations: &mut Vec<Violation>,
) {
    for (idx, step) in steps.iter().enumerate() {
        let step_location = format!("{location}[{idx}]");
        if step.title.trim().is_empty() {
            violations.push(Violation::new(&step_location, "step title must not be empty"));
        }
        if step.layout == Layout::Pair && step.images.len() < 2 {
            violations.push(Violation::new(
                format!("{step_location}.layout"),
                format!(
                    "layout 'pair' needs at least two images, found {}",
                    step.images.len()
                ),
            ));
        }
        if let Some(path) = &step.offer_path {
            if !offered.contains(path) {
                violations.push(Violation::new(
                    format!("{step_location}.offer_path"),
                    format!("offers unknown alternative path '{}'", path.0),
                ));
            }
        }
    }
}

fn build_graph(
    start: Option<NodeId>,
    nodes: Decoded<NodeDocument>,
    structural_ok: bool,
    violations: &mut Vec<Violation>,
) -> GraphCatalog {
    if nodes.is_empty() {
        violations.push(Violation::new("nodes", "catalog contains no nodes"));
    }

    let mut by_id: BTreeMap<NodeId, Node> = BTreeMap::new();
    let mut order = Vec::with_capacity(nodes.entries.len());
    for (idx, node) in nodes.entries {
        let location = if node.id.0.is_empty() {
            format!("nodes[{idx}]")
        } else {
            format!("nodes[{}]", node.id.0)
        };
        if node.id.0.trim().is_empty() {
            violations.push(Violation::new(&location, "node id must not be empty"));
            continue;
        }
        if by_id.contains_key(&node.id) {
            violations.push(Violation::new(
                &location,
                format!("duplicate node id '{}'", node.id.0),
            ));
            continue;
        }

        let body = match node.kind {
            NodeKind::Question => {
                if node.choices.is_empty() {
                    violations.push(Violation::new(
                        format!("{location}.choices"),
                        format!("question node '{}' has no choices", node.id.0),
                    ));
                }
                if !node.actions.is_empty() {
                    violations.push(Violation::new(
                        format!("{location}.actions"),
                        format!("question node '{}' must not declare actions", node.id.0),
                    ));
                }
                NodeBody::Question {
                    choices: node.choices,
                }
            }
            NodeKind::Result => {
                if !node.choices.is_empty() {
                    violations.push(Violation::new(
                        format!("{location}.choices"),
                        format!("result node '{}' is terminal and must not declare choices", node.id.0),
                    ));
                }
                NodeBody::Result {
                    actions: node.actions,
                }
            }
        };

        order.push(node.id.clone());
        by_id.insert(
            node.id.clone(),
            Node {
                id: node.id,
                title: node.title,
                text: node.text,
                body,
            },
        );
    }

    // References are checked once every id is known so forward links resolve.
    // Ids of nodes that failed to decode still count as known.
    let exists = |id: &NodeId| by_id.contains_key(id) || nodes.undecoded.contains(&id.0);
    for id in &order {
        let Some(node) = by_id.get(id) else {
            continue;
        };
        for (idx, choice) in node.choices().iter().enumerate() {
            if !exists(&choice.next) {
                violations.push(Violation::new(
                    format!("nodes[{}].choices[{idx}].next", id.0),
                    format!("node '{}' references unknown node '{}'", id.0, choice.next.0),
                ));
            }
        }
    }

    match &start {
        None if structural_ok => {
            violations.push(Violation::new("start", "graph catalog must declare a start node"));
        }
        None => {}
        Some(start) if start.0.is_empty() => {
            violations.push(Violation::new("start", "start node must not be empty"));
        }
        Some(start) if !exists(start) => {
            violations.push(Violation::new(
                "start",
                format!("start node '{}' does not exist", start.0),
            ));
        }
        Some(_) => {}
    }

    GraphCatalog {
        start: start.unwrap_or_else(|| NodeId(String::new())),
        nodes: by_id,
        order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn graph(nodes: Value, start: &str) -> Value {
        json!({
            "schema_version": "step_catalog_v1",
            "key": "ts",
            "kind": "graph",
            "start": start,
            "nodes": nodes
        })
    }

    #[test]
    fn dangling_reference_names_the_node() {
        let raw = graph(
            json!([
                {"id": "q1", "type": "question", "title": "Q",
                 "choices": [{"label": "a", "next": "ghost"}]}
            ]),
            "q1",
        );
        let err = StepCatalog::load(&raw).expect_err("dangling ref must fail");
        assert_eq!(err.catalog.as_deref(), Some("ts"));
        assert!(
            err.violations()
                .iter()
                .any(|v| v.location == "nodes[q1].choices[0].next" && v.message.contains("ghost"))
        );
    }

    #[test]
    fn semantic_violations_are_collected_together() {
        let raw = graph(
            json!([
                {"id": "q1", "type": "question", "title": "Q", "choices": []},
                {"id": "q1", "type": "result", "title": "dup"},
                {"id": "r1", "type": "result", "title": "R",
                 "choices": [{"label": "again", "next": "q1"}]}
            ]),
            "missing",
        );
        let err = StepCatalog::load(&raw).expect_err("broken graph");
        assert!(err.mentions("has no choices"));
        assert!(err.mentions("duplicate node id 'q1'"));
        assert!(err.mentions("is terminal"));
        assert!(err.mentions("start node 'missing' does not exist"));
        assert_eq!(err.violations().len(), 4);
    }

    #[test]
    fn linear_rules_cover_sections_and_steps() {
        let raw = json!({
            "schema_version": "step_catalog_v1",
            "key": "spp",
            "kind": "linear",
            "sections": [
                {"key": "wear", "label": "Wear", "steps": [
                    {"title": "Pads", "layout": "pair", "images": ["a.jpg"]},
                    {"title": "Alt", "offer_path": "nope"}
                ]},
                {"key": "wear", "label": "Again", "steps": []}
            ]
        });
        let err = StepCatalog::load(&raw).expect_err("broken linear catalog");
        assert!(err.mentions("sections[wear].steps[0].layout"));
        assert!(err.mentions("offers unknown alternative path 'nope'"));
        assert!(err.mentions("duplicate section key 'wear'"));
        assert!(err.mentions("has no steps"));
    }

    #[test]
    fn structural_and_semantic_violations_share_one_error() {
        let raw = json!({"schema_version": "step_catalog_v0", "key": "x", "kind": "linear"});
        let err = StepCatalog::load(&raw).expect_err("schema version mismatch");
        assert_eq!(err.catalog.as_deref(), Some("x"));
        assert!(err.mentions("/schema_version"), "{err}");
        assert!(err.mentions("catalog contains no sections"), "{err}");
    }

    #[test]
    fn undecodable_nodes_still_count_as_reference_targets() {
        let raw = graph(
            json!([
                {"id": "q1", "type": "question", "title": "Q",
                 "choices": [{"label": "a", "next": "r1"}, {"label": "b", "next": "ghost"}]},
                {"id": "r1", "type": "result", "title": ["not", "a", "string"]}
            ]),
            "q1",
        );
        let err = StepCatalog::load(&raw).expect_err("bad title and dangling ref");
        assert!(err.mentions("/nodes/1/title"), "{err}");
        assert!(err.mentions("unknown node 'ghost'"), "{err}");
        assert!(!err.mentions("unknown node 'r1'"), "{err}");
        assert_eq!(err.violations().len(), 2, "{err}");
    }

    #[test]
    fn lax_schema_reports_decode_failures() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            json!({"properties": {"schema_version": {"const": "step_catalog_v1"}}})
        )
        .unwrap();
        let schema = CatalogSchema::load(file.path()).unwrap();
        let raw = graph(
            json!([{"id": "q1", "type": "maybe", "title": "Q"}]),
            "q1",
        );
        let err = StepCatalog::load_with_schema(&raw, &schema).expect_err("bad node type");
        assert!(err.mentions("nodes[0]"), "{err}");
        assert!(err.mentions("unable to decode"), "{err}");
    }

    #[test]
    fn unreachable_nodes_are_reported_in_order() {
        let raw = graph(
            json!([
                {"id": "q1", "type": "question", "title": "Q",
                 "choices": [{"label": "a", "next": "r1"}]},
                {"id": "r1", "type": "result", "title": "R1"},
                {"id": "orphan", "type": "result", "title": "O"}
            ]),
            "q1",
        );
        let catalog = StepCatalog::load(&raw).expect("valid graph");
        let graph = catalog.as_graph().unwrap();
        assert_eq!(graph.unreachable_nodes(), vec![&NodeId("orphan".to_string())]);
        assert_eq!(graph.nodes().count(), 3);
        assert!(graph.node_by_key("r1").unwrap().is_terminal());
    }

    #[test]
    fn load_catalog_from_path_wraps_schema_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", graph(json!([]), "q1")).unwrap();
        let err = load_catalog_from_path(file.path()).expect_err("empty graph");
        let schema_err = err.downcast_ref::<SchemaError>().expect("schema error inside");
        assert!(schema_err.mentions("catalog contains no nodes"));
    }
}
