//! JSON Schema loader for step catalogs.
//!
//! The crate embeds `schema/step_catalog.schema.json` so builtin catalogs can
//! be checked without a content root; hosts that ship their own copy can
//! load it from disk instead. Either way the structural pass produces the
//! same `Violation` list as the semantic pass in `catalog::index`.

use crate::catalog::Violation;
use anyhow::{Context, Result, anyhow};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::OnceLock;

pub(crate) const EMBEDDED_CATALOG_SCHEMA: &str =
    include_str!("../schema/step_catalog.schema.json");

/// Where the accepted `schema_version` lives inside the schema payload.
pub const SCHEMA_VERSION_POINTER: &str = "/properties/schema_version/const";

/// Compiled catalog schema plus the catalog version it accepts.
pub struct CatalogSchema {
    schema_version: String,
    compiled: JSONSchema,
}

impl CatalogSchema {
    /// Compile the schema bundled with the crate.
    pub fn embedded() -> Result<Self> {
        let value: Value = serde_json::from_str(EMBEDDED_CATALOG_SCHEMA)
            .context("parsing embedded catalog schema")?;
        Self::from_value(&value, "embedded catalog schema")
    }

    /// Load and compile a schema file.
    pub fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("opening schema {}", path.display()))?;
        let value: Value = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing schema {}", path.display()))?;
        Self::from_value(&value, &format!("schema {}", path.display()))
    }

    fn from_value(value: &Value, origin: &str) -> Result<Self> {
        let schema_version = extract_schema_version(value, SCHEMA_VERSION_POINTER)
            .ok_or_else(|| anyhow!("{origin} missing schema_version const"))?;
        // Compile errors borrow the schema value; render them before it drops.
        let compiled =
            JSONSchema::compile(value).map_err(|err| anyhow!("compiling {origin}: {err}"))?;
        Ok(Self {
            schema_version,
            compiled,
        })
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    /// Validate `instance`, returning every structural violation found.
    pub fn check(&self, instance: &Value) -> Vec<Violation> {
        match self.compiled.validate(instance) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|err| Violation::new(err.instance_path.to_string(), err.to_string()))
                .collect(),
        }
    }
}

/// Process-wide compiled copy of the embedded schema.
pub(crate) fn embedded_schema() -> Result<&'static CatalogSchema, String> {
    static SCHEMA: OnceLock<Result<CatalogSchema, String>> = OnceLock::new();
    SCHEMA
        .get_or_init(|| CatalogSchema::embedded().map_err(|err| format!("{err:#}")))
        .as_ref()
        .map_err(Clone::clone)
}

fn extract_schema_version(schema: &Value, pointer: &str) -> Option<String> {
    let version = schema.pointer(pointer).and_then(Value::as_str)?;
    if version
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        Some(version.to_string())
    } else {
        None
    }
}
