//! Catalogs shipped with the crate and the page mounts that host them.
//!
//! The JSON sources live in `catalogs/` and are embedded at compile time, so
//! the guide works without a content root on disk.

use crate::catalog::{CatalogRepository, SchemaError, StepCatalog};
use serde_json::Value;

/// `(catalog key, embedded JSON)` for every builtin catalog.
pub const CATALOGS: &[(&str, &str)] = &[
    (
        "troubleshooter",
        include_str!("../catalogs/troubleshooter.json"),
    ),
    (
        "bluetooth_setup",
        include_str!("../catalogs/bluetooth_setup.json"),
    ),
    (
        "study_procedures",
        include_str!("../catalogs/study_procedures.json"),
    ),
    ("install_app", include_str!("../catalogs/install_app.json")),
    ("welcome", include_str!("../catalogs/welcome.json")),
];

/// Page mount id → catalog key.
pub const MOUNTS: &[(&str, &str)] = &[
    ("ts-root", "troubleshooter"),
    ("bt-wizard-root", "bluetooth_setup"),
    ("spp-wizard-root", "study_procedures"),
    ("install-app-wizard-root", "install_app"),
    ("welcome-wizard-root", "welcome"),
];

pub fn catalog_for_mount(mount: &str) -> Option<&'static str> {
    MOUNTS
        .iter()
        .find(|(id, _)| *id == mount)
        .map(|(_, key)| *key)
}

/// Parse and validate one builtin catalog. `None` when `key` is not builtin.
pub fn load(key: &str) -> Option<Result<StepCatalog, SchemaError>> {
    let (_, raw) = CATALOGS.iter().find(|(name, _)| *name == key)?;
    Some(parse(key, raw))
}

fn parse(key: &str, raw: &str) -> Result<StepCatalog, SchemaError> {
    let value: Value = serde_json::from_str(raw).map_err(|err| {
        SchemaError::single(Some(key.to_string()), "", format!("invalid JSON: {err}"))
    })?;
    StepCatalog::load(&value)
}

/// Repository holding every builtin catalog. Fails on the first invalid one.
pub fn repository() -> Result<CatalogRepository, SchemaError> {
    let mut repo = CatalogRepository::default();
    for (key, raw) in CATALOGS {
        repo.register(parse(key, raw)?);
    }
    Ok(repo)
}
