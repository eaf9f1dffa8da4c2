//! Navigation core for the DIRT watch participant guide.
//!
//! Every wizard on the guide site (troubleshooter, Bluetooth pairing, study
//! procedures, app install, welcome) is one `StepCatalog` driven by the same
//! `Navigator`. Around that core sit the host-side pieces: fragment loading
//! with a back stack, mount discovery, the external jump bus and the
//! Bluetooth pairing check. The binaries in `src/bin` are thin CLIs over
//! these modules.

use anyhow::{Result, bail};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub mod builtin;
pub mod catalog;
pub mod host;
pub mod jump;
pub mod navigator;
pub mod pages;
pub mod pairing;
pub mod render;
pub mod runtime;
pub mod schema_loader;

pub use catalog::{
    CatalogKey, CatalogKind, CatalogRepository, SchemaError, StepCatalog, Violation,
    load_catalog_from_path,
};
pub use host::GuideHost;
pub use jump::{JumpBus, JumpHandler, JumpOutcome, JumpTarget, MountId};
pub use navigator::{Command, NavError, NavigationState, Navigator, Snapshot};
pub use pages::{DirFragmentSource, FragmentError, FragmentSource, PageLoader};
pub use pairing::{PairingProbe, PairingReport, ParticipantCode, check_pairing};

pub const ROOT_ENV: &str = "DIRT_GUIDE_ROOT";
const CATALOG_DIR: &str = "catalogs";
const FRAGMENT_DIR: &str = "fragments";
const SCHEMA_FILE: &str = "schema/step_catalog.schema.json";

/// Returns true when `candidate` looks like a content root.
fn is_content_root(candidate: &Path) -> bool {
    candidate.join(CATALOG_DIR).is_dir() || candidate.join(SCHEMA_FILE).is_file()
}

fn root_from_hint(hint: &str) -> Option<PathBuf> {
    if hint.is_empty() {
        return None;
    }
    let hint_path = PathBuf::from(hint);
    if !hint_path.exists() || !is_content_root(&hint_path) {
        return None;
    }
    fs::canonicalize(hint_path).ok()
}

fn search_upwards(start: &Path) -> Option<PathBuf> {
    let mut dir = fs::canonicalize(start).ok()?;
    loop {
        if is_content_root(&dir) {
            return Some(dir);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Locate the content root holding `catalogs/` and `fragments/`.
///
/// Honors `DIRT_GUIDE_ROOT` if it points at a content root, then climbs up
/// from the current executable, then uses the build-time hint.
pub fn find_content_root() -> Result<PathBuf> {
    if let Ok(env_root) = env::var(ROOT_ENV) {
        if let Some(root) = root_from_hint(&env_root) {
            return Ok(root);
        }
    }

    if let Ok(exe_path) = env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            if let Some(root) = search_upwards(exe_dir) {
                return Ok(root);
            }
        }
    }

    if let Some(hint) = option_env!("DIRT_GUIDE_ROOT_HINT") {
        if let Some(root) = root_from_hint(hint) {
            return Ok(root);
        }
    }

    bail!("Unable to locate the guide content root. Set {ROOT_ENV} to a directory containing catalogs/.");
}

pub fn catalog_dir(root: &Path) -> PathBuf {
    root.join(CATALOG_DIR)
}

pub fn fragment_dir(root: &Path) -> PathBuf {
    root.join(FRAGMENT_DIR)
}

/// Catalog files (`*.json`) under `catalogs/`, sorted by path.
pub fn list_catalog_files(root: &Path) -> Result<Vec<PathBuf>> {
    let dir = catalog_dir(root);
    let mut files = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            files.push(path);
        }
    }
    if files.is_empty() {
        bail!("No catalogs found under {}", dir.display());
    }
    files.sort();
    Ok(files)
}

/// Initialise `env_logger` for a binary: `RUST_LOG` wins, else `warn`.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .try_init();
}
