//! Holds the catalogs a host knows about, keyed by catalog key.
//!
//! Each navigator gets its own `Arc` to an immutable catalog, so several
//! navigators over the same catalog never share mutable state.

use crate::catalog::identity::CatalogKey;
use crate::catalog::index::StepCatalog;
use crate::navigator::Navigator;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Default)]
/// In-memory store for validated catalogs keyed by `CatalogKey`.
pub struct CatalogRepository {
    catalogs: BTreeMap<CatalogKey, Arc<StepCatalog>>,
}

impl CatalogRepository {
    /// Register a catalog for later lookup. A catalog with the same key is replaced.
    pub fn register(&mut self, catalog: StepCatalog) {
        if let Some(previous) = self
            .catalogs
            .insert(catalog.key().clone(), Arc::new(catalog))
        {
            log::debug!("replaced catalog '{}'", previous.key());
        }
    }

    /// Fetch a catalog by key, if present.
    pub fn get(&self, key: &str) -> Option<&Arc<StepCatalog>> {
        self.catalogs.get(&CatalogKey(key.to_string()))
    }

    /// Build a fresh navigator over a registered catalog.
    pub fn navigator(&self, key: &str) -> Option<Navigator> {
        self.get(key).map(|catalog| Navigator::new(Arc::clone(catalog)))
    }

    /// Iterates catalog keys in stable order.
    pub fn keys(&self) -> impl Iterator<Item = &CatalogKey> {
        self.catalogs.keys()
    }

    pub fn len(&self) -> usize {
        self.catalogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }
}
