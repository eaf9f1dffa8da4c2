//! Step catalog wiring.
//!
//! A catalog is the static content behind one navigator: either ordered
//! sections of steps or a graph of question/result nodes. Authored documents
//! live in `model`; `StepCatalog` (in `index`) is the validated form the
//! navigator consumes, and `CatalogRepository` keeps several of them by key.

pub mod error;
pub mod identity;
pub mod index;
pub mod model;
pub mod repository;

pub use error::{SchemaError, Violation};
pub use identity::{CatalogKey, CatalogKind, Layout, NodeId, NodeKind, PathKey, SectionKey};
pub use index::{
    CatalogBody, GraphCatalog, LinearCatalog, Node, NodeBody, Section, StepCatalog, StepPath,
    load_catalog_from_path,
};
pub use model::{Action, Choice, Effect, ImageRef, NodeDocument, SectionDocument, Step};
pub use repository::CatalogRepository;
