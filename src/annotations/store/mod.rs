//! Annotation persistence
//!
//! One contract, two interchangeable backends: SQLite for durable storage
//! and a single JSON file for small or bootstrap deployments.

mod file;
mod sqlite;

pub use file::FileAnnotationStore;
pub use sqlite::SqliteAnnotationStore;

use async_trait::async_trait;

use super::error::Result;
use super::types::{Annotation, AnnotationFilter};

/// Pure change applied to a stored annotation inside one unit of work
pub type Change = dyn Fn(Annotation) -> Result<Annotation> + Send + Sync;

/// Trait for annotation storage backends
#[async_trait]
pub trait AnnotationStore: Send + Sync {
    /// All annotations matching every field set in `filter`
    async fn find_all(&self, filter: &AnnotationFilter) -> Result<Vec<Annotation>>;

    /// Look up a single annotation
    async fn find_by_id(&self, id: &str) -> Result<Option<Annotation>>;

    /// Persist a new annotation exactly as given
    async fn insert(&self, annotation: &Annotation) -> Result<Annotation>;

    /// Replace the stored record with the same id
    ///
    /// Fails with `NotFound` when no record has that id.
    async fn update(&self, annotation: &Annotation) -> Result<()>;

    /// Load, change and write back one record atomically
    ///
    /// Either the changed record is persisted and returned, or nothing is
    /// written. Fails with `NotFound` when no record has that id.
    async fn update_with(&self, id: &str, change: &Change) -> Result<Annotation>;
}

/// Which backend a store is
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    File,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Sqlite => "sqlite",
            StorageBackend::File => "file",
        }
    }
}
