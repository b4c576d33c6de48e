//! Flat-file storage for annotations
//!
//! The whole collection lives in one JSON array. Every mutation rewrites
//! the file, so all access goes through a process-wide mutex.
//!
//! Records are decoded one by one. A record that does not decode is
//! skipped with a warning and written back untouched, so one odd entry
//! never costs the rest of the collection.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::{AnnotationStore, Change};
use crate::annotations::error::{AnnotationError, Result};
use crate::annotations::types::{Annotation, AnnotationFilter};

/// Decoded file contents
#[derive(Debug, Default)]
struct Collection {
    items: Vec<Annotation>,
    /// Records that failed to decode, kept verbatim
    unreadable: Vec<Value>,
}

/// Annotation store backed by a single JSON file
pub struct FileAnnotationStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileAnnotationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the collection. A missing or unreadable file is an empty one.
    async fn load(&self) -> Collection {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Collection::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read annotations file, treating as empty");
                return Collection::default();
            }
        };

        let records: Vec<Value> = match serde_json::from_slice(&bytes) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Annotations file is not a JSON list, treating as empty");
                return Collection::default();
            }
        };

        let mut collection = Collection::default();
        for record in records {
            match serde_json::from_value::<Annotation>(record.clone()) {
                Ok(annotation) => collection.items.push(annotation),
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        id = record.get("id").and_then(serde_json::Value::as_str).unwrap_or("<none>"),
                        error = %e,
                        "Skipping unreadable annotation record"
                    );
                    collection.unreadable.push(record);
                }
            }
        }

        collection
    }

    /// Replace the file contents via a temp file and rename
    async fn save(&self, collection: &Collection) -> Result<()> {
        let mut records = collection
            .items
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        records.extend(collection.unreadable.iter().cloned());
        let json = serde_json::to_vec_pretty(&records)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, &json).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        Ok(())
    }
}

#[async_trait]
impl AnnotationStore for FileAnnotationStore {
    async fn find_all(&self, filter: &AnnotationFilter) -> Result<Vec<Annotation>> {
        let _guard = self.lock.lock().await;
        let collection = self.load().await;

        Ok(collection.items.into_iter().filter(|a| filter.matches(a)).collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Annotation>> {
        let _guard = self.lock.lock().await;
        let collection = self.load().await;

        Ok(collection.items.into_iter().find(|a| a.id == id))
    }

    async fn insert(&self, annotation: &Annotation) -> Result<Annotation> {
        let _guard = self.lock.lock().await;
        let mut collection = self.load().await;

        if collection.items.iter().any(|a| a.id == annotation.id) {
            return Err(AnnotationError::Storage(format!(
                "duplicate annotation id {}",
                annotation.id
            )));
        }

        collection.items.push(annotation.clone());
        self.save(&collection).await?;

        Ok(annotation.clone())
    }

    async fn update(&self, annotation: &Annotation) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut collection = self.load().await;

        let slot = collection
            .items
            .iter_mut()
            .find(|a| a.id == annotation.id)
            .ok_or_else(|| AnnotationError::NotFound(annotation.id.clone()))?;
        *slot = annotation.clone();

        self.save(&collection).await
    }

    async fn update_with(&self, id: &str, change: &Change) -> Result<Annotation> {
        let _guard = self.lock.lock().await;
        let mut collection = self.load().await;

        let slot = collection
            .items
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| AnnotationError::NotFound(id.to_string()))?;
        let changed = change(slot.clone())?;
        *slot = changed.clone();

        self.save(&collection).await?;

        Ok(changed)
    }
}
