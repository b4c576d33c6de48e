//! Annotation service
//!
//! Entry point for the HTTP layer. Binds one storage backend, chosen when
//! the service is built, to the vote and moderation rules.

use std::sync::Arc;

use serde::Serialize;

use super::error::{AnnotationError, Result};
use super::lifecycle;
use super::store::{AnnotationStore, FileAnnotationStore, SqliteAnnotationStore, StorageBackend};
use super::types::{
    Annotation, AnnotationFilter, AnnotationStatus, ModerationAction, NewAnnotation, VoteKind,
};
use crate::config::AnnotationsConfig;
use crate::db;

/// Annotation counts for the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnotationStats {
    pub annotation_count: usize,
    pub active: usize,
    pub warning: usize,
    pub removed: usize,
}

/// List, create, vote on and moderate annotations
#[derive(Clone)]
pub struct AnnotationService {
    store: Arc<dyn AnnotationStore>,
    backend: StorageBackend,
}

impl AnnotationService {
    /// Wrap an already opened store
    pub fn new(store: Arc<dyn AnnotationStore>, backend: StorageBackend) -> Self {
        Self { store, backend }
    }

    /// Open the configured backend
    ///
    /// If SQLite cannot be opened and fallback is enabled, the flat file is
    /// used instead. The choice is final for the lifetime of the service.
    pub async fn from_config(config: &AnnotationsConfig) -> Result<Self> {
        match config.backend {
            StorageBackend::File => Ok(Self::file(config)),
            StorageBackend::Sqlite => match Self::sqlite(&config.database_url).await {
                Ok(service) => Ok(service),
                Err(e) if config.fallback_to_file => {
                    tracing::warn!(
                        error = %e,
                        path = %config.file_path.display(),
                        "SQLite backend unavailable, using annotations file"
                    );
                    Ok(Self::file(config))
                }
                Err(e) => Err(e),
            },
        }
    }

    async fn sqlite(database_url: &str) -> Result<Self> {
        let pool = db::create_pool(database_url).await?;
        let store = SqliteAnnotationStore::new(pool);
        store.init().await?;

        tracing::info!(url = %database_url, "Annotations stored in SQLite");
        Ok(Self::new(Arc::new(store), StorageBackend::Sqlite))
    }

    fn file(config: &AnnotationsConfig) -> Self {
        let store = FileAnnotationStore::new(&config.file_path);
        tracing::info!(path = %store.path().display(), "Annotations stored in JSON file");
        Self::new(Arc::new(store), StorageBackend::File)
    }

    /// The backend chosen at construction
    pub fn backend(&self) -> StorageBackend {
        self.backend
    }

    pub async fn list(&self, filter: &AnnotationFilter) -> Result<Vec<Annotation>> {
        self.store.find_all(filter).await
    }

    pub async fn get(&self, id: &str) -> Result<Annotation> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AnnotationError::NotFound(id.to_string()))
    }

    /// Validate a submission and store it as a new active annotation
    pub async fn create(&self, new: NewAnnotation) -> Result<Annotation> {
        let annotation = new.into_annotation()?;
        let created = self.store.insert(&annotation).await?;

        tracing::info!(
            annotation_id = %created.id,
            date = %created.date,
            area = %created.area,
            has_user = created.user_id.is_some(),
            "Annotation created"
        );
        Ok(created)
    }

    /// Count a `like` or `dislike` and re-derive the status
    pub async fn vote(&self, id: &str, vote: &str) -> Result<Annotation> {
        let vote: VoteKind = vote.parse()?;
        let updated = self
            .store
            .update_with(id, &move |a| Ok(lifecycle::apply_vote(a, vote)))
            .await?;

        tracing::debug!(
            annotation_id = %id,
            vote = ?vote,
            likes = updated.likes,
            dislikes = updated.dislikes,
            status = %updated.status,
            "Vote recorded"
        );
        Ok(updated)
    }

    /// Apply `remove`, `warn` or `restore`
    pub async fn moderate(&self, id: &str, action: &str) -> Result<Annotation> {
        let action: ModerationAction = action.parse()?;
        let updated = self
            .store
            .update_with(id, &move |a| Ok(lifecycle::apply_moderation(a, action)))
            .await?;

        tracing::info!(annotation_id = %id, action = ?action, status = %updated.status, "Annotation moderated");
        Ok(updated)
    }

    pub async fn stats(&self) -> Result<AnnotationStats> {
        let annotations = self.store.find_all(&AnnotationFilter::default()).await?;

        let mut stats = AnnotationStats {
            annotation_count: annotations.len(),
            ..Default::default()
        };
        for annotation in &annotations {
            match annotation.status {
                AnnotationStatus::Active => stats.active += 1,
                AnnotationStatus::Warning => stats.warning += 1,
                AnnotationStatus::Removed => stats.removed += 1,
            }
        }

        Ok(stats)
    }
}
