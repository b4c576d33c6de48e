//! SQLite storage for annotations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use super::{AnnotationStore, Change};
use crate::annotations::error::{AnnotationError, Result};
use crate::annotations::types::{Annotation, AnnotationFilter, AnnotationStatus, PriceArea};

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_id, date, area, text, author, hour,
           created_at, likes, dislikes, status
    FROM annotations
"#;

/// Durable annotation store backed by one SQLite table
#[derive(Clone)]
pub struct SqliteAnnotationStore {
    pool: SqlitePool,
}

impl SqliteAnnotationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the annotations table and its indexes
    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS annotations (
                id TEXT PRIMARY KEY,
                user_id TEXT,
                date TEXT NOT NULL,
                area TEXT NOT NULL,
                text TEXT NOT NULL,
                author TEXT NOT NULL DEFAULT 'anonymous',
                hour INTEGER,
                created_at TEXT NOT NULL,
                likes INTEGER NOT NULL DEFAULT 0,
                dislikes INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'active'
            );

            CREATE INDEX IF NOT EXISTS idx_annotations_user ON annotations(user_id);
            CREATE INDEX IF NOT EXISTS idx_annotations_date_area ON annotations(date, area);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch_one(conn: &mut SqliteConnection, id: &str) -> Result<Option<Annotation>> {
        let sql = format!("{} WHERE id = ?", SELECT_COLUMNS);
        let row = sqlx::query_as::<_, AnnotationRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        row.map(AnnotationRow::into_annotation).transpose()
    }

    async fn write(conn: &mut SqliteConnection, annotation: &Annotation) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE annotations SET
                user_id = ?, date = ?, area = ?, text = ?, author = ?, hour = ?,
                created_at = ?, likes = ?, dislikes = ?, status = ?
            WHERE id = ?
            "#,
        )
        .bind(&annotation.user_id)
        .bind(&annotation.date)
        .bind(annotation.area.as_str())
        .bind(&annotation.text)
        .bind(&annotation.author)
        .bind(annotation.hour.map(i64::from))
        .bind(annotation.created_at.to_rfc3339())
        .bind(i64::from(annotation.likes))
        .bind(i64::from(annotation.dislikes))
        .bind(annotation.status.as_str())
        .bind(&annotation.id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    async fn change_in_transaction(
        conn: &mut SqliteConnection,
        id: &str,
        change: &Change,
    ) -> Result<Annotation> {
        let current = Self::fetch_one(conn, id)
            .await?
            .ok_or_else(|| AnnotationError::NotFound(id.to_string()))?;

        let changed = change(current)?;
        Self::write(conn, &changed).await?;

        Ok(changed)
    }
}

#[async_trait]
impl AnnotationStore for SqliteAnnotationStore {
    async fn find_all(&self, filter: &AnnotationFilter) -> Result<Vec<Annotation>> {
        let mut sql = format!("{} WHERE 1=1", SELECT_COLUMNS);

        if filter.date.is_some() {
            sql.push_str(" AND date = ?");
        }
        if filter.area.is_some() {
            sql.push_str(" AND area = ?");
        }
        if filter.user_id.is_some() {
            sql.push_str(" AND user_id = ?");
        }
        sql.push_str(" ORDER BY rowid ASC");

        let mut q = sqlx::query_as::<_, AnnotationRow>(&sql);

        if let Some(ref date) = filter.date {
            q = q.bind(date);
        }
        if let Some(area) = filter.area {
            q = q.bind(area.as_str());
        }
        if let Some(ref user_id) = filter.user_id {
            q = q.bind(user_id);
        }

        let rows = q.fetch_all(&self.pool).await?;

        rows.into_iter().map(AnnotationRow::into_annotation).collect()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Annotation>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_one(&mut conn, id).await
    }

    async fn insert(&self, annotation: &Annotation) -> Result<Annotation> {
        sqlx::query(
            r#"
            INSERT INTO annotations (
                id, user_id, date, area, text, author, hour,
                created_at, likes, dislikes, status
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&annotation.id)
        .bind(&annotation.user_id)
        .bind(&annotation.date)
        .bind(annotation.area.as_str())
        .bind(&annotation.text)
        .bind(&annotation.author)
        .bind(annotation.hour.map(i64::from))
        .bind(annotation.created_at.to_rfc3339())
        .bind(i64::from(annotation.likes))
        .bind(i64::from(annotation.dislikes))
        .bind(annotation.status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(annotation.clone())
    }

    async fn update(&self, annotation: &Annotation) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        if Self::write(&mut conn, annotation).await? == 0 {
            return Err(AnnotationError::NotFound(annotation.id.clone()));
        }
        Ok(())
    }

    async fn update_with(&self, id: &str, change: &Change) -> Result<Annotation> {
        let mut conn = self.pool.acquire().await?;

        // Take the write lock up front so concurrent changes to the same
        // row queue on the busy timeout instead of failing to upgrade.
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let result = Self::change_in_transaction(&mut conn, id, change).await;
        let end = if result.is_ok() { "COMMIT" } else { "ROLLBACK" };
        sqlx::query(end).execute(&mut *conn).await?;

        result
    }
}

/// Internal row type for SQLite queries
#[derive(sqlx::FromRow)]
struct AnnotationRow {
    id: String,
    user_id: Option<String>,
    date: String,
    area: String,
    text: String,
    author: String,
    hour: Option<i64>,
    created_at: String,
    likes: i64,
    dislikes: i64,
    status: String,
}

impl AnnotationRow {
    fn into_annotation(self) -> Result<Annotation> {
        let corrupt = |what: &str| {
            AnnotationError::Storage(format!("annotation {} has invalid {}", self.id, what))
        };

        let area: PriceArea = self.area.parse().map_err(|_| corrupt("area"))?;
        let status: AnnotationStatus = self.status.parse().map_err(|_| corrupt("status"))?;
        let hour = self
            .hour
            .map(u8::try_from)
            .transpose()
            .map_err(|_| corrupt("hour"))?;
        let likes = u32::try_from(self.likes).map_err(|_| corrupt("likes"))?;
        let dislikes = u32::try_from(self.dislikes).map_err(|_| corrupt("dislikes"))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|_| corrupt("created_at"))?
            .with_timezone(&Utc);

        Ok(Annotation {
            id: self.id,
            date: self.date,
            area,
            text: self.text,
            author: self.author,
            user_id: self.user_id,
            hour,
            created_at,
            likes,
            dislikes,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::lifecycle;
    use crate::annotations::types::{NewAnnotation, VoteKind};
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::Arc;

    async fn setup_test_db() -> SqliteAnnotationStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteAnnotationStore::new(pool);
        store.init().await.unwrap();
        store
    }

    fn note(date: &str, area: &str, user_id: Option<&str>) -> Annotation {
        NewAnnotation {
            date: date.to_string(),
            area: area.to_string(),
            text: "Price spike".to_string(),
            author: Some("alice".to_string()),
            user_id: user_id.map(str::to_string),
            hour: Some(18),
        }
        .into_annotation()
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = setup_test_db().await;
        let annotation = note("2025-10-30", "SE3", Some("visitor-1"));

        let inserted = store.insert(&annotation).await.unwrap();
        assert_eq!(inserted, annotation);

        let loaded = store.find_by_id(&annotation.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, annotation.id);
        assert_eq!(loaded.area, PriceArea::SE3);
        assert_eq!(loaded.user_id.as_deref(), Some("visitor-1"));
        assert_eq!(loaded.hour, Some(18));
        assert_eq!(loaded.created_at, annotation.created_at);

        assert!(store.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_status_in_row_is_storage_error() {
        let store = setup_test_db().await;
        let annotation = note("2025-10-30", "SE3", None);
        store.insert(&annotation).await.unwrap();

        sqlx::query("UPDATE annotations SET status = 'hidden' WHERE id = ?")
            .bind(&annotation.id)
            .execute(&store.pool)
            .await
            .unwrap();

        let result = store.find_by_id(&annotation.id).await;
        assert!(matches!(result, Err(AnnotationError::Storage(msg)) if msg.contains("status")));
    }

    #[tokio::test]
    async fn test_find_all_filters() {
        let store = setup_test_db().await;
        store.insert(&note("2025-10-30", "SE3", None)).await.unwrap();
        store.insert(&note("2025-10-30", "SE3", Some("visitor-1"))).await.unwrap();
        store.insert(&note("2025-10-31", "SE3", None)).await.unwrap();
        store.insert(&note("2025-10-30", "SE4", Some("visitor-1"))).await.unwrap();

        let by_day_area = store
            .find_all(&AnnotationFilter {
                date: Some("2025-10-30".to_string()),
                area: Some(PriceArea::SE3),
                user_id: None,
            })
            .await
            .unwrap();
        assert_eq!(by_day_area.len(), 2);

        let mine = store
            .find_all(&AnnotationFilter {
                user_id: Some("visitor-1".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);

        let none = store
            .find_all(&AnnotationFilter {
                area: Some(PriceArea::SE1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());

        assert_eq!(store.find_all(&AnnotationFilter::default()).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_update_replaces_and_requires_existing() {
        let store = setup_test_db().await;
        let mut annotation = note("2025-10-30", "SE3", None);
        store.insert(&annotation).await.unwrap();

        annotation.likes = 4;
        annotation.status = AnnotationStatus::Warning;
        store.update(&annotation).await.unwrap();

        let loaded = store.find_by_id(&annotation.id).await.unwrap().unwrap();
        assert_eq!(loaded.likes, 4);
        assert_eq!(loaded.status, AnnotationStatus::Warning);

        let ghost = note("2025-10-30", "SE3", None);
        assert!(matches!(
            store.update(&ghost).await,
            Err(AnnotationError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_with_rolls_back_on_error() {
        let store = setup_test_db().await;
        let annotation = note("2025-10-30", "SE3", None);
        store.insert(&annotation).await.unwrap();

        let failed = store
            .update_with(&annotation.id, &|_| {
                Err(AnnotationError::Storage("boom".to_string()))
            })
            .await;
        assert!(failed.is_err());

        let missing = store
            .update_with("missing", &|a| Ok(lifecycle::apply_vote(a, VoteKind::Like)))
            .await;
        assert!(matches!(missing, Err(AnnotationError::NotFound(_))));

        // The connection is usable again after the rollbacks
        let liked = store
            .update_with(&annotation.id, &|a| Ok(lifecycle::apply_vote(a, VoteKind::Like)))
            .await
            .unwrap();
        assert_eq!(liked.likes, 1);
    }

    #[tokio::test]
    async fn test_concurrent_votes_are_not_lost() {
        let dir = tempfile::TempDir::new().unwrap();
        let url = format!("sqlite:{}", dir.path().join("votes.db").display());
        let pool = crate::db::create_pool(&url).await.unwrap();
        let store = Arc::new(SqliteAnnotationStore::new(pool));
        store.init().await.unwrap();

        let annotation = note("2025-10-30", "SE3", None);
        store.insert(&annotation).await.unwrap();

        let tasks = (0..20).map(|_| {
            let store = store.clone();
            let id = annotation.id.clone();
            tokio::spawn(async move {
                store
                    .update_with(&id, &|a| Ok(lifecycle::apply_vote(a, VoteKind::Dislike)))
                    .await
            })
        });
        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        let loaded = store.find_by_id(&annotation.id).await.unwrap().unwrap();
        assert_eq!(loaded.dislikes, 20);
        assert_eq!(loaded.status, AnnotationStatus::Removed);
    }
}
