//! Annotation module
//!
//! Visitor notes on the spot price chart, with community voting and
//! manual moderation.
//!
//! # Lifecycle
//!
//! - Every annotation starts `active`
//! - 3 dislikes flag it as `warning`, 5 hide it as `removed`
//! - Moderators can set any status directly; counters are never reset
//! - Nothing is ever physically deleted
//!
//! # Storage
//!
//! - SQLite (durable, default)
//! - A single JSON file (fallback when SQLite cannot be opened at startup)

mod error;
pub mod lifecycle;
mod service;
pub mod store;
mod types;

pub use error::{AnnotationError, Result};
pub use service::{AnnotationService, AnnotationStats};
pub use store::{AnnotationStore, FileAnnotationStore, SqliteAnnotationStore, StorageBackend};
pub use types::{
    Annotation, AnnotationFilter, AnnotationStatus, ModerationAction, NewAnnotation, PriceArea,
    UnknownStatus, VoteKind, ANONYMOUS_AUTHOR,
};
