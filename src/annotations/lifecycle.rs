//! Vote tallying and moderation rules
//!
//! Pure functions; persistence is the store's job.

use super::types::{Annotation, AnnotationStatus, ModerationAction, VoteKind};

/// Dislikes at which an annotation is flagged
pub const WARNING_THRESHOLD: u32 = 3;

/// Dislikes at which an annotation is hidden
pub const REMOVAL_THRESHOLD: u32 = 5;

/// Status implied by the dislike count
///
/// Below the warning threshold a flagged annotation recovers to `Active`;
/// otherwise the current status is kept.
pub fn derive_status(current: AnnotationStatus, dislikes: u32) -> AnnotationStatus {
    if dislikes >= REMOVAL_THRESHOLD {
        AnnotationStatus::Removed
    } else if dislikes >= WARNING_THRESHOLD {
        AnnotationStatus::Warning
    } else if matches!(current, AnnotationStatus::Warning | AnnotationStatus::Removed) {
        AnnotationStatus::Active
    } else {
        current
    }
}

/// Count one vote. Likes never touch the dislike-driven status.
pub fn apply_vote(mut annotation: Annotation, vote: VoteKind) -> Annotation {
    match vote {
        VoteKind::Like => {
            annotation.likes = annotation.likes.saturating_add(1);
        }
        VoteKind::Dislike => {
            annotation.dislikes = annotation.dislikes.saturating_add(1);
            annotation.status = derive_status(annotation.status, annotation.dislikes);
        }
    }
    annotation
}

/// Set the status by hand, leaving the counters alone
pub fn apply_moderation(mut annotation: Annotation, action: ModerationAction) -> Annotation {
    annotation.status = match action {
        ModerationAction::Remove => AnnotationStatus::Removed,
        ModerationAction::Warn => AnnotationStatus::Warning,
        ModerationAction::Restore => AnnotationStatus::Active,
    };
    annotation
}
