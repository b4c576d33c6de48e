//! Annotation types
//!
//! An annotation is a short visitor note pinned to one day of the spot
//! price chart for one Swedish price area.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::AnnotationError;

/// Author recorded when the visitor leaves the name blank
pub const ANONYMOUS_AUTHOR: &str = "anonymous";

/// Calendar date format used for `Annotation::date`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A visitor annotation on the price chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Unique identifier (UUID)
    pub id: String,
    /// Chart day, `YYYY-MM-DD`
    pub date: String,
    /// Price area the note refers to
    pub area: PriceArea,
    /// Note content
    pub text: String,
    /// Display name
    #[serde(default = "default_author")]
    pub author: String,
    /// Anonymous visitor id from the consent cookie
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Hour of the day (0-23) the note points at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u8>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub dislikes: u32,
    #[serde(default)]
    pub status: AnnotationStatus,
}

fn default_author() -> String {
    ANONYMOUS_AUTHOR.to_string()
}

/// Swedish electricity price areas
///
/// Deserialized through `FromStr`, so stored `"se3"` reads as `SE3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum PriceArea {
    SE1,
    SE2,
    SE3,
    SE4,
}

impl PriceArea {
    pub const ALL: [PriceArea; 4] = [PriceArea::SE1, PriceArea::SE2, PriceArea::SE3, PriceArea::SE4];

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceArea::SE1 => "SE1",
            PriceArea::SE2 => "SE2",
            PriceArea::SE3 => "SE3",
            PriceArea::SE4 => "SE4",
        }
    }
}

impl fmt::Display for PriceArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceArea {
    type Err = AnnotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PriceArea::ALL
            .into_iter()
            .find(|area| area.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AnnotationError::Validation(format!("unknown price area '{}'", s)))
    }
}

impl TryFrom<String> for PriceArea {
    type Error = AnnotationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Moderation state of an annotation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum AnnotationStatus {
    #[default]
    Active,
    Warning,
    Removed,
}

impl AnnotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationStatus::Active => "active",
            AnnotationStatus::Warning => "warning",
            AnnotationStatus::Removed => "removed",
        }
    }
}

impl fmt::Display for AnnotationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status string that names none of the known states
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for AnnotationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(AnnotationStatus::Active),
            "warning" => Ok(AnnotationStatus::Warning),
            "removed" => Ok(AnnotationStatus::Removed),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

impl TryFrom<String> for AnnotationStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A visitor vote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteKind {
    Like,
    Dislike,
}

impl FromStr for VoteKind {
    type Err = AnnotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(VoteKind::Like),
            "dislike" => Ok(VoteKind::Dislike),
            other => Err(AnnotationError::InvalidVote(other.to_string())),
        }
    }
}

/// A manual moderation action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    Remove,
    Warn,
    Restore,
}

impl FromStr for ModerationAction {
    type Err = AnnotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "remove" => Ok(ModerationAction::Remove),
            "warn" => Ok(ModerationAction::Warn),
            "restore" => Ok(ModerationAction::Restore),
            other => Err(AnnotationError::InvalidAction(other.to_string())),
        }
    }
}

/// Conjunctive filter for listing annotations; `None` fields match anything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationFilter {
    pub date: Option<String>,
    pub area: Option<PriceArea>,
    pub user_id: Option<String>,
}

impl AnnotationFilter {
    pub fn matches(&self, annotation: &Annotation) -> bool {
        self.date.as_ref().map_or(true, |d| *d == annotation.date)
            && self.area.map_or(true, |a| a == annotation.area)
            && self
                .user_id
                .as_ref()
                .map_or(true, |u| annotation.user_id.as_ref() == Some(u))
    }
}

/// Unvalidated submission from a visitor
#[derive(Debug, Clone, Default)]
pub struct NewAnnotation {
    pub date: String,
    pub area: String,
    pub text: String,
    pub author: Option<String>,
    pub user_id: Option<String>,
    pub hour: Option<u8>,
}

impl NewAnnotation {
    /// Validate the submission and build a fresh, active annotation
    pub fn into_annotation(self) -> Result<Annotation, AnnotationError> {
        let date = required("date", &self.date)?;
        NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|_| {
            AnnotationError::Validation(format!("date '{}' is not YYYY-MM-DD", date))
        })?;
        let area: PriceArea = required("area", &self.area)?.parse()?;
        let text = required("text", &self.text)?;

        if let Some(hour) = self.hour {
            if hour > 23 {
                return Err(AnnotationError::Validation(format!(
                    "hour {} is outside 0-23",
                    hour
                )));
            }
        }

        let author = self
            .author
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(ANONYMOUS_AUTHOR);

        Ok(Annotation {
            id: Uuid::new_v4().to_string(),
            date: date.to_string(),
            area,
            text: text.to_string(),
            author: author.to_string(),
            user_id: self.user_id.filter(|u| !u.is_empty()),
            hour: self.hour,
            created_at: Utc::now(),
            likes: 0,
            dislikes: 0,
            status: AnnotationStatus::Active,
        })
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, AnnotationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AnnotationError::Validation(format!("{} is required", field)));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> NewAnnotation {
        NewAnnotation {
            date: "2025-10-30".to_string(),
            area: "SE3".to_string(),
            text: "Price spike".to_string(),
            author: Some("alice".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_annotation_defaults() {
        let annotation = submission().into_annotation().unwrap();

        assert_eq!(annotation.area, PriceArea::SE3);
        assert_eq!(annotation.status, AnnotationStatus::Active);
        assert_eq!(annotation.likes, 0);
        assert_eq!(annotation.dislikes, 0);
        assert_eq!(annotation.author, "alice");
        assert!(Uuid::parse_str(&annotation.id).is_ok());
    }

    #[test]
    fn test_blank_author_is_anonymous() {
        let mut new = submission();
        new.author = Some("   ".to_string());
        assert_eq!(new.into_annotation().unwrap().author, ANONYMOUS_AUTHOR);

        let mut new = submission();
        new.author = None;
        assert_eq!(new.into_annotation().unwrap().author, ANONYMOUS_AUTHOR);
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        for blank in ["date", "area", "text"] {
            let mut new = submission();
            match blank {
                "date" => new.date = String::new(),
                "area" => new.area = " ".to_string(),
                _ => new.text = String::new(),
            }
            let err = new.into_annotation().unwrap_err();
            assert!(matches!(err, AnnotationError::Validation(_)), "{blank}: {err}");
        }
    }

    #[test]
    fn test_bad_date_area_and_hour() {
        let mut new = submission();
        new.date = "30/10/2025".to_string();
        assert!(matches!(new.into_annotation(), Err(AnnotationError::Validation(_))));

        let mut new = submission();
        new.area = "NO1".to_string();
        assert!(matches!(new.into_annotation(), Err(AnnotationError::Validation(_))));

        let mut new = submission();
        new.hour = Some(24);
        assert!(matches!(new.into_annotation(), Err(AnnotationError::Validation(_))));
    }

    #[test]
    fn test_parse_vote_and_action() {
        assert_eq!("like".parse::<VoteKind>().unwrap(), VoteKind::Like);
        assert_eq!("dislike".parse::<VoteKind>().unwrap(), VoteKind::Dislike);
        assert!(matches!("bogus".parse::<VoteKind>(), Err(AnnotationError::InvalidVote(_))));

        assert_eq!("warn".parse::<ModerationAction>().unwrap(), ModerationAction::Warn);
        assert!(matches!(
            "delete".parse::<ModerationAction>(),
            Err(AnnotationError::InvalidAction(_))
        ));
    }

    #[test]
    fn test_filter_is_conjunctive() {
        let annotation = submission().into_annotation().unwrap();

        assert!(AnnotationFilter::default().matches(&annotation));
        assert!(AnnotationFilter {
            date: Some("2025-10-30".to_string()),
            area: Some(PriceArea::SE3),
            user_id: None,
        }
        .matches(&annotation));
        assert!(!AnnotationFilter {
            date: Some("2025-10-30".to_string()),
            area: Some(PriceArea::SE1),
            user_id: None,
        }
        .matches(&annotation));
        assert!(!AnnotationFilter {
            user_id: Some("visitor-1".to_string()),
            ..Default::default()
        }
        .matches(&annotation));
    }

    #[test]
    fn test_serialization_shape() {
        let annotation = submission().into_annotation().unwrap();
        let json = serde_json::to_value(&annotation).unwrap();

        assert_eq!(json["area"], "SE3");
        assert_eq!(json["status"], "active");
        assert!(json.get("user_id").is_none());
        assert!(json["created_at"].is_string());
    }

    #[test]
    fn test_legacy_record_defaults() {
        let json = r#"{
            "id": "abc",
            "date": "2025-10-30",
            "area": "SE4",
            "text": "old note",
            "hour": null,
            "created_at": "2025-10-30T12:00:00.123456Z"
        }"#;
        let parsed: Annotation = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.author, ANONYMOUS_AUTHOR);
        assert_eq!(parsed.status, AnnotationStatus::Active);
        assert_eq!(parsed.likes, 0);
        assert_eq!(parsed.hour, None);
    }

    #[test]
    fn test_stored_area_and_status_read_case_insensitively() {
        let json = r#"{
            "id": "abc",
            "date": "2025-10-30",
            "area": "se3",
            "text": "old note",
            "created_at": "2025-10-30T12:00:00Z",
            "status": "Warning"
        }"#;
        let parsed: Annotation = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.area, PriceArea::SE3);
        assert_eq!(parsed.status, AnnotationStatus::Warning);

        // Written back in canonical form
        let value = serde_json::to_value(&parsed).unwrap();
        assert_eq!(value["area"], "SE3");
        assert_eq!(value["status"], "warning");

        let bad = json.replace("se3", "SE9");
        assert!(serde_json::from_str::<Annotation>(&bad).is_err());
    }

    #[test]
    fn test_unknown_status_is_a_parse_error() {
        assert_eq!(" Removed ".parse::<AnnotationStatus>(), Ok(AnnotationStatus::Removed));
        assert_eq!(
            "hidden".parse::<AnnotationStatus>(),
            Err(UnknownStatus("hidden".to_string()))
        );
    }
}
