//! Announcement domain model.
//!
//! # Responsibility
//! - Define the record stored under the `announcements` durable key.
//! - Validate records on construction and on deserialization.
//!
//! # Invariants
//! - `id` is a non-blank string of ASCII digits (epoch-millis derived).
//! - `title` is never blank after trim.
//! - Records read from storage pass `validate()` or are rejected.
//! - Keys this model does not know are kept in `extra` and written back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable identifier of one announcement.
///
/// Wire form is the decimal string of an epoch-millisecond value, so
/// existing mirrors written as `"1700000000000"` keep loading.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnouncementId(String);

impl AnnouncementId {
    /// Builds an id from an epoch-millisecond value.
    pub fn from_millis(value: u64) -> Self {
        Self(value.to_string())
    }

    /// Parses an id from its wire form.
    pub fn parse(value: &str) -> Result<Self, AnnouncementValidationError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AnnouncementValidationError::EmptyId);
        }
        if !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(AnnouncementValidationError::InvalidId(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Numeric value of the id, when it fits in `u64`.
    pub fn as_millis(&self) -> Option<u64> {
        self.0.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AnnouncementId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Author-supplied announcement content without identity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnnouncementDraft {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl AnnouncementDraft {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            author: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

/// Announcement record as held by the store and mirrored to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAnnouncement")]
pub struct Announcement {
    pub id: AnnouncementId,
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Unix epoch milliseconds at creation.
    pub created_at: i64,
    /// Author-supplied fields outside the known set, e.g. `content`, `image`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Announcement {
    /// Builds a validated announcement from a draft and an issued id.
    pub fn from_draft(
        id: AnnouncementId,
        created_at: i64,
        draft: AnnouncementDraft,
    ) -> Result<Self, AnnouncementValidationError> {
        let announcement = Self {
            id,
            title: draft.title,
            body: draft.body,
            author: draft.author,
            created_at,
            extra: Map::new(),
        };
        announcement.validate()?;
        Ok(announcement)
    }

    /// Returns a copy with content replaced by `draft`, keeping identity and
    /// any `extra` fields.
    pub fn replaced_with(
        &self,
        draft: AnnouncementDraft,
    ) -> Result<Self, AnnouncementValidationError> {
        let mut replacement = Self::from_draft(self.id.clone(), self.created_at, draft)?;
        replacement.extra = self.extra.clone();
        Ok(replacement)
    }

    /// Validates record-level invariants.
    pub fn validate(&self) -> Result<(), AnnouncementValidationError> {
        AnnouncementId::parse(self.id.as_str())?;
        if self.title.trim().is_empty() {
            return Err(AnnouncementValidationError::EmptyTitle);
        }
        if self.created_at < 0 {
            return Err(AnnouncementValidationError::NegativeTimestamp(self.created_at));
        }
        Ok(())
    }
}

// Older mirrors only carry `id` and `title`; missing fields get defaults and
// `created_at` falls back to the id's millisecond value.
#[derive(Deserialize)]
struct RawAnnouncement {
    id: String,
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    created_at: Option<i64>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<RawAnnouncement> for Announcement {
    type Error = AnnouncementValidationError;

    fn try_from(raw: RawAnnouncement) -> Result<Self, Self::Error> {
        let id = AnnouncementId::parse(&raw.id)?;
        let created_at = match raw.created_at {
            Some(value) => value,
            None => id
                .as_millis()
                .and_then(|millis| i64::try_from(millis).ok())
                .unwrap_or(0),
        };
        let announcement = Self {
            id,
            title: raw.title,
            body: raw.body,
            author: raw.author,
            created_at,
            extra: raw.extra,
        };
        announcement.validate()?;
        Ok(announcement)
    }
}

/// Validation failures for announcement records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnouncementValidationError {
    EmptyId,
    InvalidId(String),
    EmptyTitle,
    NegativeTimestamp(i64),
}

impl Display for AnnouncementValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "announcement id must not be empty"),
            Self::InvalidId(value) => {
                write!(f, "announcement id must be numeric, got `{value}`")
            }
            Self::EmptyTitle => write!(f, "announcement title must not be blank"),
            Self::NegativeTimestamp(value) => {
                write!(f, "announcement created_at must be >= 0, got {value}")
            }
        }
    }
}

impl Error for AnnouncementValidationError {}

#[cfg(test)]
mod tests {
    use super::{Announcement, AnnouncementDraft, AnnouncementId, AnnouncementValidationError};

    #[test]
    fn id_parse_rejects_non_numeric_values() {
        assert_eq!(
            AnnouncementId::parse("  ").unwrap_err(),
            AnnouncementValidationError::EmptyId
        );
        assert_eq!(
            AnnouncementId::parse("abc").unwrap_err(),
            AnnouncementValidationError::InvalidId("abc".to_string())
        );
        assert_eq!(
            AnnouncementId::parse("1700000000000").unwrap().as_millis(),
            Some(1_700_000_000_000)
        );
    }

    #[test]
    fn from_draft_rejects_blank_title() {
        let err = Announcement::from_draft(
            AnnouncementId::from_millis(1),
            1,
            AnnouncementDraft::new("   ", "body"),
        )
        .unwrap_err();
        assert_eq!(err, AnnouncementValidationError::EmptyTitle);
    }

    #[test]
    fn replaced_with_keeps_identity() {
        let original = Announcement::from_draft(
            AnnouncementId::from_millis(42),
            42,
            AnnouncementDraft::new("old", "old body").with_author("staff"),
        )
        .unwrap();
        let replaced = original
            .replaced_with(AnnouncementDraft::new("new", ""))
            .unwrap();

        assert_eq!(replaced.id, original.id);
        assert_eq!(replaced.created_at, 42);
        assert_eq!(replaced.title, "new");
        assert_eq!(replaced.author, None);
    }

    #[test]
    fn legacy_record_without_created_at_uses_id_millis() {
        let value = serde_json::json!({ "id": "1700000000123", "title": "legacy" });
        let decoded: Announcement = serde_json::from_value(value).unwrap();
        assert_eq!(decoded.created_at, 1_700_000_000_123);
        assert_eq!(decoded.body, "");
        assert!(decoded.extra.is_empty());
    }

    #[test]
    fn unknown_fields_survive_decode_update_and_encode() {
        let value = serde_json::json!({
            "id": "1700000000000",
            "title": "A",
            "content": "hello",
            "image": "x.png"
        });
        let decoded: Announcement = serde_json::from_value(value).unwrap();
        assert_eq!(decoded.extra["content"], "hello");

        let updated = decoded
            .replaced_with(AnnouncementDraft::new("A2", "body"))
            .unwrap();
        let encoded = serde_json::to_value(&updated).unwrap();
        assert_eq!(encoded["title"], "A2");
        assert_eq!(encoded["content"], "hello");
        assert_eq!(encoded["image"], "x.png");
    }
}
