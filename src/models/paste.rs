use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Length of a generated paste id (hex characters).
pub const PASTE_ID_LENGTH: usize = 8;

pub const MAX_TITLE_LENGTH: usize = 255;

pub const MAX_LANGUAGE_LENGTH: usize = 50;

/// Who a paste belongs to. Anonymous pastes can never pass an ownership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Owned(i32),
    Anonymous,
}

impl Owner {
    #[must_use]
    pub const fn from_user_id(user_id: Option<i32>) -> Self {
        match user_id {
            Some(id) => Self::Owned(id),
            None => Self::Anonymous,
        }
    }

    #[must_use]
    pub const fn user_id(self) -> Option<i32> {
        match self {
            Self::Owned(id) => Some(id),
            Self::Anonymous => None,
        }
    }

    #[must_use]
    pub const fn is_owned_by(self, user_id: i32) -> bool {
        matches!(self, Self::Owned(id) if id == user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paste {
    pub id: String,
    pub title: Option<String>,
    pub content: String,
    pub language: Option<String>,
    pub is_public: bool,
    pub views: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub burn_after_read: bool,
    pub owner: Owner,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Expiry selector accepted on creation.
///
/// Anything outside this set is rejected at deserialization time; the empty
/// string is accepted as a synonym for `never`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExpiresIn {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "1m")]
    OneMonth,
    #[default]
    #[serde(rename = "never", alias = "")]
    Never,
}

impl ExpiresIn {
    #[must_use]
    pub fn duration(self) -> Option<Duration> {
        match self {
            Self::OneHour => Some(Duration::hours(1)),
            Self::OneDay => Some(Duration::hours(24)),
            Self::OneWeek => Some(Duration::days(7)),
            Self::OneMonth => Some(Duration::days(30)),
            Self::Never => None,
        }
    }

    #[must_use]
    pub fn expires_at(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.duration().map(|d| now + d)
    }
}

/// Input for a new paste, as accepted from a caller.
#[derive(Debug, Clone, Default)]
pub struct CreatePaste {
    pub title: Option<String>,
    pub content: String,
    pub language: Option<String>,
    pub is_public: bool,
    pub expires_in: ExpiresIn,
    pub burn_after_read: bool,
}

/// A fully resolved row ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewPaste {
    pub id: String,
    pub title: Option<String>,
    pub content: String,
    pub language: Option<String>,
    pub is_public: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub burn_after_read: bool,
    pub owner: Owner,
    pub created_at: DateTime<Utc>,
}

/// Partial update. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasteChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub language: Option<String>,
    pub is_public: Option<bool>,
}

impl PasteChanges {
    /// Builds a change set where empty strings count as "not provided".
    /// A field therefore cannot be cleared to empty through an update.
    #[must_use]
    pub fn from_fields(
        title: Option<String>,
        content: Option<String>,
        language: Option<String>,
        is_public: Option<bool>,
    ) -> Self {
        Self {
            title: title.filter(|s| !s.is_empty()),
            content: content.filter(|s| !s.is_empty()),
            language: language.filter(|s| !s.is_empty()),
            is_public,
        }
    }
}

/// Splits `abc123.rs` into (`abc123`, Some(`rs`)). Only the last dot counts.
#[must_use]
pub fn split_extension(raw: &str) -> (&str, Option<&str>) {
    match raw.rsplit_once('.') {
        Some((id, ext)) => (id, Some(ext)),
        None => (raw, None),
    }
}

/// Maps a file extension (or language name) to a highlighting language.
#[must_use]
pub fn language_from_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "go" => "go",
        "py" | "python" => "python",
        "js" | "javascript" => "javascript",
        "ts" | "typescript" => "typescript",
        "html" => "html",
        "css" => "css",
        "json" => "json",
        "xml" => "xml",
        "yaml" | "yml" => "yaml",
        "md" | "markdown" => "markdown",
        "sql" => "sql",
        "sh" | "bash" => "bash",
        "c" | "h" => "c",
        "cpp" | "hpp" => "cpp",
        "java" => "java",
        "rs" | "rust" => "rust",
        "rb" | "ruby" => "ruby",
        "php" => "php",
        "swift" => "swift",
        "kt" | "kotlin" => "kotlin",
        "scala" => "scala",
        "r" => "r",
        "lua" => "lua",
        "pl" | "perl" => "perl",
        _ => "plaintext",
    }
}
