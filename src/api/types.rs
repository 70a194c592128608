use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::Paste;
use crate::services::{DashboardCounts, UserInfo};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PasteDto {
    pub id: String,
    pub title: Option<String>,
    pub content: String,
    pub language: Option<String>,
    /// Highlighting language for single-paste reads; omitted in listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_hint: Option<String>,
    pub is_public: bool,
    pub views: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub burn_after_read: bool,
    pub user_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Paste> for PasteDto {
    fn from(paste: Paste) -> Self {
        Self {
            id: paste.id,
            title: paste.title,
            content: paste.content,
            language: paste.language,
            language_hint: None,
            is_public: paste.is_public,
            views: paste.views,
            expires_at: paste.expires_at,
            burn_after_read: paste.burn_after_read,
            user_id: paste.owner.user_id(),
            created_at: paste.created_at,
            updated_at: paste.updated_at,
        }
    }
}

impl PasteDto {
    #[must_use]
    pub fn with_language_hint(mut self, hint: impl Into<String>) -> Self {
        self.language_hint = Some(hint.into());
        self
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserInfo,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserProfileDto {
    pub user: UserInfo,
    pub pastes: Vec<PasteDto>,
}

#[derive(Debug, Serialize)]
pub struct DashboardDto {
    pub username: String,
    pub pastes: Vec<PasteDto>,
    pub counts: DashboardCounts,
}

#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}
