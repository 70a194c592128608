use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};

use super::ApiError;
use crate::models::{language_from_extension, split_extension};

/// Longest id segment accepted in a paste URL, extension included.
const MAX_PASTE_PATH_LENGTH: usize = 64;

/// JSON body extractor whose rejections use the API error envelope
/// (400 with `success: false`) instead of axum's plain-text 422.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::validation(format!("Invalid request: {}", e.body_text())))?;
        Ok(Self(value))
    }
}

/// A paste id taken from the URL, with any trailing extension removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PastePath<'a> {
    pub id: &'a str,
    pub language_hint: Option<&'static str>,
}

pub fn validate_paste_path(raw: &str) -> Result<PastePath<'_>, ApiError> {
    if raw.len() > MAX_PASTE_PATH_LENGTH {
        return Err(ApiError::validation(format!(
            "Invalid paste ID: must be {} characters or less",
            MAX_PASTE_PATH_LENGTH
        )));
    }

    let (id, ext) = split_extension(raw);
    if id.is_empty() {
        return Err(ApiError::validation("Paste ID cannot be empty"));
    }

    // Only the last extension is stripped; `abc.def.rs` looks up `abc.def`.
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(ApiError::validation(format!(
            "Invalid paste ID: {}. IDs can only contain letters, numbers, dots, hyphens, and underscores",
            id
        )));
    }

    Ok(PastePath {
        id,
        language_hint: ext.filter(|e| !e.is_empty()).map(language_from_extension),
    })
}

pub fn validate_username_param(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Username cannot be empty"));
    }
    Ok(trimmed)
}
