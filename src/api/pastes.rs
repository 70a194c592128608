use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::{AuthUser, Requester};
use super::validation::{ValidJson, validate_paste_path};
use super::{ApiError, ApiResponse, AppState, MessageResponse, PasteDto};
use crate::models::{CreatePaste, ExpiresIn, PasteChanges};

#[derive(Debug, Deserialize)]
pub struct CreatePasteRequest {
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub language: Option<String>,
    /// Omitted means private.
    #[serde(default)]
    pub is_public: bool,
    /// `null`, `""` and `"never"` all mean the paste never expires.
    #[serde(default)]
    pub expires_in: Option<ExpiresIn>,
    #[serde(default)]
    pub burn_after_read: bool,
}

impl From<CreatePasteRequest> for CreatePaste {
    fn from(req: CreatePasteRequest) -> Self {
        Self {
            title: req.title,
            content: req.content,
            language: req.language,
            is_public: req.is_public,
            expires_in: req.expires_in.unwrap_or_default(),
            burn_after_read: req.burn_after_read,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdatePasteRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

/// POST /paste
pub async fn create_paste(
    State(state): State<Arc<AppState>>,
    Requester(requester): Requester,
    ValidJson(payload): ValidJson<CreatePasteRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PasteDto>>), ApiError> {
    let paste = state
        .paste_service()
        .create(requester.as_ref(), payload.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(PasteDto::from(paste))),
    ))
}

/// GET /paste/{id}
///
/// Accepts an optional extension (`/paste/abc123.py`) which is stripped before
/// lookup and reported back as `language_hint`. Without one the hint is the
/// stored language.
pub async fn get_paste(
    State(state): State<Arc<AppState>>,
    Requester(requester): Requester,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<PasteDto>>, ApiError> {
    let path = validate_paste_path(&raw_id)?;

    let paste = state
        .paste_service()
        .read(path.id, requester.as_ref())
        .await?;

    let hint = path.language_hint.map_or_else(
        || paste.language.clone().unwrap_or_else(|| "plaintext".to_string()),
        str::to_string,
    );

    Ok(Json(ApiResponse::success(
        PasteDto::from(paste).with_language_hint(hint),
    )))
}

/// GET /paste/{id}/raw and /{id}/raw
pub async fn get_raw_paste(
    State(state): State<Arc<AppState>>,
    Requester(requester): Requester,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let path = validate_paste_path(&raw_id)?;

    let paste = state
        .paste_service()
        .read_raw(path.id, requester.as_ref())
        .await?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        paste.content,
    ))
}

/// PUT /paste/{id}
pub async fn update_paste(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(raw_id): Path<String>,
    ValidJson(payload): ValidJson<UpdatePasteRequest>,
) -> Result<Json<ApiResponse<PasteDto>>, ApiError> {
    let path = validate_paste_path(&raw_id)?;

    let changes = PasteChanges::from_fields(
        payload.title,
        payload.content,
        payload.language,
        payload.is_public,
    );

    let paste = state
        .paste_service()
        .update(path.id, Some(&identity), changes)
        .await?;

    Ok(Json(ApiResponse::success(PasteDto::from(paste))))
}

/// DELETE /paste/{id}
pub async fn delete_paste(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let path = validate_paste_path(&raw_id)?;

    state
        .paste_service()
        .delete(path.id, Some(&identity))
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Paste deleted successfully",
    ))))
}

/// POST /paste/{id}/fork
pub async fn fork_paste(
    State(state): State<Arc<AppState>>,
    Requester(requester): Requester,
    Path(raw_id): Path<String>,
) -> Result<(StatusCode, Json<ApiResponse<PasteDto>>), ApiError> {
    let path = validate_paste_path(&raw_id)?;

    let fork = state
        .paste_service()
        .fork(path.id, requester.as_ref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(PasteDto::from(fork))),
    ))
}

/// GET /pastes/recent
pub async fn recent_pastes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<PasteDto>>>, ApiError> {
    let pastes = state.paste_service().list_recent().await?;

    Ok(Json(ApiResponse::success(
        pastes.into_iter().map(PasteDto::from).collect(),
    )))
}
