use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::auth::AuthUser;
use super::validation::validate_username_param;
use super::{ApiError, ApiResponse, AppState, DashboardDto, PasteDto, UserProfileDto};

/// GET /user/{username}
/// Public profile: the user plus their public pastes, newest first.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<UserProfileDto>>, ApiError> {
    let username = validate_username_param(&username)?;

    let user = state.auth_service().get_user_by_username(username).await?;

    let pastes = state.paste_service().list_by_owner(user.id, true).await?;

    Ok(Json(ApiResponse::success(UserProfileDto {
        user,
        pastes: pastes.into_iter().map(PasteDto::from).collect(),
    })))
}

/// GET /dashboard
/// Every paste the caller owns, private ones included, with counts.
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<ApiResponse<DashboardDto>>, ApiError> {
    let dashboard = state.paste_service().dashboard(&identity).await?;

    Ok(Json(ApiResponse::success(DashboardDto {
        username: identity.username,
        pastes: dashboard.pastes.into_iter().map(PasteDto::from).collect(),
        counts: dashboard.counts,
    })))
}
