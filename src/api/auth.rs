use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;

use super::validation::ValidJson;
use super::{ApiError, ApiResponse, AppState, AuthResponse, MessageResponse};
use crate::config::Config;
use crate::services::{AuthError, AuthSession, Identity, UserInfo};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the caller's identity from the token cookie, falling back to an
/// `Authorization: Bearer` header. Never rejects: requests with a missing or
/// invalid token simply proceed anonymously.
pub async fn identity_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_token(request.headers(), &state.config().auth.cookie_name)
        && let Some(identity) = state.tokens().verify(&token)
    {
        tracing::Span::current().record("user_id", identity.user_id);
        request.extensions_mut().insert(identity);
    }

    next.run(request).await
}

fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(cookie_name) {
        return Some(cookie.value().to_string()).filter(|t| !t.is_empty());
    }

    if let Some(auth_header) = headers.get(AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string()).filter(|t| !t.is_empty());
    }

    None
}

// ============================================================================
// Extractors
// ============================================================================

/// The caller's identity if one was established, `None` for anonymous callers.
#[derive(Debug, Clone)]
pub struct Requester(pub Option<Identity>);

impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Identity>().cloned()))
    }
}

/// Requires an established identity; rejects anonymous callers with 401.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(Self)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

// ============================================================================
// Cookies
// ============================================================================

fn token_cookie(config: &Config, token: String) -> Cookie<'static> {
    Cookie::build((config.auth.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(config.server.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(config.auth.token_ttl_days))
        .build()
}

fn session_response(
    state: &AppState,
    jar: CookieJar,
    session: AuthSession,
    message: &str,
) -> (CookieJar, Json<ApiResponse<AuthResponse>>) {
    let jar = jar.add(token_cookie(state.config(), session.token.clone()));
    let body = ApiResponse::success(AuthResponse {
        message: message.to_string(),
        user: session.user,
        token: session.token,
    });
    (jar, Json(body))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidJson(payload): ValidJson<CredentialsRequest>,
) -> Result<(StatusCode, CookieJar, Json<ApiResponse<AuthResponse>>), ApiError> {
    let session = state
        .auth_service()
        .register(&payload.username, &payload.password)
        .await?;

    let (jar, body) = session_response(&state, jar, session, "Registration successful");
    Ok((StatusCode::CREATED, jar, body))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidJson(payload): ValidJson<CredentialsRequest>,
) -> Result<(CookieJar, Json<ApiResponse<AuthResponse>>), ApiError> {
    let session = state
        .auth_service()
        .login(&payload.username, &payload.password)
        .await?;

    Ok(session_response(&state, jar, session, "Login successful"))
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<MessageResponse>>) {
    // Added unconditionally: `CookieJar::remove` only emits a removal for
    // cookies that arrived with the request.
    let mut removal = Cookie::build((state.config().auth.cookie_name.clone(), ""))
        .path("/")
        .http_only(true)
        .build();
    removal.make_removal();

    let jar = jar.add(removal);
    (
        jar,
        Json(ApiResponse::success(MessageResponse::new(
            "Logged out successfully",
        ))),
    )
}

/// GET /auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let user = state
        .auth_service()
        .get_user(identity.user_id)
        .await
        .map_err(|e| match e {
            // The token outlived its account.
            AuthError::UserNotFound => ApiError::unauthorized("User not found"),
            other => other.into(),
        })?;

    Ok(Json(ApiResponse::success(user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_token_prefers_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("patbin_token=from-cookie"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));

        assert_eq!(
            extract_token(&headers, "patbin_token").as_deref(),
            Some("from-cookie")
        );
    }

    #[test]
    fn test_extract_token_falls_back_to_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("other=value"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer  abc.def "));

        assert_eq!(
            extract_token(&headers, "patbin_token").as_deref(),
            Some("abc.def")
        );
    }

    #[test]
    fn test_extract_token_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token(&headers, "patbin_token"), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(extract_token(&headers, "patbin_token"), None);
    }

    #[test]
    fn test_token_cookie_attributes() {
        let config = Config::default();
        let cookie = token_cookie(&config, "tok".to_string());

        assert_eq!(cookie.name(), "patbin_token");
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(7)));
    }
}
