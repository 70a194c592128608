//! Domain service for registration, login and identity lookups.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::db::User;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// User info DTO for responses. Never carries the password hash.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserInfo {
    pub id: i32,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            created_at: user.created_at,
        }
    }
}

/// A freshly authenticated user and the token that proves it.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: UserInfo,
    pub token: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an account and signs the new user in.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UsernameTaken`] if the name exists, or
    /// [`AuthError::Validation`] for a bad username or password.
    async fn register(&self, username: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Verifies credentials and issues a token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails.
    async fn login(&self, username: &str, password: &str) -> Result<AuthSession, AuthError>;

    async fn get_user(&self, user_id: i32) -> Result<UserInfo, AuthError>;

    async fn get_user_by_username(&self, username: &str) -> Result<UserInfo, AuthError>;
}
