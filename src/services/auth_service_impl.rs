//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::Arc;

use crate::config::{AuthConfig, SecurityConfig};
use crate::db::{CreateUserOutcome, Store};
use crate::services::auth_service::{AuthError, AuthService, AuthSession, UserInfo};
use crate::services::token::TokenService;
use async_trait::async_trait;
use tracing::info;

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 50;

pub struct SeaOrmAuthService {
    store: Store,
    tokens: Arc<TokenService>,
    security: SecurityConfig,
    min_password_length: usize,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(
        store: Store,
        tokens: Arc<TokenService>,
        auth: &AuthConfig,
        security: SecurityConfig,
    ) -> Self {
        Self {
            store,
            tokens,
            security,
            min_password_length: auth.min_password_length,
        }
    }

    fn validate_registration(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let len = username.chars().count();
        if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&len) {
            return Err(AuthError::Validation(format!(
                "Username must be between {MIN_USERNAME_LENGTH} and {MAX_USERNAME_LENGTH} characters"
            )));
        }

        if password.chars().count() < self.min_password_length {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters",
                self.min_password_length
            )));
        }

        Ok(())
    }

    fn start_session(&self, user: UserInfo) -> Result<AuthSession, AuthError> {
        let token = self.tokens.issue(user.id, &user.username)?;
        Ok(AuthSession { user, token })
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, username: &str, password: &str) -> Result<AuthSession, AuthError> {
        self.validate_registration(username, password)?;

        let user = match self
            .store
            .create_user(username, password, &self.security)
            .await?
        {
            CreateUserOutcome::Created(user) => user,
            CreateUserOutcome::UsernameTaken => return Err(AuthError::UsernameTaken),
        };

        info!(user_id = user.id, "Registered user {}", user.username);
        metrics::counter!("users_registered_total").increment(1);

        self.start_session(UserInfo::from(user))
    }

    async fn login(&self, username: &str, password: &str) -> Result<AuthSession, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let user = self
            .store
            .verify_user_password(username, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        self.start_session(UserInfo::from(user))
    }

    async fn get_user(&self, user_id: i32) -> Result<UserInfo, AuthError> {
        self.store
            .get_user_by_id(user_id)
            .await?
            .map(UserInfo::from)
            .ok_or(AuthError::UserNotFound)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<UserInfo, AuthError> {
        self.store
            .get_user_by_username(username)
            .await?
            .map(UserInfo::from)
            .ok_or(AuthError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::clock::SystemClock;
    use chrono::Duration;

    async fn service() -> (SeaOrmAuthService, Store, Arc<TokenService>) {
        let path = std::env::temp_dir().join(format!("patbin-auth-test-{}.db", uuid::Uuid::new_v4()));
        let store = Store::new(&format!("sqlite:{}", path.display()))
            .await
            .expect("failed to open store");
        let tokens = Arc::new(TokenService::new(
            b"test-secret",
            Duration::days(7),
            Arc::new(SystemClock),
        ));
        let security = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        };
        let auth = SeaOrmAuthService::new(
            store.clone(),
            tokens.clone(),
            &AuthConfig::default(),
            security,
        );
        (auth, store, tokens)
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (auth, store, tokens) = service().await;

        let session = auth.register("alice", "correct-horse").await.unwrap();
        assert_eq!(session.user.username, "alice");
        assert_eq!(
            tokens.verify(&session.token).map(|i| i.user_id),
            Some(session.user.id)
        );

        let hash = store.get_user_password_hash("alice").await.unwrap().unwrap();
        assert_ne!(hash, "correct-horse");

        let login = auth.login("alice", "correct-horse").await.unwrap();
        assert_eq!(login.user.id, session.user.id);

        for wrong in ["correct-horse ", "Correct-horse", "x", "correct-hors"] {
            assert!(matches!(
                auth.login("alice", wrong).await,
                Err(AuthError::InvalidCredentials)
            ));
        }
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let (auth, _, _) = service().await;
        assert!(matches!(
            auth.login("ghost", "whatever").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_registration_validation() {
        let (auth, _, _) = service().await;

        assert!(matches!(
            auth.register("ab", "long-enough").await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            auth.register(&"x".repeat(51), "long-enough").await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            auth.register("bob", "short").await,
            Err(AuthError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let (auth, _, _) = service().await;
        auth.register("carol", "password1").await.unwrap();
        assert!(matches!(
            auth.register("carol", "password2").await,
            Err(AuthError::UsernameTaken)
        ));
    }
}
