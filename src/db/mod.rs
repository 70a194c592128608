use crate::config::SecurityConfig;
use crate::models::{NewPaste, Paste, PasteChanges};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::user::{CreateUserOutcome, User};

/// Persistence capabilities the paste lifecycle needs. `Store` is the SQLite
/// implementation; the orchestrator only ever sees this trait.
#[async_trait]
pub trait PasteStore: Send + Sync {
    async fn paste_exists(&self, id: &str) -> Result<bool>;

    async fn insert_paste(&self, paste: NewPaste) -> Result<Paste>;

    async fn get_paste(&self, id: &str) -> Result<Option<Paste>>;

    async fn update_paste(
        &self,
        id: &str,
        changes: &PasteChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Paste>>;

    async fn delete_paste(&self, id: &str) -> Result<bool>;

    /// Returns false when nothing was updated (paste gone, or `expected_views`
    /// no longer matched).
    async fn increment_paste_views(&self, id: &str, expected_views: Option<i64>) -> Result<bool>;

    async fn list_recent_public_pastes(&self, limit: u64) -> Result<Vec<Paste>>;

    async fn list_pastes_by_owner(&self, user_id: i32, public_only: bool) -> Result<Vec<Paste>>;

    async fn count_pastes_by_owner(&self, user_id: i32, is_public: bool) -> Result<u64>;
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn paste_repo(&self) -> repositories::paste::PasteRepository {
        repositories::paste::PasteRepository::new(self.conn.clone())
    }

    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<CreateUserOutcome> {
        self.user_repo().create(username, password, security).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn get_user_password_hash(&self, username: &str) -> Result<Option<String>> {
        self.user_repo().get_password_hash(username).await
    }
}

#[async_trait]
impl PasteStore for Store {
    async fn paste_exists(&self, id: &str) -> Result<bool> {
        self.paste_repo().exists(id).await
    }

    async fn insert_paste(&self, paste: NewPaste) -> Result<Paste> {
        self.paste_repo().insert(paste).await
    }

    async fn get_paste(&self, id: &str) -> Result<Option<Paste>> {
        self.paste_repo().get(id).await
    }

    async fn update_paste(
        &self,
        id: &str,
        changes: &PasteChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Paste>> {
        self.paste_repo().update(id, changes, now).await
    }

    async fn delete_paste(&self, id: &str) -> Result<bool> {
        self.paste_repo().delete(id).await
    }

    async fn increment_paste_views(&self, id: &str, expected_views: Option<i64>) -> Result<bool> {
        self.paste_repo().increment_views(id, expected_views).await
    }

    async fn list_recent_public_pastes(&self, limit: u64) -> Result<Vec<Paste>> {
        self.paste_repo().list_public_recent(limit).await
    }

    async fn list_pastes_by_owner(&self, user_id: i32, public_only: bool) -> Result<Vec<Paste>> {
        self.paste_repo().list_by_owner(user_id, public_only).await
    }

    async fn count_pastes_by_owner(&self, user_id: i32, is_public: bool) -> Result<u64> {
        self.paste_repo().count_by_owner(user_id, is_public).await
    }
}
