//! Domain service for the paste lifecycle: create, read, update, delete, fork
//! and listings, with access rules applied on every path.

use serde::Serialize;
use thiserror::Error;

use crate::models::{CreatePaste, Paste, PasteChanges};
use crate::services::policy::{Denial, Gone};
use crate::services::token::Identity;

/// Maximum number of pastes returned by the recent listing.
pub const RECENT_PASTES_LIMIT: u64 = 20;

#[derive(Debug, Error)]
pub enum PasteError {
    #[error("Paste not found")]
    NotFound,

    #[error("Paste has expired")]
    Expired,

    #[error("Paste has been burned after reading")]
    Burned,

    #[error(transparent)]
    Denied(#[from] Denial),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<Gone> for PasteError {
    fn from(gone: Gone) -> Self {
        match gone {
            Gone::Expired => Self::Expired,
            Gone::Burned => Self::Burned,
        }
    }
}

impl From<anyhow::Error> for PasteError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardCounts {
    pub public: u64,
    pub private: u64,
    pub total: u64,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub pastes: Vec<Paste>,
    pub counts: DashboardCounts,
}

#[async_trait::async_trait]
pub trait PasteService: Send + Sync {
    /// Stores a new paste owned by `requester`, or ownerless when anonymous.
    async fn create(
        &self,
        requester: Option<&Identity>,
        input: CreatePaste,
    ) -> Result<Paste, PasteError>;

    /// Full read path: expiry, burn, visibility, then one view is recorded.
    /// The returned paste carries the incremented view count.
    async fn read(&self, id: &str, requester: Option<&Identity>) -> Result<Paste, PasteError>;

    /// Content-only fetch. Checks expiry and visibility but neither records a
    /// view nor burns the paste.
    async fn read_raw(&self, id: &str, requester: Option<&Identity>) -> Result<Paste, PasteError>;

    async fn update(
        &self,
        id: &str,
        requester: Option<&Identity>,
        changes: PasteChanges,
    ) -> Result<Paste, PasteError>;

    async fn delete(&self, id: &str, requester: Option<&Identity>) -> Result<(), PasteError>;

    /// Copies a readable paste into a new public, permanent paste.
    async fn fork(&self, id: &str, requester: Option<&Identity>) -> Result<Paste, PasteError>;

    async fn list_recent(&self) -> Result<Vec<Paste>, PasteError>;

    async fn list_by_owner(&self, user_id: i32, public_only: bool)
    -> Result<Vec<Paste>, PasteError>;

    async fn dashboard(&self, identity: &Identity) -> Result<Dashboard, PasteError>;
}
