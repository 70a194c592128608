//! Access rules for pastes. Everything here is pure; side effects (deleting a
//! gone paste, bumping views) belong to the lifecycle service.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::token::Identity;
use crate::models::Paste;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Denial {
    #[error("This paste is private")]
    Private,

    #[error("Authentication required")]
    NotAuthenticated,

    #[error("You can only modify your own pastes")]
    NotOwner,
}

/// Why a stored paste must be treated as nonexistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gone {
    Expired,
    Burned,
}

pub fn can_read(paste: &Paste, requester: Option<&Identity>) -> Result<(), Denial> {
    if paste.is_public {
        return Ok(());
    }

    match requester {
        Some(identity) if paste.owner.is_owned_by(identity.user_id) => Ok(()),
        _ => Err(Denial::Private),
    }
}

pub fn can_mutate(paste: &Paste, requester: Option<&Identity>) -> Result<(), Denial> {
    let identity = requester.ok_or(Denial::NotAuthenticated)?;
    if paste.owner.is_owned_by(identity.user_id) {
        Ok(())
    } else {
        Err(Denial::NotOwner)
    }
}

#[must_use]
pub fn is_expired(paste: &Paste, now: DateTime<Utc>) -> bool {
    paste.expires_at.is_some_and(|at| at <= now)
}

#[must_use]
pub fn is_burned(paste: &Paste) -> bool {
    paste.burn_after_read && paste.views > 0
}

/// Expiry wins over burn; both win over any visibility decision.
#[must_use]
pub fn check_gone(paste: &Paste, now: DateTime<Utc>) -> Option<Gone> {
    if is_expired(paste, now) {
        Some(Gone::Expired)
    } else if is_burned(paste) {
        Some(Gone::Burned)
    } else {
        None
    }
}
