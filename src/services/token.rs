//! Signed session tokens (HS256 JWT).
//!
//! Verification never fails loudly: a malformed, forged or expired token just
//! resolves to no identity, and the request proceeds as anonymous.

use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::clock::Clock;

/// The authenticated caller, as asserted by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i32,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &[u8], ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
            clock,
        }
    }

    pub fn issue(&self, user_id: i32, username: &str) -> anyhow::Result<String> {
        let issued_at = self.clock.now();
        let claims = Claims {
            user_id,
            username: username.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to sign token: {e}"))
    }

    #[must_use]
    pub fn verify(&self, token: &str) -> Option<Identity> {
        // Expiry is checked against the injected clock below, not by the library.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        let claims = match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!("Rejected token: {e}");
                return None;
            }
        };

        if claims.exp <= self.clock.now().timestamp() {
            debug!(user_id = claims.user_id, "Rejected expired token");
            return None;
        }

        Some(Identity {
            user_id: claims.user_id,
            username: claims.username,
        })
    }
}
