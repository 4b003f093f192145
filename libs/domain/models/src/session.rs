// [libs/domain/models/src/session.rs]
//! Session/token claims shared between the auth service (C2), the
//! coordinator's auth middleware (C3), and the worker runtime (C5).

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Registered JWT claims for a worker bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerClaims {
    /// `sub` — the worker's `bot_key`.
    pub sub: String,
    /// `aud` — always "workers".
    pub aud: String,
    /// `iss` — issuing coordinator instance.
    pub iss: String,
    /// `iat` — issued-at, Unix seconds.
    pub iat: i64,
    /// `exp` — expiry, Unix seconds.
    pub exp: i64,
    /// `jti` — unique token id.
    pub jti: Uuid,
}

/// Token envelope returned from `issue_token` (§4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEnvelope {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub issued_at: i64,
}

pub const MIN_TOKEN_LIFETIME_SECS: i64 = 600;
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 1800;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifetimeError {
    #[error("requested token lifetime {0}s is outside the allowed [{MIN_TOKEN_LIFETIME_SECS}, {MAX_TOKEN_LIFETIME_SECS}] band")]
    OutOfBand(i64),
}

/// Rejects an issuance lifetime outside `[MIN_TOKEN_LIFETIME_SECS, MAX_TOKEN_LIFETIME_SECS]`.
/// Called at issuance (§4.2) rather than trusted as an always-true assumption, so a future
/// caller that issues at a non-default lifetime can't silently mint an out-of-band token.
pub fn validate_token_lifetime(seconds: i64) -> Result<(), LifetimeError> {
    if (MIN_TOKEN_LIFETIME_SECS..=MAX_TOKEN_LIFETIME_SECS).contains(&seconds) {
        Ok(())
    } else {
        Err(LifetimeError::OutOfBand(seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifetime_within_band_is_accepted() {
        assert!(validate_token_lifetime(MAX_TOKEN_LIFETIME_SECS).is_ok());
        assert!(validate_token_lifetime(MIN_TOKEN_LIFETIME_SECS).is_ok());
    }

    #[test]
    fn lifetime_outside_band_is_rejected() {
        assert_eq!(validate_token_lifetime(59), Err(LifetimeError::OutOfBand(59)));
        assert_eq!(validate_token_lifetime(3600), Err(LifetimeError::OutOfBand(3600)));
    }
}
