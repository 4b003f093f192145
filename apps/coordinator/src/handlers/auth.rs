// [apps/coordinator/src/handlers/auth.rs]
//! C2: issues and publishes verification keys for short-lived worker
//! bearer tokens. Unknown-key and wrong-secret responses are byte-identical
//! (§4.2) — both fall through to the same `Unauthenticated` branch.

use crate::errors::CoordinatorError;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use fleet_domain_models::{validate_token_lifetime, TokenEnvelope, WorkerClaims, MAX_TOKEN_LIFETIME_SECS};
use jsonwebtoken::{encode, Header};
use pbkdf2::password_hash::{PasswordHash, PasswordVerifier};
use pbkdf2::Pbkdf2;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Deserialize)]
pub struct IssueTokenRequest {
    pub bot_key: String,
    pub bootstrap_secret: String,
}

#[derive(Serialize)]
struct Jwk {
    kty: &'static str,
    alg: &'static str,
    r#use: &'static str,
    kid: String,
    n: String,
    e: String,
}

fn verify_secret(stored_hash: &str, candidate: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Pbkdf2.verify_password(candidate.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

#[instrument(skip(state, request), fields(bot_key = %request.bot_key))]
pub async fn issue_token(State(state): State<AppState>, Json(request): Json<IssueTokenRequest>) -> Result<Json<TokenEnvelope>, CoordinatorError> {
    if let Some(retry_after) = state.auth_rate_limiter.check_locked(&request.bot_key) {
        return Err(CoordinatorError::RateLimited(retry_after));
    }

    let principal = state.auth_principals()?.find_by_bot_key(&request.bot_key).await?;

    let is_valid = match &principal {
        Some(p) => verify_secret(&p.bootstrap_secret_hash, &request.bootstrap_secret),
        None => {
            // Still run a verification pass against a dummy hash so that the
            // wall-clock cost of an unknown key matches that of a known one.
            let _ = verify_secret("$pbkdf2-sha256$i=600000$AAAAAAAAAAAAAAAAAAAAAA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA", &request.bootstrap_secret);
            false
        }
    };

    if !is_valid {
        state.auth_rate_limiter.record_failure(&request.bot_key);
        warn!("❌ [AUTH_REJECTED]: bad credentials for bot_key=[{}]", request.bot_key);
        return Err(CoordinatorError::Unauthenticated);
    }

    if let Some(p) = &principal {
        if !p.enabled {
            state.auth_rate_limiter.record_failure(&request.bot_key);
            warn!("🚫 [AUTH_FORBIDDEN]: principal disabled for bot_key=[{}]", request.bot_key);
            return Err(CoordinatorError::Forbidden("principal disabled".into()));
        }
    }

    state.auth_rate_limiter.record_success(&request.bot_key);

    validate_token_lifetime(MAX_TOKEN_LIFETIME_SECS)
        .map_err(|lifetime_error| CoordinatorError::Unavailable(lifetime_error.to_string()))?;

    let now = Utc::now();
    let claims = WorkerClaims {
        sub: request.bot_key.clone(),
        aud: "workers".to_string(),
        iss: "fleet-coordinator".to_string(),
        iat: now.timestamp(),
        exp: (now + chrono::Duration::seconds(MAX_TOKEN_LIFETIME_SECS)).timestamp(),
        jti: Uuid::new_v4(),
    };

    let mut header = Header::new(jsonwebtoken::Algorithm::RS256);
    header.kid = Some(state.signing_keys.kid.clone());

    let access_token = encode(&header, &claims, &state.signing_keys.encoding_key).map_err(|signing_error| {
        CoordinatorError::Unavailable(format!("token signing failed: {signing_error}"))
    })?;

    info!("🔑 [TOKEN_ISSUED]: bot_key=[{}]", request.bot_key);

    Ok(Json(TokenEnvelope {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: MAX_TOKEN_LIFETIME_SECS,
        issued_at: now.timestamp(),
    }))
}

pub async fn jwks(State(state): State<AppState>) -> Json<Value> {
    let key = Jwk {
        kty: "RSA",
        alg: "RS256",
        r#use: "sig",
        kid: state.signing_keys.kid.clone(),
        n: state.signing_keys.modulus_b64.clone(),
        e: state.signing_keys.exponent_b64.clone(),
    };
    Json(json!({ "keys": [key] }))
}
