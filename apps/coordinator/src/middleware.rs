// [apps/coordinator/src/middleware.rs]
/*!
 * =================================================================
 * APARATO: GALVANIC AUTHENTICATION GUARD (V1.0)
 * CLASIFICACIÓN: SECURITY STRATUM (ESTRATO L4)
 * RESPONSABILIDAD: VALIDACIÓN DE TOKENS RS256 Y PRE-COMPARTIDOS
 * =================================================================
 */

use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use fleet_domain_models::WorkerClaims;
use jsonwebtoken::{decode, Algorithm, Validation};
use tracing::{debug, warn};

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Validates a worker bearer token (RS256) and injects its claims as a
/// request extension for downstream handlers (`/v1/bots/register`).
pub async fn auth_guard(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let token = bearer_token(&req).ok_or(StatusCode::UNAUTHORIZED)?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&["workers"]);

    let decoded = decode::<WorkerClaims>(token, &state.signing_keys.decoding_key, &validation).map_err(|decode_error| {
        warn!("❌ [AUTH_REJECTION]: Token validation failed: {}", decode_error);
        StatusCode::UNAUTHORIZED
    })?;

    debug!("🔑 [AUTH]: Worker {} authenticated via bearer token.", decoded.claims.sub);
    req.extensions_mut().insert(decoded.claims);
    Ok(next.run(req).await)
}

/// Validates the pre-shared operator bearer string against `ADMIN_TOKEN`.
pub async fn admin_guard(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, StatusCode> {
    let token = bearer_token(&req).ok_or(StatusCode::UNAUTHORIZED)?;

    if token != state.config.admin_token {
        warn!("❌ [AUTH_REJECTION]: Admin bearer mismatch.");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(req).await)
}
