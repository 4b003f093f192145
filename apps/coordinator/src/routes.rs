// [apps/coordinator/src/routes.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN ROUTING MATRIX (V1.0)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: TOPOLOGÍA HTTP COMPLETA DEL COORDINADOR (§6.1)
 * =================================================================
 */

use crate::handlers::{admin, auth, bots, health, jobs};
use crate::middleware::{admin_guard, auth_guard};
use crate::state::AppState;
use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn create_sovereign_router(application_shared_state: AppState) -> Router {
    let network_security_shield = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, "Idempotency-Key".parse().expect("ASCII header name")])
        .max_age(Duration::from_secs(3600));

    // C2: emisión de tokens y publicación de claves — sin autenticación previa.
    let auth_stratum = Router::new()
        .route("/token", post(auth::issue_token))
        .route("/.well-known/jwks", get(auth::jwks));

    // C3: registro autenticado con bearer de trabajador — único endpoint bajo /v1 fuera de auth.
    let authenticated_worker_stratum = Router::new()
        .route("/v1/bots/register", post(bots::register))
        .layer(middleware::from_fn_with_state(application_shared_state.clone(), auth_guard));

    // C3: superficie operacional sin requerir el handshake de token — el
    // `bot_id` de sesión es la credencial portadora tras el registro.
    let worker_operations_stratum = Router::new()
        .route("/bots/heartbeat", post(bots::heartbeat))
        .route("/jobs/claim", post(jobs::claim))
        .route("/jobs/:id/start", post(jobs::start))
        .route("/jobs/:id/complete", post(jobs::complete))
        .route("/jobs/:id/fail", post(jobs::fail))
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/:id", get(jobs::get_job))
        .route("/bots", get(bots::list_workers))
        .route("/bots/:id/stats", get(bots::get_worker_stats));

    // Operaciones administrativas: bearer pre-compartido (§6.1).
    let admin_stratum = Router::new()
        .route("/jobs/populate", post(jobs::populate))
        .route("/bots/:id", axum::routing::delete(bots::soft_delete))
        .route("/bots/:id/reset", post(bots::reset))
        .route("/bots/:id/restart", post(bots::reset))
        .route("/bots/:id/assign-operation", post(bots::assign_operation))
        .route("/admin/cleanup", post(admin::cleanup))
        .route("/admin/recover-jobs", post(admin::recover_jobs))
        .route("/admin/query", post(admin::query))
        .layer(middleware::from_fn_with_state(application_shared_state.clone(), admin_guard));

    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/metrics", get(health::metrics))
        .nest("/v1/auth", auth_stratum)
        .merge(authenticated_worker_stratum)
        .merge(worker_operations_stratum)
        .merge(admin_stratum)
        .layer(TraceLayer::new_for_http())
        .layer(network_security_shield)
        .with_state(application_shared_state)
}
