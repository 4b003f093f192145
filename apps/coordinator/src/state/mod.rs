// [apps/coordinator/src/state/mod.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN STATE ORCHESTRATOR (V1.0)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: COMPOSICIÓN DE REPOSITORIOS, CREDENCIALES Y CONFIGURACIÓN
 *
 * Placa base neural donde se conectan la persistencia (C1), el emisor de
 * tokens (C2) y el enrutador HTTP (C3). Una única instancia clonable
 * (todos los campos son Arc/tipos Copy) se inyecta en cada handler de Axum.
 * =================================================================
 */

pub mod config;
pub mod rate_limiter;

use fleet_infra_db::{AuthPrincipalRepository, IdempotencyRepository, JobRepository, ResultRepository, TursoClient, WorkerRepository};
use jsonwebtoken::{DecodingKey, EncodingKey};
use std::sync::Arc;
use tracing::debug;

pub use config::CoordinatorConfig;
pub use rate_limiter::AuthRateLimiter;

/// Key material for C2's RS256 token signing, held in memory for the life
/// of the process. The private key never leaves this struct.
pub struct SigningKeys {
    pub encoding_key: EncodingKey,
    pub decoding_key: DecodingKey,
    pub kid: String,
    pub modulus_b64: String,
    pub exponent_b64: String,
}

impl SigningKeys {
    /// Loads the RS256 keypair from the paths named in `config`. The JWKS
    /// modulus/exponent are read directly from config rather than derived
    /// from the PEM at runtime — `jsonwebtoken` has no public-key
    /// introspection API, so the operator provisioning the keypair supplies
    /// its base64url components alongside the PEM files.
    pub fn load(config: &CoordinatorConfig) -> Self {
        let private_pem = std::fs::read(&config.jwt_signing_key_path)
            .unwrap_or_else(|e| panic!("CRITICAL_FAULT: cannot read JWT_SIGNING_KEY_PATH [{}]: {e}", config.jwt_signing_key_path));
        let public_pem = std::fs::read(&config.jwt_public_key_path)
            .unwrap_or_else(|e| panic!("CRITICAL_FAULT: cannot read JWT_PUBLIC_KEY_PATH [{}]: {e}", config.jwt_public_key_path));

        Self {
            encoding_key: EncodingKey::from_rsa_pem(&private_pem).expect("CRITICAL_FAULT: malformed RSA private key PEM."),
            decoding_key: DecodingKey::from_rsa_pem(&public_pem).expect("CRITICAL_FAULT: malformed RSA public key PEM."),
            kid: config.jwt_kid.clone(),
            modulus_b64: config.jwt_jwk_modulus_b64.clone(),
            exponent_b64: config.jwt_jwk_exponent_b64.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub database_client: TursoClient,
    pub config: Arc<CoordinatorConfig>,
    pub signing_keys: Arc<SigningKeys>,
    pub auth_rate_limiter: Arc<AuthRateLimiter>,
}

impl AppState {
    pub fn new(database_client: TursoClient, config: CoordinatorConfig, signing_keys: SigningKeys) -> Self {
        debug!("🧬 [APP_STATE]: Executing sovereign ignition sequence...");
        Self {
            database_client,
            config: Arc::new(config),
            signing_keys: Arc::new(signing_keys),
            auth_rate_limiter: Arc::new(AuthRateLimiter::new()),
        }
    }

    pub fn jobs(&self) -> Result<JobRepository, fleet_infra_db::DbError> {
        Ok(JobRepository::new(self.database_client.get_connection()?))
    }

    pub fn workers(&self) -> Result<WorkerRepository, fleet_infra_db::DbError> {
        Ok(WorkerRepository::new(self.database_client.get_connection()?))
    }

    pub fn results(&self) -> Result<ResultRepository, fleet_infra_db::DbError> {
        Ok(ResultRepository::new(self.database_client.get_connection()?))
    }

    pub fn idempotency(&self) -> Result<IdempotencyRepository, fleet_infra_db::DbError> {
        Ok(IdempotencyRepository::new(self.database_client.get_connection()?))
    }

    pub fn auth_principals(&self) -> Result<AuthPrincipalRepository, fleet_infra_db::DbError> {
        Ok(AuthPrincipalRepository::new(self.database_client.get_connection()?))
    }
}
