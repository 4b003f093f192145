// [apps/coordinator/src/bin/seed.rs]
/*!
 * =================================================================
 * APARATO: GENESIS FORGE SEEDER (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE UTILITY (ESTRATO L3)
 * RESPONSABILIDAD: APROVISIONAMIENTO DEL PRIMER PRINCIPAL Y TRABAJOS SEMILLA
 *
 * Sin alta autoservicio: un operador aprovisiona `bot_key` +
 * `bootstrap_secret` administrativamente (§4.2.1), análogo al propio
 * binario de sembrado del host.
 * =================================================================
 */

use dotenvy::dotenv;
use fleet_infra_db::repositories::{AuthPrincipalRepository, JobRepository};
use fleet_infra_db::TursoClient;
use pbkdf2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use pbkdf2::Pbkdf2;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt().with_env_filter("info,fleet_infra_db=debug").with_target(false).init();

    info!("💠 [GENESIS_FORGE]: Initiating bootstrap principal provisioning...");

    let database_url = std::env::var("DATABASE_URL").expect("CRITICAL_FAULT: DATABASE_URL is missing in environment.");
    let database_token = std::env::var("TURSO_AUTH_TOKEN").ok();
    let bot_key = std::env::var("SEED_BOT_KEY").unwrap_or_else(|_| "seed-worker-01".to_string());
    let bootstrap_secret = std::env::var("SEED_BOOTSTRAP_SECRET").unwrap_or_else(|_| "change-me-before-prod".to_string());

    let database_client = match TursoClient::connect(&database_url, database_token).await {
        Ok(client) => client,
        Err(e) => {
            error!("❌ [FORGE_FAULT]: UPLINK_COLLAPSE: {}", e);
            return Err(anyhow::anyhow!(e));
        }
    };

    let salt = SaltString::generate(&mut OsRng);
    let secret_hash = Pbkdf2
        .hash_password(bootstrap_secret.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("HASH_FAULT: {e}"))?
        .to_string();

    let principals = AuthPrincipalRepository::new(database_client.get_connection()?);
    principals.create_principal(&bot_key, &secret_hash).await?;
    info!("🔐 [PRINCIPAL_SEEDED]: bot_key=[{}]", bot_key);

    info!("🚀 [FORGE]: Seeding a small batch of liveness-test jobs...");
    let jobs = JobRepository::new(database_client.get_connection()?);
    for (a, b, operation) in [(2, 3, "sum"), (10, 4, "difference"), (6, 7, "product"), (20, 4, "quotient")] {
        jobs.create_job(a, b, operation).await?;
    }

    info!("✅ [GENESIS_COMPLETE]: Bootstrap principal and seed jobs are in place.");
    Ok(())
}
