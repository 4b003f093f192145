// [apps/coordinator/src/bin/migrator.rs]
/*!
 * =================================================================
 * APARATO: DB MIGRATOR CLI (V1.0)
 * CLASIFICACIÓN: OPS INFRASTRUCTURE (ESTRATO L6)
 * RESPONSABILIDAD: APLICACIÓN IDEMPOTENTE DEL ESQUEMA (C1)
 * =================================================================
 */

use dotenvy::dotenv;
use fleet_infra_db::schema::apply_schema;
use fleet_infra_db::TursoClient;
use fleet_shared_observability::init_tracing;
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing("fleet_migrator");

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async {
        info!("🚀 [MIGRATOR]: Initiating schema audit...");

        let database_url = std::env::var("DATABASE_URL").expect("CRITICAL_FAULT: DATABASE_URL undefined in terminal context.");
        let database_token = std::env::var("TURSO_AUTH_TOKEN").ok();

        let database_client = match TursoClient::connect(&database_url, database_token).await {
            Ok(client) => client,
            Err(connection_error) => {
                error!("❌ [UPLINK_FAULT]: Failed to establish link to the database: {}", connection_error);
                return Err(anyhow::anyhow!(connection_error));
            }
        };

        let database_connection = database_client.get_connection().map_err(|error| anyhow::anyhow!("POOL_EXHAUSTED: {}", error))?;

        match apply_schema(&database_connection).await {
            Ok(_) => {
                info!("✨ [MIGRATOR_SUCCESS]: Schema is current.");
                Ok(())
            }
            Err(schema_fault) => {
                error!("💀 [SCHEMA_COLLAPSE]: Fatal structural error: {}", schema_fault);
                std::process::exit(1);
            }
        }
    })
}
