// [apps/coordinator/src/main.rs]
/*!
 * =================================================================
 * APARATO: COORDINATOR MAIN ENTRY POINT (V1.0)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L3)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN SEGURA
 * =================================================================
 */

use dotenvy::dotenv;
use fleet_coordinator::prelude::*;
use fleet_coordinator::state::CoordinatorConfig;
use fleet_shared_observability::init_tracing;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing("fleet_coordinator");

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async {
        info!("🛰️  [COORDINATOR]: Global ignition sequence starting...");

        let config = CoordinatorConfig::from_env();
        let port = config.port;
        let kernel = CoordinatorKernel::ignite(config).await;

        info!("🚀 [COORDINATOR_ONLINE]: System fully operational on port {}.", port);
        kernel.launch_sovereign_operations().await;

        Ok(())
    })
}
