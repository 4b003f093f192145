// [apps/coordinator/src/kernel.rs]
/*!
 * =================================================================
 * APARATO: COORDINATOR SOVEREIGN KERNEL (V1.0)
 * CLASIFICACIÓN: COMPOSITION ROOT (ESTRATO L1-APP)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN SEGURA
 *
 * Conecta la persistencia (C1), las claves de sesión (C2) y el estado
 * compartido antes de levantar los daemons de recuperación (C4) y el
 * servidor HTTP (C3).
 * =================================================================
 */

use crate::routes::create_sovereign_router;
use crate::services::spawn_recovery_daemons;
use crate::state::{AppState, CoordinatorConfig, SigningKeys};
use fleet_infra_db::TursoClient;
use std::net::{IpAddr, SocketAddr};
use tracing::{error, info, instrument};

pub struct CoordinatorKernel {
    pub server_network_port: u16,
    pub application_state: AppState,
}

impl CoordinatorKernel {
    /// Establishes the database link and loads signing keys before any
    /// service is allowed to start.
    #[instrument(skip(config))]
    pub async fn ignite(config: CoordinatorConfig) -> Self {
        let database_client = TursoClient::connect_with_pool(
            &config.database_url,
            config.database_token.clone(),
            config.database_pool_size,
            std::time::Duration::from_secs(config.database_command_timeout_secs),
        )
        .await
        .expect("FATAL: Database link collapse. Ignition aborted.");

        let signing_keys = SigningKeys::load(&config);
        let server_network_port = config.port;

        Self {
            server_network_port,
            application_state: AppState::new(database_client, config, signing_keys),
        }
    }

    /// Spawns the C4 recovery daemons and blocks serving the HTTP surface.
    pub async fn launch_sovereign_operations(self) {
        let shared_application_state = self.application_state.clone();

        let _daemon_handles = spawn_recovery_daemons(shared_application_state.clone());

        let sovereign_router = create_sovereign_router(shared_application_state);
        let bind_address = SocketAddr::new("0.0.0.0".parse::<IpAddr>().expect("valid literal"), self.server_network_port);

        info!("🚀 [KERNEL_ONLINE]: Coordinator listening at {}", bind_address);

        let tcp_listener = tokio::net::TcpListener::bind(bind_address)
            .await
            .expect("CRITICAL_FAULT: Failed to bind network port.");

        if let Err(server_error) = axum::serve(tcp_listener, sovereign_router).await {
            error!("💀 [KERNEL_COLLAPSE]: Runtime failure: {}", server_error);
            std::process::exit(1);
        }
    }
}
