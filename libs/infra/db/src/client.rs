// [libs/infra/db/src/client.rs]
/*!
 * =================================================================
 * APARATO: DATABASE CONNECTION CLIENT (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GESTIÓN DE ENLACES TÁCTICOS Y PERSISTENCIA ACID
 *
 * # Mathematical Proof (In-Memory Consistency):
 * Para garantizar que el esquema sea visible entre hilos en modo RAM,
 * el cliente detecta URLs de memoria y aplica el ancla de persistencia
 * ANTES de la ejecución del bootstrap, asegurando que las tablas residan
 * en un segmento de memoria compartido durante toda la vida del proceso.
 *
 * El acceso a conexiones está acotado por un semáforo (§4.1: pool con
 * concurrencia acotada) y la aplicación del esquema respeta un tiempo
 * límite de comando (§5) en vez de bloquear indefinidamente el arranque.
 * =================================================================
 */

use crate::errors::DbError;
use crate::schema::apply_schema;
use libsql::{Builder, Connection, Database};
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{error, info, instrument, warn};

/// Default bound on concurrently-outstanding connections when the caller
/// does not specify one (§4.1's "default 5-20 connections").
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// Default ceiling on a single schema-application command (§5).
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// A connection drawn from the bounded pool. The semaphore permit is held
/// for the lifetime of this guard, so the bound reflects connections
/// actually in use by a handler, not merely ones ever opened.
pub struct PooledConnection {
    connection: Connection,
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledConnection {
    type Target = Connection;
    fn deref(&self) -> &Connection {
        &self.connection
    }
}

#[derive(Clone)]
pub struct TursoClient {
    internal_database_driver: Arc<Database>,
    /// Mantiene la base de datos viva en memoria evitando que SQLite la purgue.
    _memory_persistence_anchor: Option<Arc<Connection>>,
    connection_limiter: Arc<Semaphore>,
}

impl TursoClient {
    /// Convenience entry point using the default pool size and command
    /// timeout. Used by the seed/migrator binaries and tests, which have
    /// no configured pool size of their own.
    pub async fn connect(database_connection_url: &str, database_access_token: Option<String>) -> Result<Self, DbError> {
        Self::connect_with_pool(database_connection_url, database_access_token, DEFAULT_POOL_SIZE, DEFAULT_COMMAND_TIMEOUT).await
    }

    #[instrument(skip(database_access_token))]
    pub async fn connect_with_pool(
        database_connection_url: &str,
        database_access_token: Option<String>,
        pool_size: u32,
        command_timeout: Duration,
    ) -> Result<Self, DbError> {
        if database_connection_url.is_empty() {
            return Err(DbError::ConnectionError("CRITICAL_FAULT: DATABASE_URL_UNDEFINED".into()));
        }

        info!("🔌 [DATABASE]: Initiating tactical link synchronization to [{}] (pool_size={})", database_connection_url, pool_size);

        let is_remote = database_connection_url.starts_with("libsql://") ||
                        database_connection_url.starts_with("https://");

        let is_memory = database_connection_url.contains(":memory:") ||
                        database_connection_url.contains("mode=memory");

        let database_driver = if is_remote {
            let token = database_access_token.ok_or_else(|| {
                DbError::ConnectionError("SECURITY_FAULT: Remote access denied (Token missing)".into())
            })?;
            Builder::new_remote(database_connection_url.to_string(), token).build().await
        } else {
            Builder::new_local(database_connection_url).build().await
        }.map_err(|e| DbError::ConnectionError(format!("DRIVER_IGNITION_FAILURE: {}", e)))?;

        let shared_driver = Arc::new(database_driver);
        let mut anchor = None;

        // 🛡️ REPARACIÓN: En modo memoria, abrimos el ancla ANTES que cualquier otra operación
        if is_memory {
            let anchor_conn = shared_driver.connect()
                .map_err(|e| DbError::ConnectionError(format!("ANCHOR_FAULT: {}", e)))?;

            // Aplicamos el esquema directamente sobre el ancla para garantizar persistencia
            Self::apply_schema_within_timeout(&anchor_conn, command_timeout).await?;

            anchor = Some(Arc::new(anchor_conn));
            info!("⚓ [DATABASE]: Memory strata solidified and anchored.");
        } else {
            // En modo Disco/Remoto, usamos una conexión temporal para el bootstrap
            let bootstrap_conn = shared_driver.connect()
                .map_err(|e| DbError::ConnectionError(format!("BOOTSTRAP_LINK_FAULT: {}", e)))?;
            Self::apply_schema_within_timeout(&bootstrap_conn, command_timeout).await?;
        }

        Ok(Self {
            internal_database_driver: shared_driver,
            _memory_persistence_anchor: anchor,
            connection_limiter: Arc::new(Semaphore::new(pool_size as usize)),
        })
    }

    async fn apply_schema_within_timeout(connection: &Connection, command_timeout: Duration) -> Result<(), DbError> {
        tokio::time::timeout(command_timeout, apply_schema(connection))
            .await
            .map_err(|_| DbError::ConnectionError("SCHEMA_SYNC_TIMEOUT: command exceeded its time budget".into()))?
            .map_err(|e| DbError::ConnectionError(format!("SCHEMA_SYNC_FAULT: {}", e)))
    }

    /// Draws a connection from the bounded pool. Returns `PoolExhausted`
    /// immediately rather than queuing the caller, so a saturated pool
    /// surfaces as backpressure (§4.1) instead of an unbounded wait.
    pub fn get_connection(&self) -> Result<PooledConnection, DbError> {
        let permit = Arc::clone(&self.connection_limiter).try_acquire_owned().map_err(|_| {
            warn!("⚠️ [POOL_FAULT]: Connection pool saturated.");
            DbError::PoolExhausted
        })?;

        let connection = self.internal_database_driver.connect().map_err(|e| {
            error!("⚠️ [POOL_FAULT]: Connection allocation failed: {}", e);
            DbError::ConnectionError(e.to_string())
        })?;

        Ok(PooledConnection { connection, _permit: permit })
    }
}
// FIN DEL ARCHIVO [libs/infra/db/src/client.rs]
