// [libs/infra/db/src/repositories/auth.rs]
/*!
 * =================================================================
 * APARATO: AUTH PRINCIPAL REPOSITORY (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: CUSTODIA DE CREDENCIALES SALTED-HASH DE AGENTES
 *
 * Tabla añadida respecto a la destilación original: el servicio de
 * sesión exige un almacén persistente de secretos de arranque
 * (`bootstrap_secret`) con hash, y la fuente no nombraba dónde vivían.
 * =================================================================
 */

use crate::client::PooledConnection;
use crate::errors::DbError;
use libsql::params;
use tracing::{debug, instrument};

pub struct AuthPrincipal {
    pub bot_key: String,
    pub bootstrap_secret_hash: String,
    pub enabled: bool,
}

pub struct AuthPrincipalRepository {
    database_connection: PooledConnection,
}

impl AuthPrincipalRepository {
    pub fn new(connection: PooledConnection) -> Self {
        Self { database_connection: connection }
    }

    #[instrument(skip(self, bootstrap_secret_hash))]
    pub async fn create_principal(&self, bot_key: &str, bootstrap_secret_hash: &str) -> Result<(), DbError> {
        self.database_connection
            .execute(
                "INSERT INTO auth_principals (bot_key, bootstrap_secret_hash, enabled) VALUES (?1, ?2, 1)",
                params![bot_key, bootstrap_secret_hash],
            )
            .await?;
        debug!("🔐 [PRINCIPAL_PROVISIONED]: [{}]", bot_key);
        Ok(())
    }

    pub async fn find_by_bot_key(&self, bot_key: &str) -> Result<Option<AuthPrincipal>, DbError> {
        let mut result = self.database_connection
            .query(
                "SELECT bot_key, bootstrap_secret_hash, enabled FROM auth_principals WHERE bot_key = ?1",
                params![bot_key],
            )
            .await?;

        match result.next().await? {
            Some(row) => Ok(Some(AuthPrincipal {
                bot_key: row.get(0)?,
                bootstrap_secret_hash: row.get(1)?,
                enabled: row.get::<i64>(2)? != 0,
            })),
            None => Ok(None),
        }
    }
}
