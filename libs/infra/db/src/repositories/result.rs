// [libs/infra/db/src/repositories/result.rs]
/*!
 * =================================================================
 * APARATO: RESULT LEDGER REPOSITORY (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DEL REGISTRO DE AUDITORÍA INMUTABLE
 *
 * Un `JobResult` se inserta una única vez, en la transición terminal de
 * un trabajo; nunca se muta. Esquema único — ver la nota de diseño
 * contra el esquema dual `sum`/`result` de la fuente original.
 * =================================================================
 */

use crate::client::PooledConnection;
use crate::errors::DbError;
use fleet_domain_models::{JobResult, TerminalStatus};
use libsql::params;
use tracing::{debug, instrument};

pub struct ResultRepository {
    database_connection: PooledConnection,
}

impl ResultRepository {
    pub fn new(connection: PooledConnection) -> Self {
        Self { database_connection: connection }
    }

    #[instrument(skip(self))]
    pub async fn insert_result(&self, result: &JobResult) -> Result<(), DbError> {
        let status = match result.status {
            TerminalStatus::Succeeded => "succeeded",
            TerminalStatus::Failed => "failed",
        };

        self.database_connection
            .execute(
                r#"INSERT INTO results (
                    id, job_id, operand_a, operand_b, operation, computed_value,
                    worker_id, duration_ms, terminal_status, error, processed_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
                params![
                    result.id.to_string(),
                    result.job_id.to_string(),
                    result.operand_a,
                    result.operand_b,
                    result.operation.clone(),
                    result.value,
                    result.processed_by.to_string(),
                    result.duration_ms as i64,
                    status,
                    result.error.clone(),
                    result.processed_at.to_rfc3339(),
                ],
            )
            .await?;
        debug!("🧾 [RESULT_RECORDED]: job [{}] -> {}", result.job_id, status);
        Ok(())
    }
}
