// [libs/infra/db/src/repositories/idempotency.rs]
/*!
 * =================================================================
 * APARATO: IDEMPOTENCY LEDGER REPOSITORY (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: DETECCIÓN DE REPETICIONES Y REENVÍO DE RESPUESTAS
 *
 * El esquema original dejaba esta guarda "incompleta" (retornaba None
 * sin persistir nada). Aquí se persiste de verdad: una clave repetida
 * con el mismo cuerpo reenvía la respuesta grabada; con un cuerpo
 * distinto, produce CONFLICT.
 * =================================================================
 */

use crate::client::PooledConnection;
use crate::errors::DbError;
use chrono::{DateTime, Utc};
use fleet_domain_models::IdempotencyRecord;
use libsql::params;
use tracing::{debug, instrument};

pub struct IdempotencyRepository {
    database_connection: PooledConnection,
}

impl IdempotencyRepository {
    pub fn new(connection: PooledConnection) -> Self {
        Self { database_connection: connection }
    }

    pub async fn find(&self, idempotency_key: &str, bot_key: &str) -> Result<Option<IdempotencyRecord>, DbError> {
        let mut result = self.database_connection
            .query(
                "SELECT idempotency_key, bot_key, request_hash, response_status, response_body, created_at
                 FROM idempotency_keys WHERE idempotency_key = ?1 AND bot_key = ?2",
                params![idempotency_key, bot_key],
            )
            .await?;

        match result.next().await? {
            Some(row) => {
                let created_at: String = row.get(5)?;
                Ok(Some(IdempotencyRecord {
                    idempotency_key: row.get(0)?,
                    bot_key: row.get(1)?,
                    request_hash: row.get(2)?,
                    response_status: row.get::<i64>(3)? as u16,
                    response_body: row.get(4)?,
                    created_at: Self::parse_timestamp(&created_at)?,
                }))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, record))]
    pub async fn insert(&self, record: &IdempotencyRecord) -> Result<(), DbError> {
        self.database_connection
            .execute(
                "INSERT INTO idempotency_keys (idempotency_key, bot_key, request_hash, response_status, response_body, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.idempotency_key.clone(),
                    record.bot_key.clone(),
                    record.request_hash.clone(),
                    record.response_status as i64,
                    record.response_body.clone(),
                    record.created_at.to_rfc3339(),
                ],
            )
            .await?;
        debug!("🔑 [IDEMPOTENCY_RECORDED]: [{}] for bot [{}]", record.idempotency_key, record.bot_key);
        Ok(())
    }

    fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DbError> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| {
                chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                    .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
            })
            .map_err(|e| DbError::MappingError(format!("bad timestamp '{value}': {e}")))
    }
}
