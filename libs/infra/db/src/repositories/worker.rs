// [libs/infra/db/src/repositories/worker.rs]
/*!
 * =================================================================
 * APARATO: WORKER REPOSITORY (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA TRANSACCIONAL DE LA FLOTA DE AGENTES
 *
 * Cubre registro idempotente, latido, asignación de trabajo actual,
 * anotación de salud (L4) y soft-delete de trabajadores.
 * =================================================================
 */

use crate::client::PooledConnection;
use crate::errors::DbError;
use chrono::{DateTime, Utc};
use fleet_domain_models::{HealthStatus, Worker, WorkerStatus};
use libsql::{params, Row};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

const SELECT_WORKER_COLUMNS: &str = "id, bot_key, assigned_operation, status, health_status, \
    current_job_id, last_heartbeat_at, created_at, deleted_at";

pub struct WorkerRepository {
    database_connection: PooledConnection,
}

impl WorkerRepository {
    #[must_use]
    pub fn new(connection: PooledConnection) -> Self {
        Self { database_connection: connection }
    }

    /// Registers a new worker principal, or returns the existing row for a
    /// `bot_key` that has already registered (registration is idempotent
    /// per bot_key across restarts).
    #[instrument(skip(self))]
    pub async fn register(&self, bot_key: &str, assigned_operation: Option<&str>) -> Result<Worker, DbError> {
        if let Some(existing) = self.find_by_bot_key(bot_key).await? {
            debug!("🔁 [REGISTER_REPLAY]: Worker [{}] already registered as [{}]", bot_key, existing.id);
            return Ok(existing);
        }

        let worker = Worker::register(bot_key.to_string(), assigned_operation.map(str::to_string));
        self.database_connection
            .execute(
                r#"INSERT INTO bots (id, bot_key, assigned_operation, status, health_status, last_heartbeat_at, created_at)
                   VALUES (?1, ?2, ?3, 'idle', 'normal', ?4, ?4)"#,
                params![
                    worker.id.to_string(),
                    worker.bot_key.clone(),
                    assigned_operation,
                    worker.created_at.to_rfc3339(),
                ],
            )
            .await?;
        debug!("🆕 [WORKER_REGISTERED]: [{}] as [{}]", bot_key, worker.id);
        Ok(worker)
    }

    pub async fn find_by_bot_key(&self, bot_key: &str) -> Result<Option<Worker>, DbError> {
        let sql = format!("SELECT {SELECT_WORKER_COLUMNS} FROM bots WHERE bot_key = ?1");
        let mut result = self.database_connection.query(&sql, params![bot_key]).await?;
        match result.next().await? {
            Some(row) => Ok(Some(Self::map_row(row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_worker(&self, worker_id: Uuid) -> Result<Worker, DbError> {
        let sql = format!("SELECT {SELECT_WORKER_COLUMNS} FROM bots WHERE id = ?1");
        let mut result = self.database_connection.query(&sql, params![worker_id.to_string()]).await?;
        match result.next().await? {
            Some(row) => Self::map_row(row),
            None => Err(DbError::WorkerNotFound),
        }
    }

    pub async fn list_workers(&self) -> Result<Vec<Worker>, DbError> {
        let sql = format!("SELECT {SELECT_WORKER_COLUMNS} FROM bots WHERE deleted_at IS NULL ORDER BY created_at ASC");
        let mut result = self.database_connection.query(&sql, ()).await?;
        let mut workers = Vec::new();
        while let Some(row) = result.next().await? {
            workers.push(Self::map_row(row)?);
        }
        Ok(workers)
    }

    #[instrument(skip(self))]
    pub async fn update_heartbeat(&self, worker_id: Uuid, now: DateTime<Utc>) -> Result<(), DbError> {
        let rows = self.database_connection
            .execute(
                "UPDATE bots SET last_heartbeat_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
                params![worker_id.to_string(), now.to_rfc3339()],
            )
            .await?;
        if rows == 0 {
            warn!("⚠️ [HEARTBEAT_REJECTED]: Worker [{}] is unknown or soft-deleted.", worker_id);
            return Err(DbError::WorkerNotFound);
        }
        Ok(())
    }

    /// Assigns `job_id` as the worker's current job and flips it to `busy`.
    /// The uniqueness constraint on `bots.current_job_id` is the
    /// belt-and-braces guard against double-assignment.
    #[instrument(skip(self))]
    pub async fn assign_current_job(&self, worker_id: Uuid, job_id: Uuid) -> Result<(), DbError> {
        let rows = self.database_connection
            .execute(
                "UPDATE bots SET current_job_id = ?2, status = 'busy' WHERE id = ?1 AND current_job_id IS NULL",
                params![worker_id.to_string(), job_id.to_string()],
            )
            .await?;
        if rows == 0 {
            return Err(DbError::WorkerAlreadyBusy);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn clear_current_job(&self, worker_id: Uuid) -> Result<(), DbError> {
        self.database_connection
            .execute(
                "UPDATE bots SET current_job_id = NULL, status = 'idle' WHERE id = ?1",
                params![worker_id.to_string()],
            )
            .await?;
        Ok(())
    }

    /// Admin override of a worker's operation filter (§4.3.4).
    #[instrument(skip(self))]
    pub async fn assign_operation(&self, worker_id: Uuid, operation: Option<&str>) -> Result<(), DbError> {
        let rows = self.database_connection
            .execute(
                "UPDATE bots SET assigned_operation = ?2 WHERE id = ?1 AND deleted_at IS NULL",
                params![worker_id.to_string(), operation],
            )
            .await?;
        if rows == 0 {
            return Err(DbError::WorkerNotFound);
        }
        Ok(())
    }

    /// L4: annotates a worker whose active job has gone stuck without
    /// forcibly detaching it (the job-side repair owns detachment).
    #[instrument(skip(self))]
    pub async fn mark_health_status(&self, worker_id: Uuid, health: HealthStatus) -> Result<(), DbError> {
        let value = match health {
            HealthStatus::Normal => "normal",
            HealthStatus::PotentiallyStuck => "potentially_stuck",
        };
        self.database_connection
            .execute(
                "UPDATE bots SET health_status = ?2 WHERE id = ?1",
                params![worker_id.to_string(), value],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn soft_delete(&self, worker_id: Uuid, now: DateTime<Utc>) -> Result<(), DbError> {
        let rows = self.database_connection
            .execute(
                "UPDATE bots SET deleted_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
                params![worker_id.to_string(), now.to_rfc3339()],
            )
            .await?;
        if rows == 0 {
            return Err(DbError::WorkerNotFound);
        }
        Ok(())
    }

    /// Supports the bot-retention-cleanup task: live workers whose last
    /// heartbeat precedes `cutoff`, used to decide soft-delete eligibility
    /// distinct from the shorter claim-liveness threshold.
    pub async fn find_live_workers_without_recent_heartbeat(&self, cutoff: DateTime<Utc>) -> Result<Vec<Worker>, DbError> {
        let sql = format!(
            "SELECT {SELECT_WORKER_COLUMNS} FROM bots WHERE deleted_at IS NULL AND last_heartbeat_at < ?1"
        );
        let mut result = self.database_connection.query(&sql, params![cutoff.to_rfc3339()]).await?;
        let mut workers = Vec::new();
        while let Some(row) = result.next().await? {
            workers.push(Self::map_row(row)?);
        }
        Ok(workers)
    }

    fn map_row(row: Row) -> Result<Worker, DbError> {
        let id: String = row.get(0)?;
        let status_text: String = row.get(3)?;
        let health_text: String = row.get(4)?;
        let current_job_id: Option<String> = row.get(5)?;
        let last_heartbeat_at: String = row.get(6)?;
        let created_at: String = row.get(7)?;
        let deleted_at: Option<String> = row.get(8)?;

        Ok(Worker {
            id: Uuid::parse_str(&id).map_err(|e| DbError::MappingError(e.to_string()))?,
            bot_key: row.get(1)?,
            assigned_operation: row.get(2)?,
            status: match status_text.as_str() {
                "idle" => WorkerStatus::Idle,
                "busy" => WorkerStatus::Busy,
                "down" => WorkerStatus::Down,
                other => return Err(DbError::MappingError(format!("unknown worker status '{other}'"))),
            },
            health_status: match health_text.as_str() {
                "normal" => HealthStatus::Normal,
                "potentially_stuck" => HealthStatus::PotentiallyStuck,
                other => return Err(DbError::MappingError(format!("unknown health status '{other}'"))),
            },
            current_job_id: current_job_id
                .map(|v| Uuid::parse_str(&v))
                .transpose()
                .map_err(|e| DbError::MappingError(e.to_string()))?,
            last_heartbeat_at: Self::parse_timestamp(&last_heartbeat_at)?,
            created_at: Self::parse_timestamp(&created_at)?,
            deleted_at: deleted_at.map(|v| Self::parse_timestamp(&v)).transpose()?,
        })
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
