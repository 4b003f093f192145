// [libs/infra/db/src/repositories/job/mod.rs]
/*!
 * =================================================================
 * APARATO: JOB REPOSITORY (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GESTIÓN DEL CICLO DE VIDA DE ÓRDENES DE TRABAJO
 *
 * # Mathematical Proof (Transactional Exclusivity):
 * El claim se implementa como un UPDATE condicional cuyo predicado WHERE
 * re-verifica `status = 'pending'` tras la subconsulta de selección. libSQL
 * serializa los escritores a nivel de conexión, de modo que un conteo de
 * filas afectadas inmediatamente después del UPDATE basta para saber si
 * esta transacción ganó la fila o si otro reclamante (o un lazo de
 * recuperación) llegó primero.
 * =================================================================
 */

pub mod queries;

use crate::client::PooledConnection;
use crate::errors::DbError;
use chrono::{DateTime, Utc};
use fleet_domain_models::{Job, JobStatus};
use libsql::{params, Row};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use self::queries as sql;

pub struct JobRepository {
    database_connection: PooledConnection,
}

impl JobRepository {
    pub fn new(connection: PooledConnection) -> Self {
        Self { database_connection: connection }
    }

    #[instrument(skip(self))]
    pub async fn create_job(&self, operand_a: i64, operand_b: i64, operation: &str) -> Result<Job, DbError> {
        let job = Job::new(operand_a, operand_b, operation.to_string());
        self.database_connection
            .execute(sql::INSERT_JOB, params![
                job.id.to_string(), job.operand_a, job.operand_b, job.operation.clone()
            ])
            .await?;
        debug!("📥 [JOB_CREATED]: {} ({} {} {})", job.id, operand_a, operation, operand_b);
        Ok(job)
    }

    /// Atomically claims the oldest pending job compatible with
    /// `assigned_operation`. Returns `Ok(None)` when no candidate is
    /// available or the race was lost to another claimer.
    #[instrument(skip(self))]
    pub async fn claim_job(&self, worker_id: Uuid, assigned_operation: Option<&str>) -> Result<Option<Job>, DbError> {
        let rows_affected = self.database_connection
            .execute(sql::CLAIM_NEXT_JOB, params![worker_id.to_string(), assigned_operation])
            .await?;

        if rows_affected == 0 {
            debug!("🫥 [CLAIM_MISS]: No pending job available for worker [{}]", worker_id);
            return Ok(None);
        }

        let mut result = self.database_connection
            .query(sql::FIND_LATEST_CLAIM_BY_WORKER, params![worker_id.to_string()])
            .await?;

        match result.next().await? {
            Some(row) => Ok(Some(Self::map_row(row)?)),
            None => {
                warn!("⚠️ [CLAIM_RACE]: Claim reported a row but hydration found none for [{}]", worker_id);
                Ok(None)
            }
        }
    }

    pub async fn get_job(&self, job_id: Uuid) -> Result<Job, DbError> {
        let mut result = self.database_connection
            .query(sql::SELECT_JOB_BY_ID, params![job_id.to_string()])
            .await?;
        match result.next().await? {
            Some(row) => Self::map_row(row),
            None => Err(DbError::JobNotFound),
        }
    }

    pub async fn list_jobs(&self, status: Option<JobStatus>, limit: i64) -> Result<Vec<Job>, DbError> {
        let status_filter = status.map(Self::status_to_str);
        let mut result = self.database_connection
            .query(sql::SELECT_JOBS_BY_STATUS, params![status_filter, limit])
            .await?;

        let mut jobs = Vec::new();
        while let Some(row) = result.next().await? {
            jobs.push(Self::map_row(row)?);
        }
        Ok(jobs)
    }

    #[instrument(skip(self))]
    pub async fn start_job(&self, job_id: Uuid, worker_id: Uuid) -> Result<(), DbError> {
        let rows = self.database_connection
            .execute(sql::START_JOB, params![job_id.to_string(), worker_id.to_string()])
            .await?;
        if rows == 0 {
            return Err(DbError::InvalidJobState);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn complete_job(&self, job_id: Uuid, worker_id: Uuid) -> Result<(), DbError> {
        let rows = self.database_connection
            .execute(sql::COMPLETE_JOB, params![job_id.to_string(), worker_id.to_string()])
            .await?;
        if rows == 0 {
            return Err(DbError::InvalidJobState);
        }
        Ok(())
    }

    #[instrument(skip(self, error))]
    pub async fn fail_job(&self, job_id: Uuid, worker_id: Uuid, error: &str) -> Result<(), DbError> {
        let rows = self.database_connection
            .execute(sql::FAIL_JOB, params![job_id.to_string(), worker_id.to_string(), error])
            .await?;
        if rows == 0 {
            return Err(DbError::InvalidJobState);
        }
        Ok(())
    }

    /// Administrative/recovery release: returns a `claimed`/`processing`
    /// job to `pending`, bumping `attempts`. Used by L1/L2.
    #[instrument(skip(self, reason))]
    pub async fn release_job(&self, job_id: Uuid, reason: &str) -> Result<bool, DbError> {
        let rows = self.database_connection
            .execute(sql::RELEASE_JOB, params![job_id.to_string(), reason])
            .await?;
        Ok(rows > 0)
    }

    /// L3 terminal repair: marks a `processing` job `failed` in place
    /// (the worker never reported), without releasing it back to `pending`.
    #[instrument(skip(self, reason))]
    pub async fn fail_stuck_processing_job(&self, job_id: Uuid, reason: &str) -> Result<bool, DbError> {
        let rows = self.database_connection
            .execute(sql::FAIL_STUCK_PROCESSING_JOB, params![job_id.to_string(), reason])
            .await?;
        Ok(rows > 0)
    }

    pub async fn find_orphaned_claimed_jobs(&self, heartbeat_cutoff: DateTime<Utc>) -> Result<Vec<Job>, DbError> {
        let mut result = self.database_connection
            .query(sql::FIND_ORPHANED_CLAIMED_JOBS, params![heartbeat_cutoff.to_rfc3339()])
            .await?;
        let mut jobs = Vec::new();
        while let Some(row) = result.next().await? {
            jobs.push(Self::map_row(row)?);
        }
        Ok(jobs)
    }

    pub async fn find_stuck_claimed_jobs(&self, claimed_cutoff: DateTime<Utc>) -> Result<Vec<Job>, DbError> {
        let mut result = self.database_connection
            .query(sql::FIND_STUCK_CLAIMED_JOBS, params![claimed_cutoff.to_rfc3339()])
            .await?;
        let mut jobs = Vec::new();
        while let Some(row) = result.next().await? {
            jobs.push(Self::map_row(row)?);
        }
        Ok(jobs)
    }

    pub async fn find_stuck_processing_jobs(&self, processing_cutoff: DateTime<Utc>) -> Result<Vec<Job>, DbError> {
        let mut result = self.database_connection
            .query(sql::FIND_STUCK_PROCESSING_JOBS, params![processing_cutoff.to_rfc3339()])
            .await?;
        let mut jobs = Vec::new();
        while let Some(row) = result.next().await? {
            jobs.push(Self::map_row(row)?);
        }
        Ok(jobs)
    }

    fn status_to_str(status: JobStatus) -> &'static str {
        match status {
            JobStatus::Pending => "pending",
            JobStatus::Claimed => "claimed",
            JobStatus::Processing => "processing",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
        }
    }

    fn map_row(row: Row) -> Result<Job, DbError> {
        let id: String = row.get(0)?;
        let status_text: String = row.get(4)?;
        let claimed_by: Option<String> = row.get(5)?;
        let created_at: String = row.get(8)?;
        let claimed_at: Option<String> = row.get(9)?;
        let started_at: Option<String> = row.get(10)?;
        let finished_at: Option<String> = row.get(11)?;

        Ok(Job {
            id: Uuid::parse_str(&id).map_err(|e| DbError::MappingError(e.to_string()))?,
            operand_a: row.get(1)?,
            operand_b: row.get(2)?,
            operation: row.get(3)?,
            status: Self::status_from_str(&status_text)?,
            assigned_operation: None,
            claimed_by: claimed_by
                .map(|v| Uuid::parse_str(&v))
                .transpose()
                .map_err(|e| DbError::MappingError(e.to_string()))?,
            attempts: row.get::<i64>(6)? as u32,
            error: row.get(7)?,
            created_at: Self::parse_timestamp(&created_at)?,
            claimed_at: claimed_at.map(|v| Self::parse_timestamp(&v)).transpose()?,
            started_at: started_at.map(|v| Self::parse_timestamp(&v)).transpose()?,
            finished_at: finished_at.map(|v| Self::parse_timestamp(&v)).transpose()?,
        })
    }

    fn status_from_str(value: &str) -> Result<JobStatus, DbError> {
        match value {
            "pending" => Ok(JobStatus::Pending),
            "claimed" => Ok(JobStatus::Claimed),
            "processing" => Ok(JobStatus::Processing),
            "succeeded" => Ok(JobStatus::Succeeded),
            "failed" => Ok(JobStatus::Failed),
            other => Err(DbError::MappingError(format!("unknown job status '{other}'"))),
        }
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
