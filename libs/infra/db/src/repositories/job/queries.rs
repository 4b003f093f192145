// [libs/infra/db/src/repositories/job/queries.rs]
/*!
 * =================================================================
 * APARATO: JOB LEDGER SQL STORE (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE SQL (ESTRATO L3)
 * RESPONSABILIDAD: DEFINICIÓN DE SENTENCIAS ATÓMICAS PARA TRABAJOS
 *
 * Las consultas de reclamo usan guardias de estado (WHERE status =
 * 'pending') para garantizar que la transición de propiedad sea una
 * operación atómica indivisible, ya que el motor embebido no ofrece
 * `FOR UPDATE SKIP LOCKED`.
 * =================================================================
 */

/// Crea una nueva orden de trabajo en estado `pending`.
pub const INSERT_JOB: &str = r#"
    INSERT INTO jobs (id, operand_a, operand_b, operation, status, attempts, created_at)
    VALUES (?1, ?2, ?3, ?4, 'pending', 0, CURRENT_TIMESTAMP)
"#;

/// Reclama atómicamente el trabajo `pending` más antiguo compatible con
/// la operación asignada del trabajador (o cualquiera si es NULL).
pub const CLAIM_NEXT_JOB: &str = r#"
    UPDATE jobs
    SET status = 'claimed', claimed_by = ?1, claimed_at = CURRENT_TIMESTAMP
    WHERE id = (
        SELECT id FROM jobs
        WHERE status = 'pending' AND (?2 IS NULL OR operation = ?2)
        ORDER BY created_at ASC
        LIMIT 1
    ) AND status = 'pending'
"#;

/// Recupera el trabajo reclamado más recientemente por este worker. Usado
/// inmediatamente después de `CLAIM_NEXT_JOB` para hidratar la fila ganada.
pub const FIND_LATEST_CLAIM_BY_WORKER: &str = r#"
    SELECT id, operand_a, operand_b, operation, status, claimed_by, attempts,
           error, created_at, claimed_at, started_at, finished_at
    FROM jobs
    WHERE claimed_by = ?1 AND status = 'claimed'
    ORDER BY claimed_at DESC
    LIMIT 1
"#;

pub const SELECT_JOB_BY_ID: &str = r#"
    SELECT id, operand_a, operand_b, operation, status, claimed_by, attempts,
           error, created_at, claimed_at, started_at, finished_at
    FROM jobs
    WHERE id = ?1
"#;

pub const SELECT_JOBS_BY_STATUS: &str = r#"
    SELECT id, operand_a, operand_b, operation, status, claimed_by, attempts,
           error, created_at, claimed_at, started_at, finished_at
    FROM jobs
    WHERE (?1 IS NULL OR status = ?1)
    ORDER BY created_at DESC
    LIMIT ?2
"#;

pub const START_JOB: &str = r#"
    UPDATE jobs
    SET status = 'processing', started_at = CURRENT_TIMESTAMP
    WHERE id = ?1 AND claimed_by = ?2 AND status = 'claimed'
"#;

pub const COMPLETE_JOB: &str = r#"
    UPDATE jobs
    SET status = 'succeeded', finished_at = CURRENT_TIMESTAMP
    WHERE id = ?1 AND claimed_by = ?2 AND status = 'processing'
"#;

pub const FAIL_JOB: &str = r#"
    UPDATE jobs
    SET status = 'failed', finished_at = CURRENT_TIMESTAMP,
        attempts = attempts + 1, error = ?3
    WHERE id = ?1 AND claimed_by = ?2 AND status = 'processing'
"#;

/// Libera un trabajo estancado/huérfano de vuelta a `pending`, incrementa
/// `attempts` y registra el motivo. Usado por los lazos de recuperación.
pub const RELEASE_JOB: &str = r#"
    UPDATE jobs
    SET status = 'pending', claimed_by = NULL, claimed_at = NULL,
        started_at = NULL, attempts = attempts + 1, error = ?2
    WHERE id = ?1 AND status IN ('claimed', 'processing')
"#;

/// Marca un trabajo `processing` como fallido por exceder el tiempo límite
/// de procesamiento, sin necesidad de que el worker reporte (L3).
pub const FAIL_STUCK_PROCESSING_JOB: &str = r#"
    UPDATE jobs
    SET status = 'failed', finished_at = CURRENT_TIMESTAMP,
        attempts = attempts + 1, error = ?2
    WHERE id = ?1 AND status = 'processing'
"#;

/// L1: trabajos `claimed` cuyo worker dejó de latir hace más del umbral de
/// vitalidad y no está soft-eliminado.
pub const FIND_ORPHANED_CLAIMED_JOBS: &str = r#"
    SELECT j.id, j.operand_a, j.operand_b, j.operation, j.status, j.claimed_by,
           j.attempts, j.error, j.created_at, j.claimed_at, j.started_at, j.finished_at
    FROM jobs j
    JOIN bots b ON b.id = j.claimed_by
    WHERE j.status = 'claimed'
      AND b.deleted_at IS NULL
      AND b.last_heartbeat_at < ?1
"#;

/// L2: trabajos `claimed` cuya antigüedad supera `claimed_job_timeout`,
/// sin importar la vitalidad del worker.
pub const FIND_STUCK_CLAIMED_JOBS: &str = r#"
    SELECT id, operand_a, operand_b, operation, status, claimed_by, attempts,
           error, created_at, claimed_at, started_at, finished_at
    FROM jobs
    WHERE status = 'claimed' AND claimed_at < ?1
"#;

/// L3: trabajos `processing` cuya antigüedad supera el tiempo límite de
/// procesamiento.
pub const FIND_STUCK_PROCESSING_JOBS: &str = r#"
    SELECT id, operand_a, operand_b, operation, status, claimed_by, attempts,
           error, created_at, claimed_at, started_at, finished_at
    FROM jobs
    WHERE status = 'processing' AND started_at < ?1
"#;
