// [libs/infra/db/src/schema.rs]
/**
 * =================================================================
 * APARATO: SOVEREIGN DATABASE SCHEMA (V1.0 - JOB FLEET STRATA)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. JOBS / BOTS / RESULTS: el núcleo del ciclo de vida de despacho.
 * 2. IDEMPOTENCIA: tabla dedicada para el registro de reintentos seguros.
 * 3. AUTH_PRINCIPALS: credenciales soberanas para el servicio de sesión.
 * 4. IDEMPOTENCIA DE ESQUEMA: migraciones en caliente toleran reintentos.
 * =================================================================
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument, warn};

/**
 * ESTRATO 1: SOLIDIFICACIÓN (Génesis de Tablas)
 * Define las entidades base de la flota de trabajos distribuida.
 */
const TACTICAL_TABLES: &[(&str, &str)] = &[
    ("TABLE_JOBS", r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id TEXT PRIMARY KEY,
            operand_a INTEGER NOT NULL,
            operand_b INTEGER NOT NULL,
            operation TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            claimed_by TEXT,
            attempts INTEGER NOT NULL DEFAULT 0,
            error TEXT,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            claimed_at DATETIME,
            started_at DATETIME,
            finished_at DATETIME
        );
    "#),
    ("TABLE_BOTS", r#"
        CREATE TABLE IF NOT EXISTS bots (
            id TEXT PRIMARY KEY,
            bot_key TEXT NOT NULL UNIQUE,
            assigned_operation TEXT,
            status TEXT NOT NULL DEFAULT 'idle',
            health_status TEXT NOT NULL DEFAULT 'normal',
            current_job_id TEXT UNIQUE,
            last_heartbeat_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            deleted_at DATETIME
        );
    "#),
    ("TABLE_RESULTS", r#"
        CREATE TABLE IF NOT EXISTS results (
            id TEXT PRIMARY KEY,
            job_id TEXT NOT NULL,
            operand_a INTEGER NOT NULL,
            operand_b INTEGER NOT NULL,
            operation TEXT NOT NULL,
            computed_value INTEGER,
            worker_id TEXT NOT NULL,
            duration_ms INTEGER NOT NULL,
            terminal_status TEXT NOT NULL,
            error TEXT,
            processed_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_IDEMPOTENCY_KEYS", r#"
        CREATE TABLE IF NOT EXISTS idempotency_keys (
            idempotency_key TEXT NOT NULL,
            bot_key TEXT NOT NULL,
            request_hash TEXT NOT NULL,
            response_status INTEGER NOT NULL,
            response_body TEXT NOT NULL,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (idempotency_key, bot_key)
        );
    "#),
    ("TABLE_AUTH_PRINCIPALS", r#"
        CREATE TABLE IF NOT EXISTS auth_principals (
            bot_key TEXT PRIMARY KEY,
            bootstrap_secret_hash TEXT NOT NULL,
            enabled INTEGER NOT NULL DEFAULT 1,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
    "#),
];

/**
 * ESTRATO 2: EVOLUCIÓN (Mutaciones de Columna)
 * Reservado para columnas añadidas por revisiones posteriores del
 * esquema; cada ALTER tolera el fallo "duplicate column name" para
 * que un arranque contra una base ya migrada sea un no-op.
 */
const EVOLUTIONARY_STRATA: &[(&str, &str)] = &[];

/**
 * ESTRATO 3: ENDURECIMIENTO (Índices de Aceleración)
 * Mantiene las consultas de recuperación y de estado en O(log n).
 */
const ACCELERATION_INDEXES: &[(&str, &str)] = &[
    ("IDX_JOBS_STATUS", "CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status);"),
    ("IDX_JOBS_CLAIMED_BY", "CREATE INDEX IF NOT EXISTS idx_jobs_claimed_by ON jobs(claimed_by);"),
    ("IDX_BOTS_HEARTBEAT", "CREATE INDEX IF NOT EXISTS idx_bots_last_heartbeat_at ON bots(last_heartbeat_at);"),
    ("IDX_RESULTS_PROCESSED_AT", "CREATE INDEX IF NOT EXISTS idx_results_processed_at ON results(processed_at);"),
];

/**
 * Ejecuta la secuencia maestra de sincronización del esquema estructural.
 *
 * # Errors:
 * Retorna error si alguna tabla base falla en solidificarse, indicando
 * un colapso en el enlace con el motor de persistencia.
 */
#[instrument(skip(database_connection))]
pub async fn apply_schema(database_connection: &Connection) -> Result<()> {
    info!("🏗️ [SCHEMA_ENGINE]: Initiating structural synchronization V1.0...");

    solidify_base_strata(database_connection).await?;
    execute_evolutionary_repair(database_connection).await?;
    harden_access_layer(database_connection).await?;

    info!("✅ [SCHEMA_ENGINE]: Job fleet ledger level and certified.");
    Ok(())
}

async fn solidify_base_strata(db: &Connection) -> Result<()> {
    for (identifier, sql) in TACTICAL_TABLES {
        debug!("  ↳ Solidifying: {}", identifier);
        db.execute(*sql, ()).await
            .with_context(|| format!("CRITICAL_SOLIDIFICATION_FAULT: {}", identifier))?;
    }
    Ok(())
}

async fn execute_evolutionary_repair(db: &Connection) -> Result<()> {
    for (identifier, sql) in EVOLUTIONARY_STRATA {
        match db.execute(*sql, ()).await {
            Ok(_) => info!("  🟢 [REPAIR_OK]: Applied evolutionary stratum {}", identifier),
            Err(e) => {
                let message = e.to_string();
                if message.contains("duplicate column name") {
                    debug!("  ⚪ [REPAIR_SKIP]: {} already level.", identifier);
                } else {
                    warn!("  ⚠️ [REPAIR_BYPASS]: {} check incomplete: {}", identifier, message);
                }
            }
        }
    }
    Ok(())
}

async fn harden_access_layer(db: &Connection) -> Result<()> {
    for (identifier, sql) in ACCELERATION_INDEXES {
        debug!("  ↳ Hardening: {}", identifier);
        db.execute(*sql, ()).await
            .with_context(|| format!("CRITICAL_HARDENING_FAULT: {}", identifier))?;
    }
    Ok(())
}
// FIN DEL ARCHIVO [libs/infra/db/src/schema.rs]
