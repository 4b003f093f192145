// [libs/infra/db/src/lib.rs]
/*!
 * =================================================================
 * APARATO: PERSISTENCE ADAPTER BARREL (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: PUNTO DE ENTRADA PÚBLICO DEL ADAPTADOR libSQL
 * =================================================================
 */

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;

pub use client::{PooledConnection, TursoClient};
pub use errors::DbError;
pub use repositories::{
    AuthPrincipal, AuthPrincipalRepository, IdempotencyRepository, JobRepository,
    ResultRepository, WorkerRepository,
};

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_client() -> TursoClient {
        TursoClient::connect("file::memory:?cache=shared", None).await.unwrap()
    }

    #[tokio::test]
    async fn schema_applies_cleanly_against_a_fresh_memory_database() {
        let client = memory_client().await;
        let connection = client.get_connection().unwrap();
        let job_repo = JobRepository::new(connection);
        let job = job_repo.create_job(2, 3, "sum").await.unwrap();
        assert_eq!(job.operand_a, 2);
    }

    #[tokio::test]
    async fn claim_job_is_exclusive_between_two_workers() {
        let client = memory_client().await;
        let connection = client.get_connection().unwrap();
        let job_repo = JobRepository::new(connection);
        job_repo.create_job(1, 1, "sum").await.unwrap();

        let worker_a = uuid::Uuid::new_v4();
        let worker_b = uuid::Uuid::new_v4();

        let claimed_a = job_repo.claim_job(worker_a, None).await.unwrap();
        let claimed_b = job_repo.claim_job(worker_b, None).await.unwrap();

        assert!(claimed_a.is_some());
        assert!(claimed_b.is_none());
    }

    #[tokio::test]
    async fn worker_registration_is_idempotent_per_bot_key() {
        let client = memory_client().await;
        let worker_repo = WorkerRepository::new(client.get_connection().unwrap());

        let first = worker_repo.register("bot-alpha", Some("sum")).await.unwrap();
        let second = worker_repo.register("bot-alpha", Some("sum")).await.unwrap();

        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn assign_operation_rejects_unknown_worker() {
        let client = memory_client().await;
        let worker_repo = WorkerRepository::new(client.get_connection().unwrap());

        let outcome = worker_repo.assign_operation(uuid::Uuid::new_v4(), Some("product")).await;
        assert!(matches!(outcome, Err(DbError::WorkerNotFound)));
    }

    #[tokio::test]
    async fn assign_operation_overrides_a_registered_workers_filter() {
        let client = memory_client().await;
        let worker_repo = WorkerRepository::new(client.get_connection().unwrap());

        let worker = worker_repo.register("bot-beta", Some("sum")).await.unwrap();
        worker_repo.assign_operation(worker.id, Some("quotient")).await.unwrap();

        let reloaded = worker_repo.get_worker(worker.id).await.unwrap();
        assert_eq!(reloaded.assigned_operation.as_deref(), Some("quotient"));
    }

    #[tokio::test]
    async fn auth_principal_round_trips_through_persistence() {
        let client = memory_client().await;
        let principals = AuthPrincipalRepository::new(client.get_connection().unwrap());

        assert!(principals.find_by_bot_key("bot-gamma").await.unwrap().is_none());

        principals.create_principal("bot-gamma", "hashed-secret").await.unwrap();
        let found = principals.find_by_bot_key("bot-gamma").await.unwrap().unwrap();

        assert_eq!(found.bootstrap_secret_hash, "hashed-secret");
        assert!(found.enabled);
    }

    #[tokio::test]
    async fn idempotency_record_replays_for_same_key_and_body_hash() {
        let client = memory_client().await;
        let idempotency = IdempotencyRepository::new(client.get_connection().unwrap());

        assert!(idempotency.find("key-1", "bot-delta").await.unwrap().is_none());

        let record = fleet_domain_models::IdempotencyRecord::new(
            "key-1".to_string(),
            "bot-delta".to_string(),
            "hash-abc".to_string(),
            201,
            "{\"bot_id\":\"stub\"}".to_string(),
        );
        idempotency.insert(&record).await.unwrap();

        let replayed = idempotency.find("key-1", "bot-delta").await.unwrap().unwrap();
        assert_eq!(replayed.request_hash, "hash-abc");
        assert_eq!(replayed.response_status, 201);
    }
}
