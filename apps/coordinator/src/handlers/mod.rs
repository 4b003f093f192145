// [apps/coordinator/src/handlers/mod.rs]
/*!
 * =================================================================
 * APARATO: HANDLER INDEX (V1.0)
 * CLASIFICACIÓN: APPLICATION ADAPTERS (ESTRATO L4)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE PUNTOS DE ENTRADA (HANDLERS)
 *
 * # Topología de Módulos:
 * - auth:   Emisión de tokens RS256 y publicación de JWKS (C2).
 * - bots:   Registro idempotente, latido y gobernanza de flota (C3).
 * - jobs:   Reclamo atómico y transiciones de estado de trabajos (C3).
 * - admin:  Operaciones de mantenimiento manual y lecturas de diagnóstico.
 * - health: Sondas de liveness y métricas Prometheus.
 * =================================================================
 */

pub mod admin;
pub mod auth;
pub mod bots;
pub mod health;
pub mod jobs;
