/*
 * Responsibility
 * - middleware の公開インターフェース (re-export)
 * - http: request-id / trace / body limit / timeout
 * - identity: trusted proxy header → CallerIdentity
 */
pub mod http;
pub mod identity;
