/*!
 * Caller identity extractor
 *
 * Responsibility:
 * - identity middleware が解決した呼び出し元 (CallerIdentity) を handler に提供する
 * - HTTP / axum 依存は core に閉じ込め、型定義は types に分離する
 *
 * Public API:
 * - CallerIdentity
 * - Caller
 */

mod core;
mod types;

pub use self::core::Caller;
pub use self::types::CallerIdentity;
