/*
 * Responsibility
 * - v1 の extractor を束ねる
 */
mod caller;

pub use caller::{Caller, CallerIdentity};
