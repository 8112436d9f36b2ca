use thiserror::Error;

/// Errors surfaced to callers of the directory cache and membership service.
///
/// Directory failures are deliberately absent: they turn into negative cache
/// entries instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MembershipError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}
