//! Directory client interface consumed by the directory cache.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Directory-layer errors.
///
/// Not:
/// - These never reach HTTP callers. The cache converts them into negative
///   entries (empty record / empty group list) and logs them.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),
    #[error("directory entry not found: {0}")]
    NotFound(String),
    #[error("directory response error: {0}")]
    InvalidResponse(String),
}

/// Sparse directory principal.
///
/// `UserRecord::default()` is the "not found" sentinel stored by the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_principal_name: Option<String>,
    #[serde(
        default,
        rename = "sAMAccountName",
        skip_serializing_if = "Option::is_none"
    )]
    pub sam_account_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dn: Option<String>,
}

impl UserRecord {
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Long-form principal name, if the record carries a non-empty one.
    pub fn principal_name(&self) -> Option<&str> {
        self.user_principal_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Directory group as returned by membership and group searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryGroup {
    // Short (common) name
    pub cn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DirectoryGroup {
    pub fn short_name(&self) -> &str {
        &self.cn
    }
}

/// Bind credentials presented to the directory.
#[derive(Clone, Deserialize)]
pub struct BindCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BindCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Asynchronous directory capability.
///
/// Contract for implementations:
/// - `Err(Unavailable)` when the directory cannot be reached
/// - `Err(NotFound)` when the directory answered with an empty payload
/// - `Ok(data)` otherwise
///
/// Used behind `Arc<dyn DirectoryClient>`, so no `Clone` bound.
#[async_trait]
pub trait DirectoryClient: Send + Sync + 'static {
    // Returns the backend name (for logging).
    fn backend_name(&self) -> &'static str;

    // Look up a user by short account name.
    async fn find_user(&self, account_name: &str) -> DirectoryResult<UserRecord>;

    // Groups the principal belongs to, in directory response order.
    async fn get_group_membership_for_user(
        &self,
        principal_name: &str,
    ) -> DirectoryResult<Vec<DirectoryGroup>>;

    // Group search. `"all"` returns every group under the base DN.
    async fn find_groups(&self, filter: &str) -> DirectoryResult<Vec<DirectoryGroup>>;
}

/// Filter expression used when filling the all-groups store.
pub const ALL_GROUPS_FILTER: &str = "all";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_record_is_the_not_found_sentinel() {
        let record = UserRecord::not_found();
        assert!(record.is_empty());
        assert_eq!(record.principal_name(), None);
    }

    #[test]
    fn blank_principal_name_is_not_a_principal() {
        let record = UserRecord {
            user_principal_name: Some("   ".into()),
            sam_account_name: Some("jdoe".into()),
            ..Default::default()
        };
        assert!(!record.is_empty());
        assert_eq!(record.principal_name(), None);
    }

    #[test]
    fn user_record_reads_directory_attribute_names() {
        let record: UserRecord = serde_json::from_str(
            r#"{"userPrincipalName":"jdoe@corp.example","sAMAccountName":"jdoe"}"#,
        )
        .unwrap();
        assert_eq!(record.principal_name(), Some("jdoe@corp.example"));
        assert_eq!(record.sam_account_name.as_deref(), Some("jdoe"));
    }
}
