//! Membership evaluation on top of the directory cache.
//!
//! Lookups fail soft: an unreachable directory makes users look invalid and
//! memberless rather than erroring. Only malformed arguments are surfaced.
use std::collections::HashSet;

use futures::future::join_all;
use thiserror::Error;

use crate::services::directory::cache::{DirectoryCache, account_key, short_names};
use crate::services::directory::client::DirectoryError;
use crate::services::directory::error::MembershipError;

#[derive(Debug, Error)]
enum LookupFailure {
    #[error("account has no principal name in the directory")]
    UnknownUser,
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Argument(#[from] MembershipError),
}

#[derive(Debug)]
pub struct MembershipService {
    cache: DirectoryCache,
}

impl MembershipService {
    pub fn new(cache: DirectoryCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &DirectoryCache {
        &self.cache
    }

    /// True iff the directory knows the account and it carries a principal name.
    pub async fn is_user_valid(&self, account_name: &str) -> bool {
        match self.cache.find_user(account_name).await {
            Ok(record) => record.principal_name().is_some(),
            Err(err) => {
                tracing::debug!(error = %err, "user validity check on malformed account name");
                false
            }
        }
    }

    /// Short names of the account's groups, in directory order.
    ///
    /// Any failure along the way is cached as an empty list. A blank account
    /// name returns an empty list without touching the cache.
    pub async fn get_group_membership_for_user(&self, account_name: &str) -> Vec<String> {
        let key = match account_key(account_name) {
            Ok(key) => key,
            Err(err) => {
                tracing::warn!(error = %err, "group membership requested for blank account");
                return Vec::new();
            }
        };

        self.cache
            .groups_for_user(key, || async {
                match self.resolve_membership(key).await {
                    Ok(groups) => groups,
                    Err(err) => {
                        tracing::warn!(
                            account = key,
                            error = %err,
                            "group membership lookup failed, caching empty list"
                        );
                        Vec::new()
                    }
                }
            })
            .await
    }

    async fn resolve_membership(&self, key: &str) -> Result<Vec<String>, LookupFailure> {
        let user = self.cache.find_user(key).await?;
        let principal = user.principal_name().ok_or(LookupFailure::UnknownUser)?;

        let groups = self
            .cache
            .client()
            .get_group_membership_for_user(principal)
            .await?;

        Ok(short_names(&groups))
    }

    pub async fn is_user_member_of(
        &self,
        account_name: &str,
        group_name: &str,
    ) -> Result<bool, MembershipError> {
        let key = account_key(account_name)?;
        let group = group_name.trim();
        if group.is_empty() {
            return Err(MembershipError::InvalidArgument("group name is required"));
        }

        // Served from (and on a miss, stored into) the groups-per-user cache.
        let groups = self.get_group_membership_for_user(key).await;

        Ok(groups.iter().any(|g| g == group))
    }

    pub async fn get_available_groups(&self) -> Vec<String> {
        self.cache.get_available_groups().await
    }

    /// Groups every listed user belongs to, in the first user's order.
    ///
    /// Memberships are fetched concurrently; a user whose lookup fails
    /// contributes an empty list (and so empties the result).
    pub async fn find_common_groups_for_users<S>(
        &self,
        users: &[S],
    ) -> Result<Vec<String>, MembershipError>
    where
        S: AsRef<str>,
    {
        if users.is_empty() {
            return Err(MembershipError::InvalidArgument("at least one user is required"));
        }

        let memberships = join_all(
            users
                .iter()
                .map(|user| self.get_group_membership_for_user(user.as_ref())),
        )
        .await;

        Ok(intersect(&memberships))
    }

    pub fn flush(&self) {
        self.cache.flush();
    }
}

fn intersect(lists: &[Vec<String>]) -> Vec<String> {
    let Some((first, rest)) = lists.split_first() else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    first
        .iter()
        .filter(|group| rest.iter().all(|list| list.contains(group)))
        .filter(|group| seen.insert(group.as_str()))
        .cloned()
        .collect()
}
