//! Directory cache: users, all-groups and groups-per-user stores.
//!
//! Every directory access goes through here. Entries never expire; the only
//! way back to "unresolved" is [`DirectoryCache::flush`].
//!
//! Each key owns a shared `OnceCell`, so concurrent misses on the same key
//! wait for one directory query instead of racing their own.
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    future::Future,
    sync::Arc,
};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::OnceCell;

use crate::services::directory::client::{
    ALL_GROUPS_FILTER, DirectoryClient, DirectoryGroup, UserRecord,
};
use crate::services::directory::error::MembershipError;

/// A resolved cache value and when it was stored.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry<T> {
    pub value: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            cached_at: Utc::now(),
        }
    }
}

type Slot<T> = Arc<OnceCell<CacheEntry<T>>>;

#[derive(Default)]
struct Stores {
    users: HashMap<String, Slot<UserRecord>>,
    all_groups: Slot<Vec<String>>,
    groups_per_user: HashMap<String, Slot<Vec<String>>>,
}

pub struct DirectoryCache {
    client: Arc<dyn DirectoryClient>,
    // Held for map access only, never across an await.
    stores: Mutex<Stores>,
}

impl std::fmt::Debug for DirectoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryCache")
            .field("backend", &self.client.backend_name())
            .finish_non_exhaustive()
    }
}

/// Validate an account name and return its cache key.
pub(crate) fn account_key(account_name: &str) -> Result<&str, MembershipError> {
    let key = account_name.trim();
    if key.is_empty() {
        return Err(MembershipError::InvalidArgument("account name is required"));
    }
    Ok(key)
}

/// Short names in response order, duplicates dropped.
pub(crate) fn short_names(groups: &[DirectoryGroup]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    groups
        .iter()
        .map(DirectoryGroup::short_name)
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

impl DirectoryCache {
    pub fn new(client: Arc<dyn DirectoryClient>) -> Self {
        Self {
            client,
            stores: Mutex::new(Stores::default()),
        }
    }

    pub(crate) fn client(&self) -> &dyn DirectoryClient {
        self.client.as_ref()
    }

    /// Resolve a user, querying the directory at most once per key.
    ///
    /// Any directory failure is stored as the empty "not found" record.
    pub async fn find_user(&self, account_name: &str) -> Result<UserRecord, MembershipError> {
        let key = account_key(account_name)?;
        let slot = self
            .stores
            .lock()
            .users
            .entry(key.to_string())
            .or_default()
            .clone();

        if let Some(hit) = slot.get() {
            tracing::debug!(account = key, "user cache hit");
            return Ok(hit.value.clone());
        }

        let entry = slot
            .get_or_init(|| async {
                tracing::debug!(
                    account = key,
                    backend = self.client.backend_name(),
                    "user cache miss"
                );
                let record = match self.client.find_user(key).await {
                    Ok(record) => record,
                    Err(err) => {
                        tracing::warn!(
                            account = key,
                            error = %err,
                            "user lookup failed, caching negative entry"
                        );
                        UserRecord::not_found()
                    }
                };
                CacheEntry::new(record)
            })
            .await;

        Ok(entry.value.clone())
    }

    /// All directory groups, sorted by short name.
    ///
    /// Refills only while the store is empty. A failed or empty directory
    /// answer leaves it empty, so the next call queries again.
    pub async fn get_available_groups(&self) -> Vec<String> {
        let slot = self.stores.lock().all_groups.clone();

        let filled = slot
            .get_or_try_init(|| async {
                match self.client.find_groups(ALL_GROUPS_FILTER).await {
                    Ok(groups) if !groups.is_empty() => {
                        let names: BTreeSet<String> = short_names(&groups).into_iter().collect();
                        tracing::debug!(count = names.len(), "all-groups cache filled");
                        Ok(CacheEntry::new(names.into_iter().collect()))
                    }
                    Ok(_) => {
                        tracing::warn!("directory returned no groups");
                        Err(())
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "group listing failed");
                        Err(())
                    }
                }
            })
            .await;

        filled.map(|entry| entry.value.clone()).unwrap_or_default()
    }

    /// Cached membership for `key`, filled by `fill` on the first miss.
    pub(crate) async fn groups_for_user<F, Fut>(&self, key: &str, fill: F) -> Vec<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Vec<String>>,
    {
        let slot = self
            .stores
            .lock()
            .groups_per_user
            .entry(key.to_string())
            .or_default()
            .clone();

        let entry = slot
            .get_or_init(|| async { CacheEntry::new(fill().await) })
            .await;
        entry.value.clone()
    }

    /// Drop every cached entry in all three stores at once.
    pub fn flush(&self) {
        let previous = std::mem::take(&mut *self.stores.lock());
        tracing::info!(
            users = previous.users.len(),
            groups_per_user = previous.groups_per_user.len(),
            "directory cache flushed"
        );
    }

    pub fn dump_users(&self) -> BTreeMap<String, CacheEntry<UserRecord>> {
        resolved(&self.stores.lock().users)
    }

    pub fn dump_available_groups(&self) -> Option<CacheEntry<Vec<String>>> {
        self.stores.lock().all_groups.get().cloned()
    }

    pub fn dump_groups_per_user(&self) -> BTreeMap<String, CacheEntry<Vec<String>>> {
        resolved(&self.stores.lock().groups_per_user)
    }
}

// Pending (in-flight) slots are not part of a dump.
fn resolved<T: Clone>(store: &HashMap<String, Slot<T>>) -> BTreeMap<String, CacheEntry<T>> {
    store
        .iter()
        .filter_map(|(key, slot)| slot.get().map(|entry| (key.clone(), entry.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::directory::testing::StubDirectory;

    fn cache(stub: &Arc<StubDirectory>) -> DirectoryCache {
        DirectoryCache::new(stub.clone())
    }

    #[tokio::test]
    async fn find_user_queries_directory_once() {
        let stub = Arc::new(StubDirectory::new().with_user("jdoe", "jdoe@corp.example"));
        let cache = cache(&stub);

        let first = cache.find_user("jdoe").await.unwrap();
        let second = cache.find_user(" jdoe ").await.unwrap();

        assert_eq!(first.principal_name(), Some("jdoe@corp.example"));
        assert_eq!(first, second);
        assert_eq!(stub.find_user_calls(), 1);
    }

    #[tokio::test]
    async fn find_user_caches_failures_as_empty_record() {
        let stub = Arc::new(StubDirectory::new().unavailable());
        let cache = cache(&stub);

        assert!(cache.find_user("jdoe").await.unwrap().is_empty());
        assert!(cache.find_user("jdoe").await.unwrap().is_empty());
        assert_eq!(stub.find_user_calls(), 1);
        assert!(cache.dump_users()["jdoe"].value.is_empty());
    }

    #[tokio::test]
    async fn find_user_rejects_blank_account_names() {
        let stub = Arc::new(StubDirectory::new());
        let cache = cache(&stub);

        assert!(matches!(
            cache.find_user("   ").await,
            Err(MembershipError::InvalidArgument(_))
        ));
        assert_eq!(stub.find_user_calls(), 0);
    }

    #[tokio::test]
    async fn flush_forces_exactly_one_fresh_query() {
        let stub = Arc::new(StubDirectory::new().with_user("jdoe", "jdoe@corp.example"));
        let cache = cache(&stub);

        cache.find_user("jdoe").await.unwrap();
        cache.flush();
        assert!(cache.dump_users().is_empty());

        cache.find_user("jdoe").await.unwrap();
        cache.find_user("jdoe").await.unwrap();
        assert_eq!(stub.find_user_calls(), 2);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_query() {
        let stub = Arc::new(
            StubDirectory::new()
                .with_user("jdoe", "jdoe@corp.example")
                .with_delay_ms(20),
        );
        let cache = cache(&stub);

        let (a, b, c) = tokio::join!(
            cache.find_user("jdoe"),
            cache.find_user("jdoe"),
            cache.find_user("jdoe")
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert!(!c.unwrap().is_empty());
        assert_eq!(stub.find_user_calls(), 1);
    }

    #[tokio::test]
    async fn fill_in_flight_at_flush_is_discarded() {
        let stub = Arc::new(
            StubDirectory::new()
                .with_user("jdoe", "jdoe@corp.example")
                .with_delay_ms(50),
        );
        let cache = Arc::new(cache(&stub));

        let pending = tokio::spawn({
            let cache = cache.clone();
            async move { cache.find_user("jdoe").await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        cache.flush();

        // The caller that started the fill still gets its answer.
        assert!(!pending.await.unwrap().unwrap().is_empty());
        assert!(cache.dump_users().is_empty());

        cache.find_user("jdoe").await.unwrap();
        assert_eq!(stub.find_user_calls(), 2);
    }

    #[tokio::test]
    async fn available_groups_fill_once() {
        let stub = Arc::new(StubDirectory::new().with_all_groups(&["Users", "Admins", "Users"]));
        let cache = cache(&stub);

        assert_eq!(cache.get_available_groups().await, vec!["Admins", "Users"]);
        assert_eq!(cache.get_available_groups().await.len(), 2);
        assert_eq!(stub.find_groups_calls(), 1);
        assert_eq!(cache.dump_available_groups().unwrap().value.len(), 2);
    }

    #[tokio::test]
    async fn available_groups_retry_after_failure() {
        let stub = Arc::new(StubDirectory::new().unavailable());
        let cache = cache(&stub);

        assert!(cache.get_available_groups().await.is_empty());
        assert!(cache.get_available_groups().await.is_empty());
        assert_eq!(stub.find_groups_calls(), 2);
        assert!(cache.dump_available_groups().is_none());
    }

    #[tokio::test]
    async fn flush_clears_available_groups() {
        let stub = Arc::new(StubDirectory::new().with_all_groups(&["Admins"]));
        let cache = cache(&stub);

        cache.get_available_groups().await;
        cache.flush();
        cache.get_available_groups().await;
        assert_eq!(stub.find_groups_calls(), 2);
    }

    #[test]
    fn short_names_keep_response_order_without_duplicates() {
        let groups: Vec<DirectoryGroup> = ["B", "A", "B", "C"]
            .iter()
            .map(|cn| DirectoryGroup {
                cn: cn.to_string(),
                dn: None,
                description: None,
            })
            .collect();
        assert_eq!(short_names(&groups), vec!["B", "A", "C"]);
    }
}
