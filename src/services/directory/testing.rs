//! In-memory directory double that counts external calls.
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use crate::services::directory::client::{
    DirectoryClient, DirectoryError, DirectoryGroup, DirectoryResult, UserRecord,
};

#[derive(Debug, Default)]
pub struct StubDirectory {
    users: HashMap<String, UserRecord>,
    memberships: HashMap<String, Vec<String>>,
    all_groups: Vec<String>,
    unavailable: bool,
    delay: Option<Duration>,
    find_user_calls: AtomicUsize,
    membership_calls: AtomicUsize,
    find_groups_calls: AtomicUsize,
}

fn group(cn: &str) -> DirectoryGroup {
    DirectoryGroup {
        cn: cn.to_string(),
        dn: None,
        description: None,
    }
}

impl StubDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, account: &str, principal: &str) -> Self {
        self.users.insert(
            account.to_string(),
            UserRecord {
                user_principal_name: Some(principal.to_string()),
                sam_account_name: Some(account.to_string()),
                ..Default::default()
            },
        );
        self
    }

    pub fn with_membership(mut self, principal: &str, groups: &[&str]) -> Self {
        self.memberships.insert(
            principal.to_string(),
            groups.iter().map(|g| g.to_string()).collect(),
        );
        self
    }

    pub fn with_all_groups(mut self, groups: &[&str]) -> Self {
        self.all_groups = groups.iter().map(|g| g.to_string()).collect();
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay = Some(Duration::from_millis(ms));
        self
    }

    pub fn find_user_calls(&self) -> usize {
        self.find_user_calls.load(Ordering::SeqCst)
    }

    pub fn membership_calls(&self) -> usize {
        self.membership_calls.load(Ordering::SeqCst)
    }

    pub fn find_groups_calls(&self) -> usize {
        self.find_groups_calls.load(Ordering::SeqCst)
    }

    async fn respond(&self) -> DirectoryResult<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable {
            return Err(DirectoryError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DirectoryClient for StubDirectory {
    fn backend_name(&self) -> &'static str {
        "stub"
    }

    async fn find_user(&self, account_name: &str) -> DirectoryResult<UserRecord> {
        self.find_user_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await?;

        self.users
            .get(account_name)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(account_name.to_string()))
    }

    async fn get_group_membership_for_user(
        &self,
        principal_name: &str,
    ) -> DirectoryResult<Vec<DirectoryGroup>> {
        self.membership_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await?;

        match self.memberships.get(principal_name) {
            Some(groups) if !groups.is_empty() => Ok(groups.iter().map(|g| group(g)).collect()),
            _ => Err(DirectoryError::NotFound(principal_name.to_string())),
        }
    }

    async fn find_groups(&self, _filter: &str) -> DirectoryResult<Vec<DirectoryGroup>> {
        self.find_groups_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await?;

        if self.all_groups.is_empty() {
            return Err(DirectoryError::NotFound("all".into()));
        }
        Ok(self.all_groups.iter().map(|g| group(g)).collect())
    }
}
