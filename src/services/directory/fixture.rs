use async_trait::async_trait;
use serde::Deserialize;
use std::{collections::HashMap, path::Path};

use crate::services::directory::client::{
    BindCredentials, DirectoryClient, DirectoryError, DirectoryGroup, DirectoryResult, UserRecord,
};

/// On-disk fixture layout.
///
/// ```json
/// {
///   "bind": { "username": "svc-map", "password": "secret" },
///   "users": [{ "sAMAccountName": "jdoe", "userPrincipalName": "jdoe@corp.example" }],
///   "groups": [{ "cn": "Admins", "dn": "CN=Admins,OU=Groups,DC=corp,DC=example" }],
///   "memberships": { "jdoe@corp.example": ["Admins"] }
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct FixtureDocument {
    #[serde(default)]
    pub bind: Option<BindCredentials>,
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub groups: Vec<DirectoryGroup>,
    #[serde(default)]
    pub memberships: HashMap<String, Vec<String>>,
}

/// In-memory directory loaded from a JSON document.
///
/// Only entries under `base_dn` (or without a DN at all) are visible.
/// A `bind` block that does not match the configured credentials makes
/// every call fail as if the directory had refused the bind.
#[derive(Debug)]
pub struct FixtureDirectory {
    doc: FixtureDocument,
    base_dn: String,
    bind_accepted: bool,
}

impl FixtureDirectory {
    pub async fn load(
        path: &Path,
        base_dn: &str,
        credentials: &BindCredentials,
    ) -> DirectoryResult<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            DirectoryError::Unavailable(format!("cannot read {}: {e}", path.display()))
        })?;
        let doc: FixtureDocument = serde_json::from_str(&raw)
            .map_err(|e| DirectoryError::InvalidResponse(e.to_string()))?;

        Ok(Self::from_document(doc, base_dn, credentials))
    }

    pub fn from_document(
        doc: FixtureDocument,
        base_dn: &str,
        credentials: &BindCredentials,
    ) -> Self {
        let bind_accepted = doc.bind.as_ref().is_none_or(|expected| {
            expected.username == credentials.username && expected.password == credentials.password
        });

        Self {
            doc,
            base_dn: base_dn.trim().to_ascii_lowercase(),
            bind_accepted,
        }
    }

    fn bind(&self) -> DirectoryResult<()> {
        if self.bind_accepted {
            Ok(())
        } else {
            Err(DirectoryError::Unavailable("bind rejected".into()))
        }
    }

    fn in_scope(&self, dn: Option<&str>) -> bool {
        let Some(dn) = dn else {
            return true;
        };
        if self.base_dn.is_empty() {
            return true;
        }
        let dn = dn.trim().to_ascii_lowercase();
        dn == self.base_dn || dn.ends_with(&format!(",{}", self.base_dn))
    }

    fn visible_groups(&self) -> impl Iterator<Item = &DirectoryGroup> {
        self.doc
            .groups
            .iter()
            .filter(|g| self.in_scope(g.dn.as_deref()))
    }
}

#[async_trait]
impl DirectoryClient for FixtureDirectory {
    fn backend_name(&self) -> &'static str {
        "fixture"
    }

    async fn find_user(&self, account_name: &str) -> DirectoryResult<UserRecord> {
        self.bind()?;

        self.doc
            .users
            .iter()
            .filter(|u| self.in_scope(u.dn.as_deref()))
            .find(|u| {
                u.sam_account_name
                    .as_deref()
                    .is_some_and(|name| name.eq_ignore_ascii_case(account_name))
            })
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(account_name.to_string()))
    }

    async fn get_group_membership_for_user(
        &self,
        principal_name: &str,
    ) -> DirectoryResult<Vec<DirectoryGroup>> {
        self.bind()?;

        let names = self
            .doc
            .memberships
            .iter()
            .find(|(principal, _)| principal.eq_ignore_ascii_case(principal_name))
            .map(|(_, names)| names)
            .ok_or_else(|| DirectoryError::NotFound(principal_name.to_string()))?;

        // Membership names without a group entry still resolve to a bare group.
        let groups: Vec<DirectoryGroup> = names
            .iter()
            .filter_map(|name| {
                match self.doc.groups.iter().find(|g| g.cn.eq_ignore_ascii_case(name)) {
                    Some(group) if self.in_scope(group.dn.as_deref()) => Some(group.clone()),
                    Some(_) => None,
                    None => Some(DirectoryGroup {
                        cn: name.clone(),
                        dn: None,
                        description: None,
                    }),
                }
            })
            .collect();

        if groups.is_empty() {
            return Err(DirectoryError::NotFound(principal_name.to_string()));
        }
        Ok(groups)
    }

    async fn find_groups(&self, filter: &str) -> DirectoryResult<Vec<DirectoryGroup>> {
        self.bind()?;

        let filter = filter.trim();
        let match_all = filter.eq_ignore_ascii_case("all") || filter == "*";

        let groups: Vec<DirectoryGroup> = self
            .visible_groups()
            .filter(|g| match_all || g.cn.eq_ignore_ascii_case(filter))
            .cloned()
            .collect();

        if groups.is_empty() {
            return Err(DirectoryError::NotFound(filter.to_string()));
        }
        Ok(groups)
    }
}
