/*
 * Responsibility
 * - directory 系 endpoint の request/response DTO
 * - validation (形式チェック) は validate() に置く
 */
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub account: Option<String>,
    pub valid: bool,
    pub groups: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct UserValidityResponse {
    pub account: String,
    pub valid: bool,
}

#[derive(Debug, Serialize)]
pub struct UserGroupsResponse {
    pub account: String,
    pub groups: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub account: String,
    pub group: String,
    pub member: bool,
}

#[derive(Debug, Serialize)]
pub struct GroupsResponse {
    pub groups: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommonGroupsRequest {
    pub users: Vec<String>,
}

impl CommonGroupsRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.users.is_empty() {
            return Err("users must not be empty");
        }
        if self.users.iter().any(|u| u.trim().is_empty()) {
            return Err("users must not contain blank account names");
        }
        Ok(())
    }
}
