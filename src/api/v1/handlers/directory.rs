/*
 * Responsibility
 * - /directory 系 handler (管理ツール / 運用向け)
 * - validity / membership / common groups の問い合わせ
 * - cache の flush と read-only dump
 * - directory 障害は service 側で negative cache に変換済み (ここには届かない)
 */
use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    api::v1::dto::directory::{
        CommonGroupsRequest, GroupsResponse, MembershipResponse, UserGroupsResponse,
        UserValidityResponse,
    },
    error::AppError,
    services::directory::{UserRecord, cache::CacheEntry},
    state::AppState,
};

pub async fn user_validity(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> Json<UserValidityResponse> {
    let valid = state.membership.is_user_valid(&account).await;

    Json(UserValidityResponse { account, valid })
}

pub async fn user_groups(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> Json<UserGroupsResponse> {
    let groups = state.membership.get_group_membership_for_user(&account).await;

    Json(UserGroupsResponse { account, groups })
}

pub async fn user_member_of(
    State(state): State<AppState>,
    Path((account, group)): Path<(String, String)>,
) -> Result<Json<MembershipResponse>, AppError> {
    let member = state.membership.is_user_member_of(&account, &group).await?;

    Ok(Json(MembershipResponse {
        account,
        group,
        member,
    }))
}

pub async fn available_groups(State(state): State<AppState>) -> Json<GroupsResponse> {
    let groups = state.membership.get_available_groups().await;

    Json(GroupsResponse { groups })
}

pub async fn common_groups(
    State(state): State<AppState>,
    Json(req): Json<CommonGroupsRequest>,
) -> Result<Json<GroupsResponse>, AppError> {
    req.validate()
        .map_err(|message| AppError::bad_request("INVALID_ARGUMENT", message))?;

    let groups = state
        .membership
        .find_common_groups_for_users(req.users.as_slice())
        .await?;

    Ok(Json(GroupsResponse { groups }))
}

pub async fn flush_cache(State(state): State<AppState>) -> StatusCode {
    state.membership.flush();
    StatusCode::NO_CONTENT
}

pub async fn dump_users(
    State(state): State<AppState>,
) -> Json<BTreeMap<String, CacheEntry<UserRecord>>> {
    Json(state.membership.cache().dump_users())
}

pub async fn dump_groups(State(state): State<AppState>) -> Json<Option<CacheEntry<Vec<String>>>> {
    Json(state.membership.cache().dump_available_groups())
}

pub async fn dump_groups_per_user(
    State(state): State<AppState>,
) -> Json<BTreeMap<String, CacheEntry<Vec<String>>>> {
    Json(state.membership.cache().dump_groups_per_user())
}
