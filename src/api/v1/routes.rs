/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /whoami, /directory/ 配下を定義し、identity middleware をまとめて適用する
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware;
use crate::state::AppState;

use crate::api::v1::handlers::{
    directory::{
        available_groups, common_groups, dump_groups, dump_groups_per_user, dump_users,
        flush_cache, user_groups, user_member_of, user_validity,
    },
    whoami::whoami,
};

pub fn routes(state: AppState) -> Router<AppState> {
    let router = Router::new()
        .route("/whoami", get(whoami))
        .route("/directory/users/{account}/valid", get(user_validity))
        .route("/directory/users/{account}/groups", get(user_groups))
        .route(
            "/directory/users/{account}/groups/{group}",
            get(user_member_of),
        )
        .route("/directory/groups", get(available_groups))
        .route("/directory/groups/common", post(common_groups))
        .route("/directory/cache/flush", post(flush_cache))
        .route("/directory/cache/users", get(dump_users))
        .route("/directory/cache/groups", get(dump_groups))
        .route("/directory/cache/groups-per-user", get(dump_groups_per_user));

    middleware::identity::apply(router, state)
}
