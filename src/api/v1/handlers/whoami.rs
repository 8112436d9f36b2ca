/*
 * Responsibility
 * - GET /whoami
 * - middleware が解決した呼び出し元と、その validity / group membership を返す
 * - 匿名の場合は directory に問い合わせない
 */
use axum::{Json, extract::State};

use crate::{
    api::v1::{dto::directory::WhoAmIResponse, extractors::Caller},
    state::AppState,
};

pub async fn whoami(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Json<WhoAmIResponse> {
    let Some(account) = caller.account() else {
        return Json(WhoAmIResponse {
            account: None,
            valid: false,
            groups: Vec::new(),
        });
    };

    let (valid, groups) = tokio::join!(
        state.membership.is_user_valid(account),
        state.membership.get_group_membership_for_user(account)
    );

    Json(WhoAmIResponse {
        account: Some(account.to_string()),
        valid,
        groups,
    })
}
