//! 呼び出し元 identity の解決 → CallerIdentity を extensions に入れる
//!
//! - reverse proxy が注入した header を trust policy の下でのみ信用する
//! - allow-list 外の送信元は 403 で即拒否 (fail-closed, downgrade しない)
//! - 匿名 (header なし / policy 無効) は拒否せず `CallerIdentity(None)` として通す
//!   認可判断は handler 側の責務

use std::net::SocketAddr;

use axum::{
    Router,
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::CallerIdentity;
use crate::error::AppError;
use crate::services::identity::RequestMeta;
use crate::state::AppState;

/// `/api/v1/*` に identity 解決を掛ける。
///
/// 送信元 IP が必要なので、serve 側は
/// `into_make_service_with_connect_info::<SocketAddr>()` で起動すること。
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, identity_middleware))
}

async fn identity_middleware(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let meta = RequestMeta {
        source_ip: peer.ip(),
        headers: req.headers(),
    };

    let account = match state.trust.resolve_identity(meta) {
        Ok(account) => account,
        Err(err) => {
            tracing::warn!(
                error = %err,
                path = %req.uri().path(),
                "request rejected by trust policy"
            );
            return Err(err.into());
        }
    };

    if let Some(account) = &account {
        tracing::debug!(account = %account, "caller identity resolved");
    }

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(CallerIdentity::new(account));

    Ok(next.run(req).await)
}
