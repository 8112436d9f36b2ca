use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

use super::CallerIdentity;

/// Handler で CallerIdentity を受け取るための extractor
/// identity middleware が request.extensions() に insert 済みである前提
/// 見つからない場合は 500 を返す (middleware 未設定 = 配線ミス)
pub struct Caller(pub CallerIdentity);

impl FromRequestParts<AppState> for Caller
where
    AppState: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .map(Caller)
            .ok_or_else(|| {
                tracing::error!("CallerIdentity missing: identity middleware not applied");
                AppError::Internal
            })
    }
}
