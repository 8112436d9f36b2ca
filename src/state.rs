/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - trust: TrustPolicy, membership: MembershipService (DirectoryCache を所有)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 * - プロセスにつき 1 インスタンス: app::build_state で 1 度だけ生成する
 */
use std::sync::Arc;

use crate::services::{directory::MembershipService, identity::TrustPolicy};

#[derive(Clone, Debug)]
pub struct AppState {
    pub trust: Arc<TrustPolicy>,
    pub membership: Arc<MembershipService>,
}

impl AppState {
    pub fn new(trust: Arc<TrustPolicy>, membership: Arc<MembershipService>) -> Self {
        Self { trust, membership }
    }
}
