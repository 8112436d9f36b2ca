/*
 * Responsibility
 * - Handler から見える「呼び出し元」の型
 * - middleware が trust policy の下で解決して request extensions に格納する
 *
 * Notes
 * - `None` は匿名 (policy 無効 / header なし)。拒否ではない
 * - 認可 (group membership など) は handler / MembershipService 側の責務
 */

/// Account name asserted by a trusted proxy, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerIdentity {
    account: Option<String>,
}

impl CallerIdentity {
    pub fn new(account: Option<String>) -> Self {
        Self { account }
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }
}
