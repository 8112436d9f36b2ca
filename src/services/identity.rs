//! Caller identity from a reverse-proxy-injected header.
//!
//! The upstream proxy authenticates the user and forwards the account name in
//! a header. That header is only believed when the request comes from an
//! allow-listed proxy address; otherwise the request is rejected outright
//! (fail-closed).
use std::{collections::HashSet, net::IpAddr};

use axum::http::{HeaderMap, HeaderName};
use thiserror::Error;

use crate::config::TrustSettings;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("request source {source_ip} is not a trusted proxy")]
    TrustViolation { source_ip: IpAddr },
}

/// Request metadata the trust decision needs.
#[derive(Debug, Clone, Copy)]
pub struct RequestMeta<'a> {
    pub source_ip: IpAddr,
    pub headers: &'a HeaderMap,
}

#[derive(Debug, Clone)]
pub struct TrustPolicy {
    enabled: bool,
    header_name: HeaderName,
    trusted_proxy_ips: HashSet<IpAddr>,
    identity_override: Option<String>,
}

impl TrustPolicy {
    pub fn new(settings: &TrustSettings) -> Self {
        Self {
            enabled: settings.enabled,
            header_name: settings.header_name.clone(),
            trusted_proxy_ips: settings
                .trusted_proxy_ips
                .iter()
                .map(IpAddr::to_canonical)
                .collect(),
            identity_override: settings
                .identity_override
                .clone()
                .filter(|v| !v.trim().is_empty()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn allows_any_source(&self) -> bool {
        self.trusted_proxy_ips.is_empty()
    }

    pub fn has_override(&self) -> bool {
        self.identity_override.is_some()
    }

    /// Resolve the caller's account name.
    ///
    /// - `Ok(None)`: anonymous (policy disabled, or header absent/empty)
    /// - `Err(TrustViolation)`: the caller must reject the request
    pub fn resolve_identity(
        &self,
        meta: RequestMeta<'_>,
    ) -> Result<Option<String>, IdentityError> {
        if !self.enabled {
            return Ok(None);
        }

        if let Some(account) = &self.identity_override {
            tracing::warn!(
                account = %account,
                "IDENTITY_OVERRIDE is active: trust checks bypassed (development only)"
            );
            return Ok(Some(account.clone()));
        }

        let source_ip = meta.source_ip.to_canonical();
        if self.allows_any_source() {
            tracing::warn!(
                source_ip = %source_ip,
                "trusted proxy allow-list is empty: accepting identity header from any source"
            );
        } else if !self.trusted_proxy_ips.contains(&source_ip) {
            tracing::warn!(source_ip = %source_ip, "identity header from untrusted source");
            return Err(IdentityError::TrustViolation { source_ip });
        }

        let account = meta
            .headers
            .get(&self.header_name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        Ok(account)
    }
}
