/*
 * Responsibility
 * - 環境変数の読み込み (trust policy, directory 接続設定, HTTP 設定)
 * - 設定値のバリデーション (不足・不正なら起動失敗 = ConfigurationError)
 */
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use axum::http::HeaderName;
use url::Url;

use crate::services::directory::BindCredentials;

/// Identity header used when `TRUSTED_HEADER_NAME` is not set.
pub const DEFAULT_TRUSTED_HEADER: &str = "x-trusted-account";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Reverse-proxy trust policy settings.
#[derive(Debug, Clone)]
pub struct TrustSettings {
    pub enabled: bool,
    pub header_name: HeaderName,
    // Empty = accept any source (warned at startup)
    pub trusted_proxy_ips: Vec<IpAddr>,
    // Development only: bypasses every IP/header check
    pub identity_override: Option<String>,
}

/// Directory connection settings.
#[derive(Debug, Clone)]
pub struct DirectorySettings {
    pub url: Url,
    pub base_dn: String,
    pub credentials: BindCredentials,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub request_timeout_seconds: u64,
    pub trust: TrustSettings,
    pub directory: DirectorySettings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let port: u16 = match get("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(get("APP_ENV"));

        let request_timeout_seconds = get("REQUEST_TIMEOUT_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(30);

        let enabled = get("TRUST_ENABLED").is_some_and(|v| {
            matches!(
                v.to_ascii_lowercase().as_str(),
                "true" | "1" | "yes" | "on"
            )
        });

        let header_name = match get("TRUSTED_HEADER_NAME") {
            Some(raw) => HeaderName::from_bytes(raw.to_ascii_lowercase().as_bytes())
                .map_err(|_| ConfigError::Invalid("TRUSTED_HEADER_NAME"))?,
            None => HeaderName::from_static(DEFAULT_TRUSTED_HEADER),
        };

        let trusted_proxy_ips = get("TRUSTED_PROXY_IPS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<IpAddr>()
                    .map(|ip| ip.to_canonical())
                    .map_err(|_| ConfigError::Invalid("TRUSTED_PROXY_IPS"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let identity_override = get("IDENTITY_OVERRIDE");
        if identity_override.is_some() && app_env.is_production() {
            return Err(ConfigError::Invalid("IDENTITY_OVERRIDE"));
        }

        let url = Url::parse(&require("DIRECTORY_URL")?)
            .map_err(|_| ConfigError::Invalid("DIRECTORY_URL"))?;
        // Only the file-backed directory adapter is built in.
        if url.scheme() != "file" {
            return Err(ConfigError::Invalid("DIRECTORY_URL"));
        }

        let base_dn = require("DIRECTORY_BASE_DN")?;
        let username = require("DIRECTORY_BIND_USERNAME")?;
        let password = lookup("DIRECTORY_BIND_PASSWORD")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("DIRECTORY_BIND_PASSWORD"))?;

        Ok(Self {
            addr,
            app_env,
            request_timeout_seconds,
            trust: TrustSettings {
                enabled,
                header_name,
                trusted_proxy_ips,
                identity_override,
            },
            directory: DirectorySettings {
                url,
                base_dn,
                credentials: BindCredentials { username, password },
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DIRECTORY_URL", "file:///etc/map-authz/directory.json"),
            ("DIRECTORY_BASE_DN", "DC=corp,DC=example"),
            ("DIRECTORY_BIND_USERNAME", "svc-map"),
            ("DIRECTORY_BIND_PASSWORD", "secret"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<Config, ConfigError> {
        Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_apply_when_only_directory_is_set() {
        let config = load(&base()).unwrap();

        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.app_env, AppEnv::Development);
        assert_eq!(config.request_timeout_seconds, 30);
        assert!(!config.trust.enabled);
        assert_eq!(config.trust.header_name.as_str(), DEFAULT_TRUSTED_HEADER);
        assert!(config.trust.trusted_proxy_ips.is_empty());
        assert!(config.trust.identity_override.is_none());
        assert_eq!(config.directory.base_dn, "DC=corp,DC=example");
    }

    #[test]
    fn missing_directory_settings_are_fatal() {
        for key in [
            "DIRECTORY_URL",
            "DIRECTORY_BASE_DN",
            "DIRECTORY_BIND_USERNAME",
            "DIRECTORY_BIND_PASSWORD",
        ] {
            let mut vars = base();
            vars.remove(key);
            assert_eq!(load(&vars).unwrap_err(), ConfigError::Missing(key));
        }
    }

    #[test]
    fn network_directory_urls_are_rejected() {
        let mut vars = base();
        vars.insert("DIRECTORY_URL", "ldaps://dc01.corp.example:636");
        assert_eq!(
            load(&vars).unwrap_err(),
            ConfigError::Invalid("DIRECTORY_URL")
        );
    }

    #[test]
    fn trust_settings_are_parsed() {
        let mut vars = base();
        vars.insert("TRUST_ENABLED", "Yes");
        vars.insert("TRUSTED_HEADER_NAME", "X-Remote-User");
        vars.insert("TRUSTED_PROXY_IPS", "10.0.0.1, ::ffff:10.0.0.2 ,");

        let config = load(&vars).unwrap();
        assert!(config.trust.enabled);
        assert_eq!(config.trust.header_name.as_str(), "x-remote-user");
        let expected: Vec<IpAddr> = vec!["10.0.0.1".parse().unwrap(), "10.0.0.2".parse().unwrap()];
        assert_eq!(config.trust.trusted_proxy_ips, expected);
    }

    #[test]
    fn malformed_proxy_ip_is_invalid() {
        let mut vars = base();
        vars.insert("TRUSTED_PROXY_IPS", "10.0.0.1,proxy.local");
        assert_eq!(
            load(&vars).unwrap_err(),
            ConfigError::Invalid("TRUSTED_PROXY_IPS")
        );
    }

    #[test]
    fn identity_override_is_refused_in_production() {
        let mut vars = base();
        vars.insert("IDENTITY_OVERRIDE", "jdoe");
        assert_eq!(
            load(&vars).unwrap().trust.identity_override.as_deref(),
            Some("jdoe")
        );

        vars.insert("APP_ENV", "production");
        assert_eq!(
            load(&vars).unwrap_err(),
            ConfigError::Invalid("IDENTITY_OVERRIDE")
        );
    }
}
