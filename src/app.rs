/*
 * Responsibility
 * - tracing / panic hook の初期化
 * - Config読み込み → 依存生成 (directory adapter, cache, trust policy) → Router 組み立て
 * - Middleware の適用 (http / identity)
 * - axum::serve() で起動 (送信元 IP のため connect info 付き)
 */
use std::{net::SocketAddr, panic, process, sync::Arc, time::Duration};

use anyhow::Result;
use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::{self, v1::handlers::health::health};
use crate::config::Config;
use crate::middleware;
use crate::services::directory::{DirectoryCache, MembershipService, build_directory_client};
use crate::services::identity::TrustPolicy;
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,map_authz=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting map-authz in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    warn_on_trust_settings(&state.trust);

    let app = build_router(state, Duration::from_secs(config.request_timeout_seconds));

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    // One directory cache per process, owned by the membership service.
    let client = build_directory_client(&config.directory).await?;
    let membership = Arc::new(MembershipService::new(DirectoryCache::new(client)));
    let trust = Arc::new(TrustPolicy::new(&config.trust));

    Ok(AppState::new(trust, membership))
}

fn warn_on_trust_settings(trust: &TrustPolicy) {
    if !trust.is_enabled() {
        tracing::info!("trust policy disabled: every caller is anonymous");
        return;
    }
    if trust.has_override() {
        tracing::error!("IDENTITY_OVERRIDE is set: trusted proxy checks are disabled");
    }
    if trust.allows_any_source() {
        tracing::warn!(
            "TRUSTED_PROXY_IPS is empty: identity headers are accepted from any source"
        );
    }
}

fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes(state.clone()))
        .with_state(state);

    middleware::http::apply(router, request_timeout)
}
