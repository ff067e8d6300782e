//! HTTP server initialization and runtime setup.
//!
//! Wires the database, caches, services, and background tasks together and
//! runs the Axum server until a shutdown signal arrives. Everything is
//! constructed here and injected; no module-level singletons.

use crate::application::services::{
    CaptchaVerifier, LinkResolver, MetadataService, NullCaptchaVerifier, PolicyService,
    TurnstileVerifier,
};
use crate::config::Config;
use crate::domain::visit_worker::run_visit_worker;
use crate::infrastructure::cache::{QueryCache, ResponseCache};
use crate::infrastructure::db::{Db, PoolSettings, RetryPolicy};
use crate::infrastructure::persistence::{
    PgDomainRuleRepository, PgLinkRepository, PgVisitRepository,
};
use crate::routes::app_router;
use crate::state::{AppState, RedirectSettings};
use crate::utils::audit::AuditLog;
use crate::utils::translate::default_translator;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL pool (lazy) and migrations
/// - Process-local caches and their periodic sweep
/// - Background visit worker and database health probe
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if migrations fail, the bind address is unusable, or the
/// server encounters a runtime error.
pub async fn run(config: Config) -> Result<()> {
    let retry = RetryPolicy::new(
        config.db_retry_max_attempts,
        Duration::from_millis(config.db_retry_base_delay_ms),
    );
    let pool_settings = PoolSettings {
        max_connections: config.db_max_connections,
        connect_timeout: Duration::from_secs(config.db_connect_timeout),
        idle_timeout: Duration::from_secs(config.db_idle_timeout),
        max_lifetime: Duration::from_secs(config.db_max_lifetime),
    };
    let db = Arc::new(Db::connect_lazy(&config.database_url, pool_settings, retry)?);

    sqlx::migrate!("./migrations")
        .run(db.pool())
        .await
        .context("failed to run migrations")?;
    tracing::info!("Database ready");

    let audit = AuditLog::new();
    let link_cache = Arc::new(QueryCache::new());
    let rules_cache = Arc::new(QueryCache::new());
    let response_cache = Arc::new(ResponseCache::new(config.response_cache_max_entries));

    let link_repository = Arc::new(PgLinkRepository::new(db.clone()));
    let rule_repository = Arc::new(PgDomainRuleRepository::new(db.clone()));
    let visit_repository = Arc::new(PgVisitRepository::new(db.clone()));

    let resolver = Arc::new(LinkResolver::new(
        link_repository,
        visit_repository,
        link_cache.clone(),
        Duration::from_secs(config.link_cache_ttl_seconds),
        Duration::from_secs(config.dedup_ttl_seconds),
        audit.clone(),
    ));

    let policy = Arc::new(PolicyService::new(
        rule_repository,
        rules_cache.clone(),
        config.security_mode,
        config.policy_fail_open,
        Duration::from_secs(config.rules_cache_ttl_seconds),
        audit.clone(),
    ));

    let captcha: Arc<dyn CaptchaVerifier> = match &config.turnstile_secret {
        Some(secret) => {
            tracing::info!("CAPTCHA enabled (Turnstile)");
            Arc::new(TurnstileVerifier::new(
                secret.clone(),
                config.captcha_verify_url.clone(),
                Duration::from_secs(config.captcha_timeout_seconds),
            )?)
        }
        None => {
            tracing::info!("CAPTCHA disabled");
            Arc::new(NullCaptchaVerifier::new())
        }
    };

    let metadata = Arc::new(MetadataService::new(
        Duration::from_secs(config.metadata_timeout_seconds),
        Duration::from_secs(config.dedup_ttl_seconds),
    )?);

    let (visit_tx, visit_rx) = mpsc::channel(config.visit_queue_capacity);
    tokio::spawn(run_visit_worker(visit_rx, resolver.clone()));
    tracing::info!("Visit worker started");

    spawn_cache_sweep(
        Duration::from_secs(config.sweep_interval_seconds),
        link_cache,
        rules_cache,
        response_cache.clone(),
        metadata.clone(),
    );
    spawn_health_probe(
        Duration::from_secs(config.health_interval_seconds),
        db.clone(),
    );

    let state = AppState {
        resolver,
        policy,
        captcha,
        metadata,
        response_cache,
        visit_sender: visit_tx,
        db: Some(db.clone()),
        settings: Arc::new(RedirectSettings {
            wait_seconds: config.wait_seconds,
            block_close_seconds: config.block_close_seconds,
            password_signing_secret: config.password_signing_secret.clone(),
            response_cache_ttl: Duration::from_secs(config.response_cache_ttl_seconds),
            response_cache_stale: Duration::from_secs(config.response_cache_stale_seconds),
        }),
        translator: default_translator(),
        audit,
    };

    let app = app_router(state, config.behind_proxy);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Shutting down, closing database pool");
    db.close().await;

    Ok(())
}

/// Periodically drops expired cache entries.
fn spawn_cache_sweep(
    interval: Duration,
    link_cache: Arc<QueryCache<crate::domain::entities::ShortLink>>,
    rules_cache: Arc<QueryCache<Vec<crate::domain::entities::DomainRule>>>,
    response_cache: Arc<ResponseCache>,
    metadata: Arc<MetadataService>,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = link_cache.evict_expired()
                + rules_cache.evict_expired()
                + response_cache.evict_expired()
                + metadata.evict_expired();
            if evicted > 0 {
                tracing::debug!(evicted, "cache sweep");
            }
        }
    });
}

/// Periodically verifies database connectivity.
fn spawn_health_probe(interval: Duration, db: Arc<Db>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if !db.health_check().await {
                tracing::warn!("periodic database health check failed");
            }
        }
    });
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
