/*!
 * Pharmacy Backend
 *
 * Main application entry point for the Axum-based REST API server.
 */

mod config;
mod crypto;
mod db;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod state;
mod utils;

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use db::create_pool;
use middleware::{
    audit::audit_middleware, cors::cors_from_settings, rate_limit::rate_limit_middleware,
    request_context::request_context_middleware, request_validation::request_validation_middleware,
    security_headers::{security_headers_middleware_with_config, SecurityHeadersConfig},
};
use models::{User, UserRole};
use routes::create_api_v1_routes;
use state::AppState;
use utils::{EncryptionKey, PasswordHasherUtil};

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_seconds: u64,
    database: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting pharmacy backend, version {}", env!("CARGO_PKG_VERSION"));

    // Step 1: load and validate config.
    let config = Config::from_env()?;
    tracing::info!(environment = %config.server.environment, "configuration loaded");

    // Step 2: initialize the encryption kernel. Fail fast on a bad key —
    // every encrypted customer field depends on this being set before any
    // query touches the customer/order tables.
    let encryption_key = EncryptionKey::from_str(&config.security.encryption_key)
        .map_err(|e| anyhow::anyhow!("invalid encryption key: {e}"))?;
    crypto::init_encryption_key(encryption_key)
        .map_err(|e| anyhow::anyhow!("encryption kernel already initialized: {e}"))?;
    tracing::info!("encryption kernel initialized");

    // Step 3: open the persistence pool.
    let pool = create_pool(&config.database).await?;
    tracing::info!("database connection pool ready");

    // Step 4: seed a default admin if none exists.
    seed_default_admin(&pool).await?;

    let app_state = AppState::new(pool.clone(), config.clone());

    // Step 5 (session cache) is the in-process session blacklist; there is
    // no external cache connection to open.

    spawn_session_sweeper(app_state.clone());
    spawn_cart_sweeper(app_state.clone());

    let app = create_app(app_state, &config);

    // Step 6: start listening (bind 0.0.0.0 if host is empty/localhost).
    let addr: SocketAddr = format!("{}:{}", config.server.bind_host(), config.server.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{addr}");

    // Step 7: drain in-flight requests on signal, then close pools.
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("shutdown complete");
    Ok(())
}

/// Seeds a single admin account when the user table is empty. Credentials come from `DEFAULT_ADMIN_*` environment variables,
/// read directly rather than through `Config` since they are only ever
/// needed once, at first boot.
async fn seed_default_admin(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    if User::count(pool).await? > 0 {
        return Ok(());
    }

    let username = std::env::var("DEFAULT_ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
    let email = std::env::var("DEFAULT_ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
    let password = std::env::var("DEFAULT_ADMIN_PASSWORD")
        .map_err(|_| anyhow::anyhow!("DEFAULT_ADMIN_PASSWORD must be set to seed the first admin account"))?;

    PasswordHasherUtil::validate_password_complexity(&password, None)
        .map_err(|e| anyhow::anyhow!("DEFAULT_ADMIN_PASSWORD: {e}"))?;
    let password_hash = PasswordHasherUtil::hash_password(&password)?;

    User::create(pool, &username, &email, &password_hash, UserRole::Admin, None).await?;
    tracing::info!(username = %username, "seeded default admin account");
    Ok(())
}

fn spawn_session_sweeper(state: AppState) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        loop {
            ticker.tick().await;
            state.session_blacklist.sweep();
        }
    });
}

fn spawn_cart_sweeper(state: AppState) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(300));
        loop {
            ticker.tick().await;
            match models::CartItem::purge_expired(&state.pool).await {
                Ok(n) if n > 0 => tracing::info!(count = n, "purged expired cart items"),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "cart expiry sweep failed"),
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, draining in-flight requests (up to 30s)");
}

/// Builds the middleware chain. Layers are applied in the
/// reverse of their execution order: the last `.layer()` call is outermost
/// and sees the request first, so request-id/logging/panic-recovery wrap
/// everything and audit sits innermost, right before the per-route auth
/// layers inside `create_api_v1_routes`.
fn create_app(state: AppState, config: &Config) -> Router {
    let pool_for_health = state.pool.clone();
    let start_time = state.start_time;
    let cors_layer = cors_from_settings(&config.cors, config.server.is_production());
    let headers_config = SecurityHeadersConfig::from_server_config(&config.server);

    Router::new()
        .route("/health", get(move || health_handler(pool_for_health.clone(), start_time)))
        .route("/", get(root_handler))
        .nest("/api/v1", create_api_v1_routes(state.clone()))
        .layer(axum::middleware::from_fn_with_state(state.clone(), audit_middleware))
        .layer(axum::middleware::from_fn(request_validation_middleware))
        .layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(cors_layer)
        .layer(axum::middleware::from_fn(move |req, next| {
            security_headers_middleware_with_config(headers_config.clone(), req, next)
        }))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_context_middleware))
}

async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "Pharmacy Backend API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "operational",
        "api": "/api/v1",
    }))
}

async fn health_handler(pool: sqlx::PgPool, start_time: std::time::Instant) -> impl IntoResponse {
    let db_status = match sqlx::query("SELECT 1").execute(&pool).await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::error!(error = %e, "database health check failed");
            "disconnected"
        }
    };

    let status_code = if db_status == "connected" { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status_code,
        Json(HealthResponse {
            status: if db_status == "connected" { "healthy" } else { "unhealthy" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: start_time.elapsed().as_secs(),
            database: db_status.to_string(),
        }),
    )
}
