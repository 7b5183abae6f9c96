/*
 * Responsibility
 * - Config読み込み → 依存生成 (PgPool, migration, TokenMaker, ObjectStore) → Router 組み立て
 * - Middleware の適用 (access gate 以外の全ルート共通分)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::Config,
    middleware,
    services::{
        password,
        storage::{LocalObjectStore, SharedObjectStore},
        token::{JweTokenMaker, SharedTokenMaker},
    },
    state::AppState,
};

const DB_MAX_CONNECTIONS: u32 = 10;

fn init_tracing() {
    // RUST_LOG が優先。例: RUST_LOG=info,dropbyte=debug,tower_http=debug cargo run
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

        // development では即落とす
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
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );
    tracing::debug!(?config, "loaded configuration");

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let tokens: SharedTokenMaker = Arc::new(
        JweTokenMaker::new(config.symmetric_key.as_bytes())
            .context("failed to create token maker")?,
    );

    let db = PgPoolOptions::new()
        .max_connections(DB_MAX_CONNECTIONS)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("failed to run migrations")?;

    let store: SharedObjectStore = Arc::new(
        LocalObjectStore::open(&config.storage_dir, config.storage_bucket.as_str())
            .await
            .with_context(|| format!("failed to open storage at {:?}", config.storage_dir))?,
    );
    tracing::info!(
        backend = store.backend_name(),
        bucket = %config.storage_bucket,
        "object store ready"
    );

    // login の unknown email 用 dummy hash を先に作っておく
    tokio::task::spawn_blocking(password::prime_dummy_hash).await?;

    Ok(AppState::new(
        db,
        tokens,
        store,
        config.access_token_duration,
        config.max_upload_bytes,
    ))
}

fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .nest("/api/v1", api::v1::routes(&state))
        .with_state(state);

    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config.app_env, &config.cors_allowed_origins);
    middleware::http::apply(router, config.max_upload_bytes)
}
