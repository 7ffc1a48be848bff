use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use pregmed_backend::{
    app,
    auth::TokenKey,
    config::{Config, StoreBackend},
    cors, db,
    guidance::GuidanceResolver,
    store::{GuidanceStore, MemoryGuidanceStore, PgGuidanceStore},
    AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    match config.store_backend {
        StoreBackend::Postgres => {
            let pool = db::pool(&config).await?;
            db::migrate(pool)
                .await
                .context("failed to run database migrations")?;
            let store = PgGuidanceStore::new(pool.clone(), config.store_timeout);
            serve(&config, store).await
        }
        StoreBackend::Memory => {
            tracing::warn!("⚠️ Using in-memory guidance store, nothing is persisted");
            serve(&config, MemoryGuidanceStore::new()).await
        }
    }
}

async fn serve<S>(config: &Config, store: S) -> Result<()>
where
    S: GuidanceStore + 'static,
{
    let state = AppState {
        resolver: GuidanceResolver::new(Arc::new(store)),
        tokens: Arc::new(TokenKey::new(config.auth_secret.clone())),
    };
    let app = app(state, cors::layer(config.cors_allowed_origins.clone()));

    let listener = config
        .bind()
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;

    tracing::info!("🧠 Server running at {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
