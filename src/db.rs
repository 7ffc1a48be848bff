//! Process-wide Postgres pool. Created once on first use and reused for the
//! life of the process; nothing else in the crate opens connections.

use sqlx::{postgres::PgPoolOptions, PgPool};
use tokio::sync::OnceCell;

use crate::config::Config;

static POOL: OnceCell<PgPool> = OnceCell::const_new();

pub async fn pool(config: &Config) -> anyhow::Result<&'static PgPool> {
    let database_url = config
        .database_url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;

    let pool = POOL
        .get_or_try_init(|| async {
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(config.store_timeout)
                .connect(database_url)
                .await?;
            tracing::info!("✅ Postgres connected");
            Ok::<_, sqlx::Error>(pool)
        })
        .await?;

    Ok(pool)
}

pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
