use sqlx::migrate::Migrator;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlPool, MySqlPoolOptions};
use sqlx::Connection;
use std::io;

use crate::config::DatabaseConfig;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub fn connect_options(config: &DatabaseConfig) -> MySqlConnectOptions {
    MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.username)
        .password(&config.password)
        .database(&config.database)
        .charset(&config.charset)
}

/// Opens the pool after one direct connection attempt, so an unreachable or
/// misconfigured database fails here rather than on first use. The attempt is
/// not retried; the pool's own retry loop only applies to later acquires.
pub async fn create_pool(config: &DatabaseConfig) -> Result<MySqlPool, sqlx::Error> {
    let options = connect_options(config);

    let first = tokio::time::timeout(
        config.acquire_timeout(),
        MySqlConnection::connect_with(&options),
    )
    .await
    .map_err(|_| {
        sqlx::Error::Io(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("timed out connecting to {}", config.masked_url()),
        ))
    })??;

    first.close().await?;

    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect_lazy_with(options);

    tracing::info!(
        "Connected to {} (max {} connections)",
        config.masked_url(),
        config.max_connections
    );
    Ok(pool)
}

pub async fn run_migrations(pool: &MySqlPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}

pub async fn health_check(pool: &MySqlPool) -> bool {
    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!("Database health check failed: {}", e);
            false
        }
    }
}
