use anyhow::Context;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Sqlite, SqlitePool};

use crate::config::DatabaseSettings;

/// Open the pool for the configured database, creating the database file if
/// it does not exist yet, and bring the schema up to date.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<SqlitePool> {
    if !Sqlite::database_exists(&settings.url).await.unwrap_or(false) {
        Sqlite::create_database(&settings.url)
            .await
            .context("Could not create the database")?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.url)
        .await
        .context("Could not open a connection pool")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Could not run database migrations")?;

    Ok(pool)
}
