use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

pub mod rest;

pub use rest::{DataClient, DataError};

/// Pool for the direct Postgres connection backing the session store.
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await
}

/// Applies the schema the data API serves (clients, campaigns, passes, ...).
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| sqlx::Error::Migrate(Box::new(e)))
}
