//! Postgres pool for the admin and quiz stores.
//!
//! `main` opens the pool once, before the router and the VK relay start,
//! and applies the embedded schema in `migrations/`.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Connect with at most `max_connections` and bring the schema up to date.
///
/// # Errors
///
/// Returns the connect or migration error; startup treats either as fatal.
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    sqlx::migrate!("src/db/migrations").run(&pool).await?;
    tracing::info!(max_connections, "database ready");

    Ok(pool)
}
