//! PostgreSQL connection pool initialization.
//!
//! The database URL is read from the `DATABASE_URL` environment variable.
//! The returned pool is cheaply cloneable and is handed to the Postgres
//! store implementations in [`crate::state`].

use sqlx::PgPool;
use std::env;

/// Initializes the PostgreSQL connection pool.
///
/// # Panics
///
/// Panics if `DATABASE_URL` is not set or the connection cannot be
/// established. Called once during startup, before the server accepts
/// traffic.
pub async fn init_db_pool() -> PgPool {
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to database")
}
