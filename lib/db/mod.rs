pub mod models;
pub mod schema;

use std::error::Error;

use diesel::{pg::PgConnection, Connection};
use diesel_async::{
    pg::AsyncPgConnection,
    pooled_connection::{
        deadpool::{BuildError, Pool},
        AsyncDieselConnectionManager,
    },
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Applies pending migrations over a short-lived blocking connection. Returns how many ran.
pub async fn run_migrations(db_url: &str) -> Result<usize, Box<dyn Error + Send + Sync>> {
    let db_url = db_url.to_string();
    tokio::task::spawn_blocking(move || -> Result<usize, Box<dyn Error + Send + Sync>> {
        let mut conn = PgConnection::establish(&db_url)?;
        let applied = conn.run_pending_migrations(MIGRATIONS)?;
        Ok(applied.len())
    })
    .await?
}

pub async fn build_db_pool(
    db_url: &str,
    max_size: usize,
) -> Result<Pool<AsyncPgConnection>, BuildError> {
    let pool_config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(db_url);
    let pool = Pool::builder(pool_config).max_size(max_size).build()?;

    Ok(pool)
}
