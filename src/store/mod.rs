//! Repository functions over a single PostgreSQL connection.
//!
//! Every public function takes `&mut PgConnection`. Functions that write do
//! so inside one transaction, so callers may nest them inside their own
//! (diesel turns the inner one into a savepoint).

use diesel::pg::PgConnection;
use diesel::r2d2::ConnectionManager;
use log::info;
use r2d2::Pool;

use crate::config::Config;
use crate::error::ForumError;

pub mod counters;
pub mod forums;
pub mod posts;
pub mod service;
pub mod threads;
pub mod users;
pub mod votes;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Schema applied by [`setup_schema`]; also usable with `diesel migration`.
pub const SCHEMA: &str = include_str!("../../migrations/2026-10-19-000000_create_forum/up.sql");

pub fn init_pool(config: &Config) -> Result<PgPool, ForumError> {
    let manager = ConnectionManager::<PgConnection>::new(config.database_url.as_str());
    let pool = Pool::builder()
        .max_size(config.pool_size)
        .connection_timeout(config.connection_timeout)
        .build(manager)?;
    info!(
        "connection pool ready: {} connections, {:?} timeout",
        config.pool_size, config.connection_timeout
    );
    Ok(pool)
}

/// Creates any missing tables and indexes.
pub fn setup_schema(conn: &mut PgConnection) -> Result<(), ForumError> {
    use diesel::connection::SimpleConnection;

    conn.batch_execute(SCHEMA)?;
    Ok(())
}

/// Maps `NotFound` to `None`.
pub(crate) fn optional<T>(result: diesel::QueryResult<T>) -> Result<Option<T>, ForumError> {
    use diesel::OptionalExtension;

    Ok(result.optional()?)
}
