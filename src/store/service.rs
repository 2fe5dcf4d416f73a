use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use log::info;

use crate::error::ForumError;
use crate::models::Status;
use crate::schema::{forums, posts, threads, users};

pub fn status(conn: &mut PgConnection) -> Result<Status, ForumError> {
    Ok(Status {
        forum: forums::table.count().get_result(conn)?,
        thread: threads::table.count().get_result(conn)?,
        post: posts::table.count().get_result(conn)?,
        user: users::table.count().get_result(conn)?,
    })
}

/// Removes every row from every table and restarts the id sequences.
pub fn clear(conn: &mut PgConnection) -> Result<(), ForumError> {
    conn.batch_execute("TRUNCATE votes, posts, threads, forums, users RESTART IDENTITY CASCADE")?;
    info!("all forum data cleared");
    Ok(())
}
