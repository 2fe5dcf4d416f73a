//! Derived totals stored on forum and thread rows.
//!
//! None of these are recomputed by aggregation. Each is bumped by the write
//! that changes it, and must be called inside that write's transaction so the
//! row and its counter commit or roll back together.

use diesel::pg::PgConnection;
use diesel::prelude::*;
use log::debug;

use crate::error::ForumError;
use crate::schema::{forums, threads};

pub fn add_forum_threads(conn: &mut PgConnection, forum: &str, n: i32) -> Result<(), ForumError> {
    let updated = diesel::update(forums::table.filter(forums::slug.eq(forum)))
        .set(forums::threads.eq(forums::threads + n))
        .execute(conn)?;
    if updated == 0 {
        return Err(ForumError::ForumNotFound(forum.to_string()));
    }
    debug!("forum {}: threads += {}", forum, n);
    Ok(())
}

pub fn add_forum_posts(conn: &mut PgConnection, forum: &str, n: i64) -> Result<(), ForumError> {
    let updated = diesel::update(forums::table.filter(forums::slug.eq(forum)))
        .set(forums::posts.eq(forums::posts + n))
        .execute(conn)?;
    if updated == 0 {
        return Err(ForumError::ForumNotFound(forum.to_string()));
    }
    debug!("forum {}: posts += {}", forum, n);
    Ok(())
}

pub fn add_thread_votes(conn: &mut PgConnection, thread: i64, delta: i32) -> Result<(), ForumError> {
    if delta == 0 {
        return Ok(());
    }
    let updated = diesel::update(threads::table.find(thread))
        .set(threads::votes.eq(threads::votes + delta))
        .execute(conn)?;
    if updated == 0 {
        return Err(ForumError::ThreadNotFound(thread.to_string()));
    }
    debug!("thread {}: votes += {}", thread, delta);
    Ok(())
}
