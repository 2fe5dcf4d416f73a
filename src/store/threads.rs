use chrono::prelude::*;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use log::debug;

use super::{counters, forums, optional, users};
use crate::error::ForumError;
use crate::models::{Thread, ThreadDraft, ThreadInsert, ThreadPatch};
use crate::query::{Direction, ThreadRef, ThreadsQuery};
use crate::schema::threads;

pub fn lookup_thread(
    conn: &mut PgConnection,
    thread: &ThreadRef,
) -> Result<Option<Thread>, ForumError> {
    match *thread {
        ThreadRef::Id(id) => optional(threads::table.find(id).first::<Thread>(conn)),
        ThreadRef::Slug(ref slug) => optional(
            threads::table
                .filter(threads::slug.eq(slug))
                .first::<Thread>(conn),
        ),
    }
}

pub fn find_thread(conn: &mut PgConnection, thread: &ThreadRef) -> Result<Thread, ForumError> {
    lookup_thread(conn, thread)?.ok_or_else(|| ForumError::ThreadNotFound(thread.to_string()))
}

/// Creates a thread in `forum` and bumps the forum's thread counter in the
/// same transaction.
pub fn create_thread(
    conn: &mut PgConnection,
    forum: &str,
    draft: &ThreadDraft,
) -> Result<Thread, ForumError> {
    conn.transaction(|conn| {
        let author = users::find_user(conn, &draft.author)?;
        let forum = forums::find_forum(conn, forum)?;

        if let Some(slug) = draft.slug() {
            if let Some(existing) = lookup_thread(conn, &ThreadRef::Slug(slug.to_string()))? {
                return Err(ForumError::ThreadConflict(existing));
            }
        }

        let thread = diesel::insert_into(threads::table)
            .values(ThreadInsert {
                title: &draft.title,
                author: &author.nickname,
                forum: &forum.slug,
                message: &draft.message,
                slug: draft.slug(),
                created: draft.created.unwrap_or_else(Utc::now),
            })
            .get_result::<Thread>(conn)?;

        counters::add_forum_threads(conn, &forum.slug, 1)?;
        debug!("created thread {} in {}", thread.id, thread.forum);
        Ok(thread)
    })
}

/// Replaces a thread's title and message. Empty fields keep their stored
/// value; if both are empty the thread is returned unchanged.
pub fn update_thread(
    conn: &mut PgConnection,
    thread: &ThreadRef,
    patch: &ThreadPatch,
) -> Result<Thread, ForumError> {
    conn.transaction(|conn| {
        let current = find_thread(conn, thread)?;
        if patch.title.is_empty() && patch.message.is_empty() {
            return Ok(current);
        }

        let title = if patch.title.is_empty() {
            &current.title
        } else {
            &patch.title
        };
        let message = if patch.message.is_empty() {
            &current.message
        } else {
            &patch.message
        };

        let updated = diesel::update(threads::table.find(current.id))
            .set((threads::title.eq(title), threads::message.eq(message)))
            .get_result::<Thread>(conn)?;
        Ok(updated)
    })
}

/// Threads of a forum ordered by creation time. `since` is inclusive and a
/// negative limit lists nothing.
pub fn forum_threads(
    conn: &mut PgConnection,
    forum: &str,
    query: &ThreadsQuery,
) -> Result<Vec<Thread>, ForumError> {
    let forum = forums::find_forum(conn, forum)?;

    let mut select = threads::table
        .filter(threads::forum.eq(&forum.slug))
        .into_boxed();

    select = match (query.direction, query.since) {
        (Direction::Asc, Some(since)) => select.filter(threads::created.ge(since)),
        (Direction::Desc, Some(since)) => select.filter(threads::created.le(since)),
        (_, None) => select,
    };
    select = match query.direction {
        Direction::Asc => select.order((threads::created.asc(), threads::id.asc())),
        Direction::Desc => select.order((threads::created.desc(), threads::id.desc())),
    };

    Ok(select.limit(query.limit.max(0)).load::<Thread>(conn)?)
}
