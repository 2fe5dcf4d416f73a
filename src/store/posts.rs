//! Post batches and the three post listings.

use std::collections::HashMap;

use chrono::prelude::*;
use diesel::dsl::sql;
use diesel::expression::SqlLiteral;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use diesel::QueryableByName;
use log::{debug, warn};

use super::{counters, forums, optional, threads, users};
use crate::error::ForumError;
use crate::models::{Post, PostDetails, PostDraft, PostInsert, Related, Thread};
use crate::path::{ParentPost, PathAssigner, PostPath};
use crate::query::{Direction, PostsQuery, SortMode, ThreadRef};
use crate::schema::posts;

/// Draws `n` ids from the posts sequence, in ascending order.
const ALLOCATE_IDS: &str = "SELECT nextval(pg_get_serial_sequence('posts', 'id')) AS id \
                            FROM generate_series(1, $1) ORDER BY 1";

#[derive(QueryableByName)]
struct AllocatedId {
    #[diesel(sql_type = BigInt)]
    id: i64,
}

/// First element of the stored path: the id of the conversation's root.
fn path_root() -> SqlLiteral<BigInt> {
    sql::<BigInt>("posts.path[1]")
}

fn allocate_ids(conn: &mut PgConnection, n: usize) -> Result<Vec<i64>, ForumError> {
    let ids = diesel::sql_query(ALLOCATE_IDS)
        .bind::<BigInt, _>(n as i64)
        .load::<AllocatedId>(conn)?;
    Ok(ids.into_iter().map(|row| row.id).collect())
}

fn lookup_parent(conn: &mut PgConnection, id: i64) -> Result<Option<ParentPost>, ForumError> {
    let found = optional(
        posts::table
            .find(id)
            .select((posts::thread, posts::path))
            .first::<(i64, PostPath)>(conn),
    )?;
    Ok(found.map(|(thread, path)| ParentPost { thread, path }))
}

fn lookup_path(conn: &mut PgConnection, id: i64) -> Result<Option<PostPath>, ForumError> {
    optional(
        posts::table
            .find(id)
            .select(posts::path)
            .first::<PostPath>(conn),
    )
}

/// Writes a batch of posts into `thread`.
///
/// Ids are drawn ahead of the insert so every path can be built before any
/// row exists. All posts share one creation time. Either every post is
/// written and the forum's post counter grows by the batch size, or nothing
/// is written at all. Posts come back in the order of `drafts`.
pub fn create_posts(
    conn: &mut PgConnection,
    thread: &Thread,
    drafts: &[PostDraft],
) -> Result<Vec<Post>, ForumError> {
    if drafts.is_empty() {
        return Ok(Vec::new());
    }

    let result = conn.transaction::<_, ForumError, _>(|conn| {
        let ids = allocate_ids(conn, drafts.len())?;
        let created = Utc::now();
        let mut assigner = PathAssigner::new(thread.id);
        let mut authors: HashMap<&str, String> = HashMap::new();
        let mut rows = Vec::with_capacity(drafts.len());

        for (draft, &id) in drafts.iter().zip(ids.iter()) {
            let author = match authors.get(draft.author.as_str()) {
                Some(nickname) => nickname.clone(),
                None => {
                    let user = users::lookup_user(conn, &draft.author)?
                        .ok_or_else(|| ForumError::UnknownAuthor(draft.author.clone()))?;
                    authors.insert(&draft.author, user.nickname.clone());
                    user.nickname
                }
            };

            let path = assigner.assign(id, draft.parent, |parent| lookup_parent(conn, parent))?;

            rows.push(PostInsert {
                id,
                parent: draft.parent,
                path,
                author,
                message: draft.message.clone(),
                forum: thread.forum.clone(),
                thread: thread.id,
                created,
            });
        }

        let mut posts = diesel::insert_into(posts::table)
            .values(&rows)
            .get_results::<Post>(conn)?;

        counters::add_forum_posts(conn, &thread.forum, posts.len() as i64)?;

        let position: HashMap<i64, usize> =
            ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        posts.sort_by_key(|post| position.get(&post.id).copied().unwrap_or(usize::MAX));
        Ok(posts)
    });

    match result {
        Ok(ref posts) => debug!("thread {}: wrote {} posts", thread.id, posts.len()),
        Err(ref err) => warn!("thread {}: rejected post batch: {}", thread.id, err),
    }
    result
}

/// Same as [`create_posts`] for a thread given by id or slug.
pub fn create_thread_posts(
    conn: &mut PgConnection,
    thread: &ThreadRef,
    drafts: &[PostDraft],
) -> Result<Vec<Post>, ForumError> {
    let thread = threads::find_thread(conn, thread)?;
    create_posts(conn, &thread, drafts)
}

/// One page of a thread's posts in the order `query.sort` asks for.
pub fn get_posts(conn: &mut PgConnection, query: &PostsQuery) -> Result<Vec<Post>, ForumError> {
    debug!(
        "thread {}: {} posts, limit {}, since {:?}, {:?}",
        query.thread, query.sort, query.limit, query.since, query.direction
    );
    match query.sort {
        SortMode::Flat => flat(conn, query),
        SortMode::Tree => tree(conn, query),
        SortMode::ParentTree => parent_tree(conn, query),
    }
}

fn flat(conn: &mut PgConnection, query: &PostsQuery) -> Result<Vec<Post>, ForumError> {
    let mut select = posts::table
        .filter(posts::thread.eq(query.thread))
        .into_boxed();

    select = match (query.direction, query.since) {
        (Direction::Asc, Some(since)) => select.filter(posts::id.gt(since)),
        (Direction::Desc, Some(since)) => select.filter(posts::id.lt(since)),
        (_, None) => select,
    };
    select = match query.direction {
        Direction::Asc => select.order((posts::created.asc(), posts::id.asc())),
        Direction::Desc => select.order((posts::created.desc(), posts::id.desc())),
    };

    Ok(select.limit(query.limit.max(0)).load::<Post>(conn)?)
}

fn tree(conn: &mut PgConnection, query: &PostsQuery) -> Result<Vec<Post>, ForumError> {
    let cursor = match query.since {
        Some(since) => match lookup_path(conn, since)? {
            Some(path) => Some(path),
            None => return Ok(Vec::new()),
        },
        None => None,
    };

    let mut select = posts::table
        .filter(posts::thread.eq(query.thread))
        .into_boxed();

    select = match (query.direction, cursor) {
        (Direction::Asc, Some(cursor)) => select.filter(posts::path.gt(cursor)),
        (Direction::Desc, Some(cursor)) => select.filter(posts::path.lt(cursor)),
        (_, None) => select,
    };
    select = match query.direction {
        Direction::Asc => select.order((path_root().asc(), posts::path.asc())),
        Direction::Desc => select.order((path_root().desc(), posts::path.desc())),
    };

    Ok(select.limit(query.limit.max(0)).load::<Post>(conn)?)
}

fn parent_tree(conn: &mut PgConnection, query: &PostsQuery) -> Result<Vec<Post>, ForumError> {
    conn.transaction(|conn| {
        let cursor = match query.since {
            Some(since) => match lookup_path(conn, since)? {
                Some(path) => Some(PostPath::root(path.root_id())),
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        let mut roots = posts::table
            .filter(posts::thread.eq(query.thread))
            .filter(posts::parent.eq(0))
            .select(posts::id)
            .into_boxed();

        roots = match (query.direction, cursor) {
            (Direction::Asc, Some(cursor)) => roots.filter(posts::path.gt(cursor)),
            (Direction::Desc, Some(cursor)) => roots.filter(posts::path.lt(cursor)),
            (_, None) => roots,
        };
        roots = match query.direction {
            Direction::Asc => roots.order((path_root().asc(), posts::path.asc())),
            Direction::Desc => roots.order((path_root().desc(), posts::path.asc())),
        };

        let roots = roots.limit(query.limit.max(0)).load::<i64>(conn)?;
        if roots.is_empty() {
            return Ok(Vec::new());
        }

        let select = posts::table
            .filter(posts::thread.eq(query.thread))
            .filter(path_root().eq_any(roots))
            .into_boxed();

        // Conversations follow the requested direction, replies inside one
        // always read top-down.
        let select = match query.direction {
            Direction::Asc => select.order((path_root().asc(), posts::path.asc())),
            Direction::Desc => select.order((path_root().desc(), posts::path.asc())),
        };

        Ok(select.load::<Post>(conn)?)
    })
}

pub fn find_post(conn: &mut PgConnection, id: i64) -> Result<Post, ForumError> {
    optional(posts::table.find(id).first::<Post>(conn))?.ok_or(ForumError::PostNotFound(id))
}

/// A post together with whichever related rows were asked for.
pub fn post_details(
    conn: &mut PgConnection,
    id: i64,
    related: Related,
) -> Result<PostDetails, ForumError> {
    let post = find_post(conn, id)?;

    let author = if related.user {
        Some(users::find_user(conn, &post.author)?)
    } else {
        None
    };
    let forum = if related.forum {
        Some(forums::find_forum(conn, &post.forum)?)
    } else {
        None
    };
    let thread = if related.thread {
        Some(threads::find_thread(conn, &ThreadRef::Id(post.thread))?)
    } else {
        None
    };

    Ok(PostDetails {
        post,
        author,
        forum,
        thread,
    })
}

/// Replaces a post's message. The post is marked edited only when the
/// message actually changes; an empty message leaves the post untouched.
pub fn update_post(conn: &mut PgConnection, id: i64, message: &str) -> Result<Post, ForumError> {
    conn.transaction(|conn| {
        let current = find_post(conn, id)?;
        if message.is_empty() || message == current.message {
            return Ok(current);
        }

        let post = diesel::update(posts::table.find(id))
            .set((posts::message.eq(message), posts::isedited.eq(true)))
            .get_result::<Post>(conn)?;
        Ok(post)
    })
}
