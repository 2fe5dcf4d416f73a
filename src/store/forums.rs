use diesel::pg::PgConnection;
use diesel::prelude::*;
use log::debug;

use super::{optional, users};
use crate::error::ForumError;
use crate::models::{Forum, ForumDraft, ForumInsert};
use crate::schema::forums;

pub fn lookup_forum(conn: &mut PgConnection, slug: &str) -> Result<Option<Forum>, ForumError> {
    optional(forums::table.filter(forums::slug.eq(slug)).first::<Forum>(conn))
}

pub fn find_forum(conn: &mut PgConnection, slug: &str) -> Result<Forum, ForumError> {
    lookup_forum(conn, slug)?.ok_or_else(|| ForumError::ForumNotFound(slug.to_string()))
}

/// Creates a forum owned by an existing user. The stored owner is the
/// user's canonical nickname. A taken slug fails with `ForumConflict`
/// carrying the forum that holds it.
pub fn create_forum(conn: &mut PgConnection, draft: &ForumDraft) -> Result<Forum, ForumError> {
    conn.transaction(|conn| {
        let owner = users::find_user(conn, &draft.user)?;

        if let Some(existing) = lookup_forum(conn, &draft.slug)? {
            return Err(ForumError::ForumConflict(existing));
        }

        let forum = diesel::insert_into(forums::table)
            .values(ForumInsert {
                title: &draft.title,
                username: &owner.nickname,
                slug: &draft.slug,
            })
            .get_result::<Forum>(conn)?;
        debug!("created forum {} owned by {}", forum.slug, forum.user);
        Ok(forum)
    })
}
