use chrono::prelude::*;
use diesel::{Insertable, Queryable};
use serde_derive::Deserialize;

use crate::path::PostPath;
use crate::schema::*;

#[derive(Debug, Clone, PartialEq, Queryable)]
pub struct User {
    pub id: i64,
    pub nickname: String,
    pub fullname: String,
    pub about: String,
    pub email: String,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct UserInsert<'a> {
    pub nickname: &'a str,
    pub fullname: &'a str,
    pub about: &'a str,
    pub email: &'a str,
}

#[derive(Debug, Clone, PartialEq, Queryable)]
pub struct Forum {
    pub id: i64,
    pub title: String,
    pub user: String,
    pub slug: String,
    pub posts: i64,
    pub threads: i32,
}

#[derive(Insertable)]
#[diesel(table_name = forums)]
pub struct ForumInsert<'a> {
    pub title: &'a str,
    pub username: &'a str,
    pub slug: &'a str,
}

#[derive(Debug, Clone, PartialEq, Queryable)]
pub struct Thread {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub forum: String,
    pub message: String,
    pub votes: i32,
    pub slug: Option<String>,
    pub created: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = threads)]
pub struct ThreadInsert<'a> {
    pub title: &'a str,
    pub author: &'a str,
    pub forum: &'a str,
    pub message: &'a str,
    pub slug: Option<&'a str>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Queryable)]
pub struct Post {
    pub id: i64,
    pub parent: i64,
    pub path: PostPath,
    pub author: String,
    pub message: String,
    pub is_edited: bool,
    pub forum: String,
    pub thread: i64,
    pub created: DateTime<Utc>,
}

impl Post {
    pub fn is_root(&self) -> bool {
        self.parent == 0
    }
}

/// A fully resolved row, id and path included, ready for the batch insert.
#[derive(Debug, Insertable)]
#[diesel(table_name = posts)]
pub struct PostInsert {
    pub id: i64,
    pub parent: i64,
    pub path: PostPath,
    pub author: String,
    pub message: String,
    pub forum: String,
    pub thread: i64,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Queryable)]
pub struct Vote {
    pub id: i64,
    pub user_id: i64,
    pub thread_id: i64,
    pub voice: i32,
}

#[derive(Insertable)]
#[diesel(table_name = votes)]
pub struct VoteInsert {
    pub user_id: i64,
    pub thread_id: i64,
    pub voice: i32,
}

/// A post as submitted by a caller, before it has an id or a path.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PostDraft {
    #[serde(default)]
    pub parent: i64,
    pub author: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForumDraft {
    pub title: String,
    pub user: String,
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThreadDraft {
    pub title: String,
    pub author: String,
    pub message: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

impl ThreadDraft {
    /// Empty slugs are treated as absent so they never collide.
    pub fn slug(&self) -> Option<&str> {
        match self.slug {
            Some(ref slug) if !slug.is_empty() => Some(slug),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreadPatch {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
}

/// Which related rows to load alongside a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Related {
    pub user: bool,
    pub forum: bool,
    pub thread: bool,
}

impl Related {
    /// Parses a comma separated list such as `user,thread`. Unknown names
    /// are ignored.
    pub fn parse(list: &str) -> Related {
        let mut related = Related::default();
        for name in list.split(',').map(str::trim) {
            match name {
                "user" => related.user = true,
                "forum" => related.forum = true,
                "thread" => related.thread = true,
                _ => {}
            }
        }
        related
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostDetails {
    pub post: Post,
    pub author: Option<User>,
    pub forum: Option<Forum>,
    pub thread: Option<Thread>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub forum: i64,
    pub thread: i64,
    pub post: i64,
    pub user: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn related_ignores_unknown_names() {
        let related = Related::parse("user, thread,board");
        assert_eq!(
            related,
            Related {
                user: true,
                forum: false,
                thread: true,
            }
        );
        assert_eq!(Related::parse(""), Related::default());
    }

    #[test]
    fn empty_thread_slug_is_absent() {
        let mut draft = ThreadDraft {
            title: "t".to_string(),
            author: "a".to_string(),
            message: "m".to_string(),
            slug: Some(String::new()),
            created: None,
        };
        assert_eq!(draft.slug(), None);
        draft.slug = Some("rust".to_string());
        assert_eq!(draft.slug(), Some("rust"));
    }

    #[test]
    fn draft_parent_defaults_to_root() {
        let draft: PostDraft =
            serde_json::from_str(r#"{"author": "alice", "message": "hi"}"#).unwrap();
        assert_eq!(draft.parent, 0);
    }
}
