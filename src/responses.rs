use chrono::prelude::*;
use serde_derive::Serialize;

use crate::models::{Forum, Post, PostDetails, Status, Thread, User};
use crate::path::PostPath;

#[derive(Debug, Serialize)]
pub struct UserResponse {
    nickname: String,
    fullname: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    about: String,
    email: String,
}

impl<'a> From<&'a User> for UserResponse {
    fn from(user: &User) -> UserResponse {
        UserResponse {
            nickname: user.nickname.clone(),
            fullname: user.fullname.clone(),
            about: user.about.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ForumResponse {
    title: String,
    user: String,
    slug: String,
    posts: i64,
    threads: i32,
}

impl<'a> From<&'a Forum> for ForumResponse {
    fn from(forum: &Forum) -> ForumResponse {
        ForumResponse {
            title: forum.title.clone(),
            user: forum.user.clone(),
            slug: forum.slug.clone(),
            posts: forum.posts,
            threads: forum.threads,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ThreadResponse {
    id: i64,
    title: String,
    author: String,
    forum: String,
    message: String,
    votes: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    slug: Option<String>,
    created: DateTime<Utc>,
}

impl<'a> From<&'a Thread> for ThreadResponse {
    fn from(thread: &Thread) -> ThreadResponse {
        ThreadResponse {
            id: thread.id,
            title: thread.title.clone(),
            author: thread.author.clone(),
            forum: thread.forum.clone(),
            message: thread.message.clone(),
            votes: thread.votes,
            slug: thread.slug.clone(),
            created: thread.created,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    id: i64,
    parent: i64,
    path: PostPath,
    author: String,
    message: String,
    #[serde(rename = "isEdited")]
    is_edited: bool,
    forum: String,
    thread: i64,
    created: DateTime<Utc>,
}

impl<'a> From<&'a Post> for PostResponse {
    fn from(post: &Post) -> PostResponse {
        PostResponse {
            id: post.id,
            parent: post.parent,
            path: post.path.clone(),
            author: post.author.clone(),
            message: post.message.clone(),
            is_edited: post.is_edited,
            forum: post.forum.clone(),
            thread: post.thread,
            created: post.created,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostDetailsResponse {
    post: PostResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<UserResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    forum: Option<ForumResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread: Option<ThreadResponse>,
}

impl<'a> From<&'a PostDetails> for PostDetailsResponse {
    fn from(details: &PostDetails) -> PostDetailsResponse {
        PostDetailsResponse {
            post: PostResponse::from(&details.post),
            author: details.author.as_ref().map(UserResponse::from),
            forum: details.forum.as_ref().map(ForumResponse::from),
            thread: details.thread.as_ref().map(ThreadResponse::from),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    forum: i64,
    thread: i64,
    post: i64,
    user: i64,
}

impl From<Status> for StatusResponse {
    fn from(status: Status) -> StatusResponse {
        StatusResponse {
            forum: status.forum,
            thread: status.thread,
            post: status.post,
            user: status.user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post() -> Post {
        Post {
            id: 2,
            parent: 1,
            path: PostPath::root(1).child(2),
            author: "alice".to_string(),
            message: "hello".to_string(),
            is_edited: false,
            forum: "rust".to_string(),
            thread: 9,
            created: Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn post_uses_camel_case_edit_flag() {
        let value = serde_json::to_value(PostResponse::from(&post())).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 2,
                "parent": 1,
                "path": [1, 2],
                "author": "alice",
                "message": "hello",
                "isEdited": false,
                "forum": "rust",
                "thread": 9,
                "created": "2026-10-19T12:00:00Z",
            })
        );
    }

    #[test]
    fn details_skip_unrequested_relations() {
        let details = PostDetails {
            post: post(),
            author: None,
            forum: None,
            thread: None,
        };
        let value = serde_json::to_value(PostDetailsResponse::from(&details)).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert!(object.contains_key("post"));
    }

    #[test]
    fn thread_without_slug_omits_it() {
        let thread = Thread {
            id: 1,
            title: "t".to_string(),
            author: "alice".to_string(),
            forum: "rust".to_string(),
            message: "m".to_string(),
            votes: -1,
            slug: None,
            created: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        };
        let value = serde_json::to_value(ThreadResponse::from(&thread)).unwrap();
        assert!(value.get("slug").is_none());
        assert_eq!(value["votes"], -1);
    }
}
