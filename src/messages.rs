use actix::prelude::*;

use crate::error::ForumError;
use crate::models::*;
use crate::query::{PostsQuery, ThreadRef, ThreadsQuery};

pub struct CreateUser {
    pub nickname: String,
    pub profile: UserProfile,
}

impl Message for CreateUser {
    type Result = Result<User, ForumError>;
}

pub struct GetUser {
    pub nickname: String,
}

impl Message for GetUser {
    type Result = Result<User, ForumError>;
}

pub struct UpdateUser {
    pub nickname: String,
    pub profile: UserProfile,
}

impl Message for UpdateUser {
    type Result = Result<User, ForumError>;
}

pub struct CreateForum(pub ForumDraft);

impl Message for CreateForum {
    type Result = Result<Forum, ForumError>;
}

pub struct GetForum {
    pub slug: String,
}

impl Message for GetForum {
    type Result = Result<Forum, ForumError>;
}

pub struct CreateThread {
    pub forum: String,
    pub draft: ThreadDraft,
}

impl Message for CreateThread {
    type Result = Result<Thread, ForumError>;
}

pub struct GetThread {
    pub thread: ThreadRef,
}

impl Message for GetThread {
    type Result = Result<Thread, ForumError>;
}

pub struct UpdateThread {
    pub thread: ThreadRef,
    pub patch: ThreadPatch,
}

impl Message for UpdateThread {
    type Result = Result<Thread, ForumError>;
}

pub struct ListThreads {
    pub forum: String,
    pub query: ThreadsQuery,
}

impl Message for ListThreads {
    type Result = Result<Vec<Thread>, ForumError>;
}

/// A batch of posts for one thread; all or none are written.
pub struct CreatePosts {
    pub thread: ThreadRef,
    pub drafts: Vec<PostDraft>,
}

impl Message for CreatePosts {
    type Result = Result<Vec<Post>, ForumError>;
}

/// One page of a thread's posts. `sort` is the raw mode name; `None`
/// means flat.
pub struct GetPosts {
    pub thread: ThreadRef,
    pub limit: Option<i64>,
    pub since: Option<i64>,
    pub sort: Option<String>,
    pub desc: bool,
}

impl GetPosts {
    pub fn query(&self, thread: i64) -> Result<PostsQuery, ForumError> {
        PostsQuery::from_params(
            thread,
            self.limit,
            self.since,
            self.sort.as_ref().map(String::as_str),
            self.desc,
        )
    }
}

impl Message for GetPosts {
    type Result = Result<Vec<Post>, ForumError>;
}

pub struct GetPost {
    pub id: i64,
    pub related: Related,
}

impl Message for GetPost {
    type Result = Result<PostDetails, ForumError>;
}

pub struct UpdatePost {
    pub id: i64,
    pub message: String,
}

impl Message for UpdatePost {
    type Result = Result<Post, ForumError>;
}

pub struct FindVote {
    pub user_id: i64,
    pub thread_id: i64,
}

impl Message for FindVote {
    type Result = Result<Option<Vote>, ForumError>;
}

pub struct VoteThread {
    pub thread: ThreadRef,
    pub nickname: String,
    pub voice: i32,
}

impl Message for VoteThread {
    type Result = Result<Thread, ForumError>;
}

pub struct GetStatus;

impl Message for GetStatus {
    type Result = Result<Status, ForumError>;
}

pub struct Clear;

impl Message for Clear {
    type Result = Result<(), ForumError>;
}

pub struct SetupSchema;

impl Message for SetupSchema {
    type Result = Result<(), ForumError>;
}
