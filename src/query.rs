//! Read parameters for post and thread listings.

use std::fmt;
use std::str::FromStr;

use chrono::prelude::*;

use crate::error::ForumError;

pub const DEFAULT_LIMIT: i64 = 100;

/// How the posts of a thread are ordered and paged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// By creation time, then id. `since` is a post id.
    Flat,
    /// Depth first by path. `since` names a post whose path is the cursor.
    Tree,
    /// Like `Tree`, but `limit` counts root conversations, and every reply
    /// under a selected root is returned.
    ParentTree,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match *self {
            SortMode::Flat => "flat",
            SortMode::Tree => "tree",
            SortMode::ParentTree => "parent_tree",
        }
    }
}

impl Default for SortMode {
    fn default() -> SortMode {
        SortMode::Flat
    }
}

impl FromStr for SortMode {
    type Err = ForumError;

    fn from_str(s: &str) -> Result<SortMode, ForumError> {
        match s {
            "flat" => Ok(SortMode::Flat),
            "tree" => Ok(SortMode::Tree),
            "parent_tree" => Ok(SortMode::ParentTree),
            other => Err(ForumError::InvalidSortMode(other.to_string())),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn from_desc(desc: bool) -> Direction {
        if desc {
            Direction::Desc
        } else {
            Direction::Asc
        }
    }
}

/// Parameters of a post listing for one thread.
#[derive(Debug, Clone, PartialEq)]
pub struct PostsQuery {
    pub thread: i64,
    pub limit: i64,
    pub since: Option<i64>,
    pub sort: SortMode,
    pub direction: Direction,
}

impl PostsQuery {
    pub fn new(thread: i64) -> PostsQuery {
        PostsQuery {
            thread,
            limit: DEFAULT_LIMIT,
            since: None,
            sort: SortMode::default(),
            direction: Direction::Asc,
        }
    }

    pub fn limit(mut self, limit: i64) -> PostsQuery {
        self.limit = limit.max(0);
        self
    }

    pub fn since(mut self, since: Option<i64>) -> PostsQuery {
        self.since = since;
        self
    }

    pub fn sort(mut self, sort: SortMode) -> PostsQuery {
        self.sort = sort;
        self
    }

    pub fn desc(mut self, desc: bool) -> PostsQuery {
        self.direction = Direction::from_desc(desc);
        self
    }

    /// Builds a query from the raw string parameters of a listing request.
    /// An absent sort means `flat`; an unknown one is an error.
    pub fn from_params(
        thread: i64,
        limit: Option<i64>,
        since: Option<i64>,
        sort: Option<&str>,
        desc: bool,
    ) -> Result<PostsQuery, ForumError> {
        let sort = match sort {
            Some(sort) => sort.parse()?,
            None => SortMode::default(),
        };
        Ok(PostsQuery::new(thread)
            .limit(limit.unwrap_or(DEFAULT_LIMIT))
            .since(since)
            .sort(sort)
            .desc(desc))
    }
}

/// Parameters of a thread listing for one forum.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadsQuery {
    pub limit: i64,
    /// Inclusive lower (or upper, when descending) bound on `created`.
    pub since: Option<DateTime<Utc>>,
    pub direction: Direction,
}

impl Default for ThreadsQuery {
    fn default() -> ThreadsQuery {
        ThreadsQuery {
            limit: DEFAULT_LIMIT,
            since: None,
            direction: Direction::Asc,
        }
    }
}

impl ThreadsQuery {
    pub fn limit(mut self, limit: i64) -> ThreadsQuery {
        self.limit = limit.max(0);
        self
    }

    pub fn since(mut self, since: Option<DateTime<Utc>>) -> ThreadsQuery {
        self.since = since;
        self
    }

    pub fn desc(mut self, desc: bool) -> ThreadsQuery {
        self.direction = Direction::from_desc(desc);
        self
    }
}

/// A thread is addressed either by numeric id or by slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadRef {
    Id(i64),
    Slug(String),
}

impl FromStr for ThreadRef {
    type Err = ForumError;

    fn from_str(s: &str) -> Result<ThreadRef, ForumError> {
        if s.is_empty() {
            return Err(ForumError::ThreadNotFound(String::new()));
        }
        Ok(match s.parse::<i64>() {
            Ok(id) => ThreadRef::Id(id),
            Err(_) => ThreadRef::Slug(s.to_string()),
        })
    }
}

impl fmt::Display for ThreadRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ThreadRef::Id(id) => write!(f, "{}", id),
            ThreadRef::Slug(ref slug) => f.write_str(slug),
        }
    }
}
