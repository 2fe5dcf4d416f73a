//! Storage engine for a threaded discussion forum.
//!
//! Posts form reply trees inside a thread. Each post stores its materialized
//! path, so the three listings (`flat`, `tree`, `parent_tree`) are plain
//! ordered queries against PostgreSQL. Forum and thread totals are kept as
//! counters, bumped in the transaction of the write that changes them.

pub mod config;
pub mod db;
pub mod error;
pub mod messages;
pub mod models;
pub mod path;
pub mod query;
pub mod responses;
pub mod schema;
pub mod store;

pub use crate::config::Config;
pub use crate::error::{ErrorKind, ForumError};
pub use crate::path::PostPath;
pub use crate::query::{PostsQuery, SortMode, ThreadRef};
