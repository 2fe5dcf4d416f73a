use diesel::result::Error as DieselError;
use failure::Fail;

use crate::models::{Forum, Thread, User};

/// Fieldless tag for every error the repository can return. Callers map
/// these to their own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnknownAuthor,
    ParentNotFound,
    CrossThreadParent,
    InvalidSortMode,
    VoterNotFound,
    ThreadNotFound,
    UserNotFound,
    ForumNotFound,
    PostNotFound,
    VoteOutOfRange,
    UserConflict,
    ForumConflict,
    ThreadConflict,
    StoreFailure,
}

#[derive(Debug, Fail)]
pub enum ForumError {
    #[fail(display = "author {} does not exist", _0)]
    UnknownAuthor(String),

    #[fail(display = "parent post {} does not exist", _0)]
    ParentNotFound(i64),

    #[fail(display = "parent post {} belongs to thread {}, not {}", parent, parent_thread, thread)]
    CrossThreadParent {
        parent: i64,
        parent_thread: i64,
        thread: i64,
    },

    #[fail(display = "unknown sort mode {:?}", _0)]
    InvalidSortMode(String),

    #[fail(display = "voter {} does not exist", _0)]
    VoterNotFound(String),

    #[fail(display = "thread {} does not exist", _0)]
    ThreadNotFound(String),

    #[fail(display = "user {} does not exist", _0)]
    UserNotFound(String),

    #[fail(display = "forum {} does not exist", _0)]
    ForumNotFound(String),

    #[fail(display = "post {} does not exist", _0)]
    PostNotFound(i64),

    #[fail(display = "changing a vote from {} to {} overflows the thread total", previous, voice)]
    VoteOutOfRange { previous: i32, voice: i32 },

    #[fail(display = "nickname or email already taken")]
    UserConflict(Vec<User>),

    #[fail(display = "forum slug already taken")]
    ForumConflict(Forum),

    #[fail(display = "thread slug already taken")]
    ThreadConflict(Thread),

    #[fail(display = "store query failed: {}", _0)]
    Store(#[cause] DieselError),

    #[fail(display = "connection pool failed: {}", _0)]
    Pool(#[cause] r2d2::Error),
}

impl ForumError {
    pub fn kind(&self) -> ErrorKind {
        match *self {
            ForumError::UnknownAuthor(_) => ErrorKind::UnknownAuthor,
            ForumError::ParentNotFound(_) => ErrorKind::ParentNotFound,
            ForumError::CrossThreadParent { .. } => ErrorKind::CrossThreadParent,
            ForumError::InvalidSortMode(_) => ErrorKind::InvalidSortMode,
            ForumError::VoterNotFound(_) => ErrorKind::VoterNotFound,
            ForumError::ThreadNotFound(_) => ErrorKind::ThreadNotFound,
            ForumError::UserNotFound(_) => ErrorKind::UserNotFound,
            ForumError::ForumNotFound(_) => ErrorKind::ForumNotFound,
            ForumError::PostNotFound(_) => ErrorKind::PostNotFound,
            ForumError::VoteOutOfRange { .. } => ErrorKind::VoteOutOfRange,
            ForumError::UserConflict(_) => ErrorKind::UserConflict,
            ForumError::ForumConflict(_) => ErrorKind::ForumConflict,
            ForumError::ThreadConflict(_) => ErrorKind::ThreadConflict,
            ForumError::Store(_) | ForumError::Pool(_) => ErrorKind::StoreFailure,
        }
    }

    /// True for the errors that describe a broken reply tree rather than a
    /// missing entity.
    pub fn is_tree_violation(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ParentNotFound | ErrorKind::CrossThreadParent
        )
    }
}

impl From<DieselError> for ForumError {
    fn from(err: DieselError) -> Self {
        ForumError::Store(err)
    }
}

impl From<r2d2::Error> for ForumError {
    fn from(err: r2d2::Error) -> Self {
        ForumError::Pool(err)
    }
}
