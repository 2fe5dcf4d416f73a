//! Materialized reply paths.
//!
//! Every post stores the ids of its ancestors followed by its own id. The
//! ordering of [`PostPath`] is the ordering PostgreSQL applies to `bigint[]`
//! values, so sorting in memory and sorting in the store agree.

use std::collections::HashMap;
use std::fmt;

use diesel::deserialize::{self, FromSql};
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::{Array, BigInt};
use diesel::{AsExpression, FromSqlRow};
use serde_derive::Serialize;

use crate::error::ForumError;

#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Array<BigInt>)]
#[serde(transparent)]
pub struct PostPath(Vec<i64>);

impl PostPath {
    /// A path over `ids`, root first. There is no empty path.
    pub fn from_ids(ids: Vec<i64>) -> Option<PostPath> {
        if ids.is_empty() {
            None
        } else {
            Some(PostPath(ids))
        }
    }

    /// The path of a post that starts a new conversation.
    pub fn root(id: i64) -> PostPath {
        PostPath(vec![id])
    }

    /// The path of a reply with the given id under `self`.
    pub fn child(&self, id: i64) -> PostPath {
        let mut ids = Vec::with_capacity(self.0.len() + 1);
        ids.extend_from_slice(&self.0);
        ids.push(id);
        PostPath(ids)
    }

    /// Id of the root post of the conversation this path belongs to.
    pub fn root_id(&self) -> i64 {
        self.0[0]
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn ids(&self) -> &[i64] {
        &self.0
    }
}

impl fmt::Display for PostPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ids: Vec<String> = self.0.iter().map(i64::to_string).collect();
        write!(f, "{}", ids.join("."))
    }
}

impl ToSql<Array<BigInt>, Pg> for PostPath {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        ToSql::<Array<BigInt>, Pg>::to_sql(&self.0, out)
    }
}

impl FromSql<Array<BigInt>, Pg> for PostPath {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let ids = <Vec<i64> as FromSql<Array<BigInt>, Pg>>::from_sql(bytes)?;
        PostPath::from_ids(ids).ok_or_else(|| "post path must not be empty".into())
    }
}

/// What the assigner needs to know about an existing parent post.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentPost {
    pub thread: i64,
    pub path: PostPath,
}

/// Computes paths for one batch of posts in one thread.
///
/// Posts placed earlier in the same batch are remembered, so a draft may
/// reply to a sibling whose id was allocated for this batch.
pub struct PathAssigner {
    thread: i64,
    assigned: HashMap<i64, PostPath>,
}

impl PathAssigner {
    pub fn new(thread: i64) -> PathAssigner {
        PathAssigner {
            thread,
            assigned: HashMap::new(),
        }
    }

    /// Assigns a path to the post `id` replying to `parent`.
    ///
    /// `lookup` resolves parents that are not part of this batch.
    pub fn assign<F>(&mut self, id: i64, parent: i64, lookup: F) -> Result<PostPath, ForumError>
    where
        F: FnOnce(i64) -> Result<Option<ParentPost>, ForumError>,
    {
        let path = if parent == 0 {
            PostPath::root(id)
        } else if let Some(parent_path) = self.assigned.get(&parent) {
            parent_path.child(id)
        } else {
            let found = lookup(parent)?.ok_or(ForumError::ParentNotFound(parent))?;
            if found.thread != self.thread {
                return Err(ForumError::CrossThreadParent {
                    parent,
                    parent_thread: found.thread,
                    thread: self.thread,
                });
            }
            found.path.child(id)
        };

        self.assigned.insert(id, path.clone());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn no_parent(_: i64) -> Result<Option<ParentPost>, ForumError> {
        Ok(None)
    }

    fn path(ids: &[i64]) -> PostPath {
        PostPath::from_ids(ids.to_vec()).unwrap()
    }

    #[test]
    fn ordering_matches_array_comparison() {
        let mut paths = vec![
            path(&[3]),
            path(&[1, 2, 5]),
            path(&[1]),
            path(&[1, 4]),
            path(&[1, 2]),
        ];
        paths.sort();
        let sorted: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
        assert_eq!(sorted, vec!["1", "1.2", "1.2.5", "1.4", "3"]);
    }

    #[test]
    fn child_extends_parent() {
        let path = PostPath::root(1).child(2).child(9);
        assert_eq!(path.ids(), &[1, 2, 9]);
        assert_eq!(path.root_id(), 1);
        assert_eq!(path.depth(), 3);
    }

    #[test]
    fn empty_ids_are_not_a_path() {
        assert_eq!(PostPath::from_ids(Vec::new()), None);
        assert_eq!(PostPath::from_ids(vec![4]), Some(PostPath::root(4)));
    }

    #[test]
    fn roots_get_their_own_id() {
        let mut assigner = PathAssigner::new(10);
        let path = assigner.assign(42, 0, no_parent).unwrap();
        assert_eq!(path, PostPath::root(42));
    }

    #[test]
    fn batch_siblings_resolve_without_lookup() {
        let mut assigner = PathAssigner::new(10);
        let a = assigner.assign(1, 0, no_parent).unwrap();
        let b = assigner
            .assign(2, 1, |_| panic!("batch parent must not hit the store"))
            .unwrap();
        let c = assigner.assign(3, 0, no_parent).unwrap();
        assert_eq!(a.ids(), &[1]);
        assert_eq!(b.ids(), &[1, 2]);
        assert_eq!(c.ids(), &[3]);
    }

    #[test]
    fn stored_parent_in_same_thread() {
        let mut assigner = PathAssigner::new(10);
        let path = assigner
            .assign(8, 5, |id| {
                assert_eq!(id, 5);
                Ok(Some(ParentPost {
                    thread: 10,
                    path: path(&[2, 5]),
                }))
            })
            .unwrap();
        assert_eq!(path.ids(), &[2, 5, 8]);
    }

    #[test]
    fn missing_parent_fails() {
        let mut assigner = PathAssigner::new(10);
        let err = assigner.assign(8, 77, no_parent).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParentNotFound);
    }

    #[test]
    fn parent_in_other_thread_fails() {
        let mut assigner = PathAssigner::new(10);
        let err = assigner
            .assign(8, 5, |_| {
                Ok(Some(ParentPost {
                    thread: 11,
                    path: PostPath::root(5),
                }))
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CrossThreadParent);
    }
}
