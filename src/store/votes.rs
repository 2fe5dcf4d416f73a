//! One vote per user and thread, reflected in the thread's `votes` total.
//!
//! The find-then-write sequence is backed by the `UNIQUE (user_id, thread_id)`
//! constraint: when two first votes race, the losing insert rolls back to its
//! savepoint and is retried as an update of the winner's row.

use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use log::debug;

use super::{counters, optional, threads, users};
use crate::error::ForumError;
use crate::models::{Thread, Vote, VoteInsert};
use crate::query::ThreadRef;
use crate::schema::votes;

pub fn find_vote(
    conn: &mut PgConnection,
    user_id: i64,
    thread_id: i64,
) -> Result<Option<Vote>, ForumError> {
    optional(
        votes::table
            .filter(votes::user_id.eq(user_id))
            .filter(votes::thread_id.eq(thread_id))
            .first::<Vote>(conn),
    )
}

fn lock_vote(
    conn: &mut PgConnection,
    user_id: i64,
    thread_id: i64,
) -> Result<Option<Vote>, ForumError> {
    optional(
        votes::table
            .filter(votes::user_id.eq(user_id))
            .filter(votes::thread_id.eq(thread_id))
            .for_update()
            .first::<Vote>(conn),
    )
}

/// Inserts a first vote and adds `voice` to the thread total.
pub fn add_vote(
    conn: &mut PgConnection,
    user_id: i64,
    thread_id: i64,
    voice: i32,
) -> Result<Vote, ForumError> {
    conn.transaction(|conn| {
        let vote = diesel::insert_into(votes::table)
            .values(VoteInsert {
                user_id,
                thread_id,
                voice,
            })
            .get_result::<Vote>(conn)?;
        counters::add_thread_votes(conn, thread_id, voice)?;
        Ok(vote)
    })
}

/// Changes an existing vote in place and moves the thread total by the
/// difference between the old and the new voice.
pub fn update_vote(
    conn: &mut PgConnection,
    user_id: i64,
    thread_id: i64,
    voice: i32,
) -> Result<Vote, ForumError> {
    conn.transaction(|conn| {
        let old = lock_vote(conn, user_id, thread_id)?.ok_or(DieselError::NotFound)?;
        let vote = diesel::update(votes::table.find(old.id))
            .set(votes::voice.eq(voice))
            .get_result::<Vote>(conn)?;
        counters::add_thread_votes(conn, thread_id, vote_delta(old.voice, voice)?)?;
        Ok(vote)
    })
}

/// How far the thread total moves when a vote goes from `previous` to `voice`.
fn vote_delta(previous: i32, voice: i32) -> Result<i32, ForumError> {
    voice
        .checked_sub(previous)
        .ok_or(ForumError::VoteOutOfRange { previous, voice })
}

/// Records `voice` as the user's only vote on the thread.
pub fn cast_vote(
    conn: &mut PgConnection,
    user_id: i64,
    thread_id: i64,
    voice: i32,
) -> Result<Vote, ForumError> {
    conn.transaction(|conn| {
        if lock_vote(conn, user_id, thread_id)?.is_some() {
            debug!("user {} re-votes on thread {}", user_id, thread_id);
            return update_vote(conn, user_id, thread_id, voice);
        }

        match add_vote(conn, user_id, thread_id, voice) {
            Err(ForumError::Store(DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                _,
            ))) => {
                debug!(
                    "user {} lost a first-vote race on thread {}",
                    user_id, thread_id
                );
                update_vote(conn, user_id, thread_id, voice)
            }
            other => other,
        }
    })
}

/// The vote flow: resolves the thread and the voter, records the vote and
/// returns the thread with its refreshed total.
pub fn vote(
    conn: &mut PgConnection,
    thread: &ThreadRef,
    nickname: &str,
    voice: i32,
) -> Result<Thread, ForumError> {
    conn.transaction(|conn| {
        let thread = threads::find_thread(conn, thread)?;
        let voter = users::lookup_user(conn, nickname)?
            .ok_or_else(|| ForumError::VoterNotFound(nickname.to_string()))?;

        cast_vote(conn, voter.id, thread.id, voice)?;
        threads::find_thread(conn, &ThreadRef::Id(thread.id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn delta_is_the_difference_of_voices() {
        assert_eq!(vote_delta(1, -1).unwrap(), -2);
        assert_eq!(vote_delta(-1, -1).unwrap(), 0);
        assert_eq!(vote_delta(0, i32::MAX).unwrap(), i32::MAX);
    }

    #[test]
    fn delta_that_does_not_fit_is_rejected() {
        let err = vote_delta(i32::MIN, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::VoteOutOfRange);
        assert!(vote_delta(1, i32::MIN).is_err());
        assert_eq!(vote_delta(i32::MAX, -1).unwrap(), i32::MIN);
    }
}
