//! Votes and the thread vote total.

mod common;

use std::sync::mpsc;
use std::time::Duration;

use diesel::prelude::*;

use forumtree::error::{ErrorKind, ForumError};
use forumtree::query::ThreadRef;
use forumtree::schema::{forums, threads, users, votes};
use forumtree::store::threads::find_thread;
use forumtree::store::votes::{add_vote, cast_vote, find_vote, update_vote, vote};

use common::{connect, connect_committed, Fixture};

/// Deletes a committed fixture, whether or not the test passed.
struct Cleanup {
    user: i64,
    forum: String,
    thread: i64,
}

impl Drop for Cleanup {
    fn drop(&mut self) {
        let mut conn = connect_committed();
        let _ = diesel::delete(votes::table.filter(votes::thread_id.eq(self.thread))).execute(&mut conn);
        let _ = diesel::delete(threads::table.find(self.thread)).execute(&mut conn);
        let _ = diesel::delete(forums::table.filter(forums::slug.eq(&self.forum))).execute(&mut conn);
        let _ = diesel::delete(users::table.find(self.user)).execute(&mut conn);
    }
}

#[test]
#[ignore = "needs PostgreSQL at DATABASE_URL"]
fn voting_twice_keeps_one_row_with_the_latest_voice() {
    let mut conn = connect();
    let fx = Fixture::new(&mut conn, "revote");
    let thread = ThreadRef::Id(fx.thread.id);

    let up = vote(&mut conn, &thread, &fx.user.nickname, 1).unwrap();
    assert_eq!(up.votes, 1);

    let down = vote(&mut conn, &thread, &fx.user.nickname, -1).unwrap();
    assert_eq!(down.votes, -1);

    let rows: i64 = votes::table
        .filter(votes::thread_id.eq(fx.thread.id))
        .count()
        .get_result(&mut conn)
        .unwrap();
    assert_eq!(rows, 1);

    let stored = find_vote(&mut conn, fx.user.id, fx.thread.id).unwrap().unwrap();
    assert_eq!(stored.voice, -1);
}

#[test]
#[ignore = "needs PostgreSQL at DATABASE_URL"]
fn votes_from_several_users_add_up() {
    let mut conn = connect();
    let fx = Fixture::new(&mut conn, "tally");
    let other = common::user(&mut conn, "tally_other");
    let slug = ThreadRef::Slug(fx.thread.slug.clone().unwrap());

    vote(&mut conn, &slug, &fx.user.nickname, 1).unwrap();
    let thread = vote(&mut conn, &slug, &other.nickname, 1).unwrap();
    assert_eq!(thread.votes, 2);

    let thread = vote(&mut conn, &slug, &other.nickname, 1).unwrap();
    assert_eq!(thread.votes, 2);
}

#[test]
#[ignore = "needs PostgreSQL at DATABASE_URL"]
fn duplicate_insert_is_refused_and_cast_vote_updates() {
    let mut conn = connect();
    let fx = Fixture::new(&mut conn, "dup_insert");

    add_vote(&mut conn, fx.user.id, fx.thread.id, 1).unwrap();

    // A second plain insert hits the unique constraint.
    let err = add_vote(&mut conn, fx.user.id, fx.thread.id, -1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StoreFailure);

    let vote = cast_vote(&mut conn, fx.user.id, fx.thread.id, -1).unwrap();
    assert_eq!(vote.voice, -1);

    let thread = find_thread(&mut conn, &ThreadRef::Id(fx.thread.id)).unwrap();
    assert_eq!(thread.votes, -1);
}

#[test]
#[ignore = "needs PostgreSQL at DATABASE_URL"]
fn racing_first_votes_leave_one_row() {
    let mut conn = connect_committed();
    let fx = Fixture::new(&mut conn, &format!("race_{}", std::process::id()));
    let _cleanup = Cleanup {
        user: fx.user.id,
        forum: fx.forum.slug.clone(),
        thread: fx.thread.id,
    };
    let (user_id, thread_id) = (fx.user.id, fx.thread.id);

    // The first voter inserts and holds its transaction open, so the second
    // sees no row, blocks on the unique index and loses once the first commits.
    let (inserted, wait_insert) = mpsc::channel();
    let first = std::thread::spawn(move || {
        let mut conn = connect_committed();
        conn.transaction::<_, ForumError, _>(|conn| {
            let vote = cast_vote(conn, user_id, thread_id, 1)?;
            inserted.send(()).expect("signal insert");
            std::thread::sleep(Duration::from_millis(500));
            Ok(vote)
        })
    });

    wait_insert.recv().expect("first vote inserted");
    let second = cast_vote(&mut conn, user_id, thread_id, -1).unwrap();
    let first = first.join().expect("first voter").unwrap();

    assert_eq!(first.voice, 1);
    assert_eq!(second.id, first.id);
    assert_eq!(second.voice, -1);

    let rows: i64 = votes::table
        .filter(votes::thread_id.eq(thread_id))
        .count()
        .get_result(&mut conn)
        .unwrap();
    assert_eq!(rows, 1);
    assert_eq!(find_thread(&mut conn, &ThreadRef::Id(thread_id)).unwrap().votes, -1);
}

#[test]
#[ignore = "needs PostgreSQL at DATABASE_URL"]
fn vote_change_that_overflows_the_total_is_refused() {
    let mut conn = connect();
    let fx = Fixture::new(&mut conn, "vote_overflow");
    let thread = ThreadRef::Id(fx.thread.id);

    let low = vote(&mut conn, &thread, &fx.user.nickname, i32::MIN).unwrap();
    assert_eq!(low.votes, i32::MIN);

    let err = vote(&mut conn, &thread, &fx.user.nickname, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::VoteOutOfRange);

    let stored = find_vote(&mut conn, fx.user.id, fx.thread.id).unwrap().unwrap();
    assert_eq!(stored.voice, i32::MIN);
    assert_eq!(find_thread(&mut conn, &thread).unwrap().votes, i32::MIN);
}

#[test]
#[ignore = "needs PostgreSQL at DATABASE_URL"]
fn update_without_a_vote_is_not_found() {
    let mut conn = connect();
    let fx = Fixture::new(&mut conn, "no_vote");

    assert!(find_vote(&mut conn, fx.user.id, fx.thread.id).unwrap().is_none());
    let err = update_vote(&mut conn, fx.user.id, fx.thread.id, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StoreFailure);
}

#[test]
#[ignore = "needs PostgreSQL at DATABASE_URL"]
fn unknown_voter_or_thread_is_reported() {
    let mut conn = connect();
    let fx = Fixture::new(&mut conn, "vote_errors");

    let err = vote(&mut conn, &ThreadRef::Id(fx.thread.id), "vote_errors_ghost", 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::VoterNotFound);

    let err = vote(&mut conn, &ThreadRef::Id(i64::MAX), &fx.user.nickname, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ThreadNotFound);

    assert_eq!(
        find_thread(&mut conn, &ThreadRef::Id(fx.thread.id))
            .unwrap()
            .votes,
        0
    );
}
