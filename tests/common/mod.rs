//! Shared helpers for integration tests.
//!
//! Tests talk to the database named by `DATABASE_URL`. They are marked
//! `#[ignore]` and run with `cargo test -- --ignored`; a run without the
//! variable fails instead of passing vacuously. Connections from
//! [`connect`] sit inside a test transaction, so nothing they write is ever
//! committed.

#![allow(dead_code)]

use std::env;
use std::sync::Once;

use diesel::pg::PgConnection;
use diesel::Connection;

use forumtree::models::*;
use forumtree::store::{self, forums, threads, users};

static SCHEMA: Once = Once::new();

pub fn database_url() -> String {
    let _ = dotenv::dotenv();
    env::var("DATABASE_URL").expect("DATABASE_URL must name a PostgreSQL database for --ignored tests")
}

/// Runs the schema script once per test binary.
pub fn ensure_schema(url: &str) {
    SCHEMA.call_once(|| {
        let mut conn = PgConnection::establish(url).expect("connect for schema setup");
        store::setup_schema(&mut conn).expect("schema setup");
    });
}

/// A connection inside a never-committed transaction.
pub fn connect() -> PgConnection {
    let mut conn = connect_committed();
    conn.begin_test_transaction().expect("begin test transaction");
    conn
}

/// A plain connection whose writes commit. Tests using it clean up after
/// themselves.
pub fn connect_committed() -> PgConnection {
    let url = database_url();
    ensure_schema(&url);
    PgConnection::establish(&url).expect("connect")
}

pub fn user(conn: &mut PgConnection, nickname: &str) -> User {
    let profile = UserProfile {
        fullname: format!("{} fullname", nickname),
        about: String::new(),
        email: format!("{}@example.com", nickname),
    };
    users::create_user(conn, nickname, &profile).expect("create user")
}

pub fn thread(conn: &mut PgConnection, forum: &Forum, author: &User, slug: &str) -> Thread {
    let draft = ThreadDraft {
        title: format!("{} title", slug),
        author: author.nickname.clone(),
        message: "first message".to_string(),
        slug: Some(slug.to_string()),
        created: None,
    };
    threads::create_thread(conn, &forum.slug, &draft).expect("create thread")
}

pub fn draft(parent: i64, author: &User, message: &str) -> PostDraft {
    PostDraft {
        parent,
        author: author.nickname.clone(),
        message: message.to_string(),
    }
}

/// A user owning a forum with one thread. Every name is derived from `tag`,
/// which must be unique per test so concurrent tests never touch the same
/// unique keys.
pub struct Fixture {
    pub user: User,
    pub forum: Forum,
    pub thread: Thread,
}

impl Fixture {
    pub fn new(conn: &mut PgConnection, tag: &str) -> Fixture {
        let user = user(conn, &format!("{}_owner", tag));
        let draft = ForumDraft {
            title: format!("{} forum", tag),
            user: user.nickname.clone(),
            slug: format!("{}-forum", tag),
        };
        let forum = forums::create_forum(conn, &draft).expect("create forum");
        let thread = thread(conn, &forum, &user, &format!("{}-thread", tag));
        Fixture {
            user,
            forum,
            thread,
        }
    }

    pub fn draft(&self, parent: i64, message: &str) -> PostDraft {
        draft(parent, &self.user, message)
    }

    /// The forum as currently stored.
    pub fn forum(&self, conn: &mut PgConnection) -> Forum {
        forums::find_forum(conn, &self.forum.slug).expect("reload forum")
    }
}
