use actix::prelude::*;
use diesel::pg::PgConnection;
use diesel::r2d2::ConnectionManager;
use log::info;
use r2d2::PooledConnection;

use crate::config::Config;
use crate::error::ForumError;
use crate::messages::*;
use crate::models::*;
use crate::store::{self, forums, posts, service, threads, users, votes, PgPool};

/// Runs store operations on a pool of synchronous worker threads. Each
/// message checks a connection out of the shared pool for its duration.
pub struct DbExecutor(pub PgPool);

impl DbExecutor {
    fn conn(&self) -> Result<PooledConnection<ConnectionManager<PgConnection>>, ForumError> {
        Ok(self.0.get()?)
    }
}

impl Actor for DbExecutor {
    type Context = SyncContext<Self>;
}

/// Builds the pool described by `config` and starts `config.db_workers`
/// executors sharing it. Must be called from inside a running actix system.
pub fn start(config: &Config) -> Result<Addr<DbExecutor>, ForumError> {
    let pool = store::init_pool(config)?;
    Ok(start_with_pool(pool, config.db_workers))
}

pub fn start_with_pool(pool: PgPool, workers: usize) -> Addr<DbExecutor> {
    info!("starting {} database executors", workers);
    SyncArbiter::start(workers, move || DbExecutor(pool.clone()))
}

impl Handler<CreateUser> for DbExecutor {
    type Result = Result<User, ForumError>;

    fn handle(&mut self, msg: CreateUser, _: &mut Self::Context) -> Self::Result {
        let mut conn = self.conn()?;
        users::create_user(&mut conn, &msg.nickname, &msg.profile)
    }
}

impl Handler<GetUser> for DbExecutor {
    type Result = Result<User, ForumError>;

    fn handle(&mut self, msg: GetUser, _: &mut Self::Context) -> Self::Result {
        let mut conn = self.conn()?;
        users::find_user(&mut conn, &msg.nickname)
    }
}

impl Handler<UpdateUser> for DbExecutor {
    type Result = Result<User, ForumError>;

    fn handle(&mut self, msg: UpdateUser, _: &mut Self::Context) -> Self::Result {
        let mut conn = self.conn()?;
        users::update_user(&mut conn, &msg.nickname, &msg.profile)
    }
}

impl Handler<CreateForum> for DbExecutor {
    type Result = Result<Forum, ForumError>;

    fn handle(&mut self, msg: CreateForum, _: &mut Self::Context) -> Self::Result {
        let mut conn = self.conn()?;
        forums::create_forum(&mut conn, &msg.0)
    }
}

impl Handler<GetForum> for DbExecutor {
    type Result = Result<Forum, ForumError>;

    fn handle(&mut self, msg: GetForum, _: &mut Self::Context) -> Self::Result {
        let mut conn = self.conn()?;
        forums::find_forum(&mut conn, &msg.slug)
    }
}

impl Handler<CreateThread> for DbExecutor {
    type Result = Result<Thread, ForumError>;

    fn handle(&mut self, msg: CreateThread, _: &mut Self::Context) -> Self::Result {
        let mut conn = self.conn()?;
        threads::create_thread(&mut conn, &msg.forum, &msg.draft)
    }
}

impl Handler<GetThread> for DbExecutor {
    type Result = Result<Thread, ForumError>;

    fn handle(&mut self, msg: GetThread, _: &mut Self::Context) -> Self::Result {
        let mut conn = self.conn()?;
        threads::find_thread(&mut conn, &msg.thread)
    }
}

impl Handler<UpdateThread> for DbExecutor {
    type Result = Result<Thread, ForumError>;

    fn handle(&mut self, msg: UpdateThread, _: &mut Self::Context) -> Self::Result {
        let mut conn = self.conn()?;
        threads::update_thread(&mut conn, &msg.thread, &msg.patch)
    }
}

impl Handler<ListThreads> for DbExecutor {
    type Result = Result<Vec<Thread>, ForumError>;

    fn handle(&mut self, msg: ListThreads, _: &mut Self::Context) -> Self::Result {
        let mut conn = self.conn()?;
        threads::forum_threads(&mut conn, &msg.forum, &msg.query)
    }
}

impl Handler<CreatePosts> for DbExecutor {
    type Result = Result<Vec<Post>, ForumError>;

    fn handle(&mut self, msg: CreatePosts, _: &mut Self::Context) -> Self::Result {
        let mut conn = self.conn()?;
        posts::create_thread_posts(&mut conn, &msg.thread, &msg.drafts)
    }
}

impl Handler<GetPosts> for DbExecutor {
    type Result = Result<Vec<Post>, ForumError>;

    fn handle(&mut self, msg: GetPosts, _: &mut Self::Context) -> Self::Result {
        let mut conn = self.conn()?;
        let thread = threads::find_thread(&mut conn, &msg.thread)?;
        let query = msg.query(thread.id)?;
        posts::get_posts(&mut conn, &query)
    }
}

impl Handler<GetPost> for DbExecutor {
    type Result = Result<PostDetails, ForumError>;

    fn handle(&mut self, msg: GetPost, _: &mut Self::Context) -> Self::Result {
        let mut conn = self.conn()?;
        posts::post_details(&mut conn, msg.id, msg.related)
    }
}

impl Handler<UpdatePost> for DbExecutor {
    type Result = Result<Post, ForumError>;

    fn handle(&mut self, msg: UpdatePost, _: &mut Self::Context) -> Self::Result {
        let mut conn = self.conn()?;
        posts::update_post(&mut conn, msg.id, &msg.message)
    }
}

impl Handler<FindVote> for DbExecutor {
    type Result = Result<Option<Vote>, ForumError>;

    fn handle(&mut self, msg: FindVote, _: &mut Self::Context) -> Self::Result {
        let mut conn = self.conn()?;
        votes::find_vote(&mut conn, msg.user_id, msg.thread_id)
    }
}

impl Handler<VoteThread> for DbExecutor {
    type Result = Result<Thread, ForumError>;

    fn handle(&mut self, msg: VoteThread, _: &mut Self::Context) -> Self::Result {
        let mut conn = self.conn()?;
        votes::vote(&mut conn, &msg.thread, &msg.nickname, msg.voice)
    }
}

impl Handler<GetStatus> for DbExecutor {
    type Result = Result<Status, ForumError>;

    fn handle(&mut self, _msg: GetStatus, _: &mut Self::Context) -> Self::Result {
        let mut conn = self.conn()?;
        service::status(&mut conn)
    }
}

impl Handler<Clear> for DbExecutor {
    type Result = Result<(), ForumError>;

    fn handle(&mut self, _msg: Clear, _: &mut Self::Context) -> Self::Result {
        let mut conn = self.conn()?;
        service::clear(&mut conn)
    }
}

impl Handler<SetupSchema> for DbExecutor {
    type Result = Result<(), ForumError>;

    fn handle(&mut self, _msg: SetupSchema, _: &mut Self::Context) -> Self::Result {
        let mut conn = self.conn()?;
        store::setup_schema(&mut conn)
    }
}
