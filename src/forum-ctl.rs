use std::env;
use std::fs::File;
use std::io::{self, Read};
use std::process::exit;

use actix::prelude::*;
use chrono::prelude::*;
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use failure::{format_err, Error};
use prettytable::{row, Table};
use serde::Serialize;

use forumtree::config::Config;
use forumtree::db::{self, DbExecutor};
use forumtree::error::ForumError;
use forumtree::messages::*;
use forumtree::models::*;
use forumtree::query::{ThreadRef, ThreadsQuery, DEFAULT_LIMIT};
use forumtree::responses::*;

fn app<'a, 'b>() -> App<'a, 'b> {
    let thread_arg = Arg::with_name("thread")
        .short("t")
        .long("thread")
        .help("Thread id or slug")
        .takes_value(true)
        .required(true);
    let limit_arg = Arg::with_name("limit")
        .short("l")
        .long("limit")
        .takes_value(true);
    let desc_arg = Arg::with_name("desc").long("desc").help("Reverse the order");

    App::new("forum-ctl")
        .arg(Arg::with_name("url")
             .short("u")
             .long("url")
             .help("Specify the PostgreSQL connection URL")
             .takes_value(true))
        .arg(Arg::with_name("json")
             .long("json")
             .help("Print results as JSON"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(SubCommand::with_name("init")
                    .about("Creates missing tables and indexes"))
        .subcommand(SubCommand::with_name("status")
                    .about("Counts rows in every table"))
        .subcommand(SubCommand::with_name("clear")
                    .about("Deletes all forum data"))
        .subcommand(SubCommand::with_name("create-user")
                    .about("Creates a user")
                    .arg(Arg::with_name("nickname").long("nickname").takes_value(true).required(true))
                    .arg(Arg::with_name("fullname").long("fullname").takes_value(true).required(true))
                    .arg(Arg::with_name("email").long("email").takes_value(true).required(true))
                    .arg(Arg::with_name("about").long("about").takes_value(true)))
        .subcommand(SubCommand::with_name("user")
                    .about("Shows a user")
                    .arg(Arg::with_name("nickname").required(true)))
        .subcommand(SubCommand::with_name("update-user")
                    .about("Updates a user's profile; omitted fields are kept")
                    .arg(Arg::with_name("nickname").required(true))
                    .arg(Arg::with_name("fullname").long("fullname").takes_value(true))
                    .arg(Arg::with_name("email").long("email").takes_value(true))
                    .arg(Arg::with_name("about").long("about").takes_value(true)))
        .subcommand(SubCommand::with_name("create-forum")
                    .about("Creates a forum")
                    .arg(Arg::with_name("slug").long("slug").takes_value(true).required(true))
                    .arg(Arg::with_name("title").long("title").takes_value(true).required(true))
                    .arg(Arg::with_name("user").long("user").takes_value(true).required(true)))
        .subcommand(SubCommand::with_name("forum")
                    .about("Shows a forum and its counters")
                    .arg(Arg::with_name("slug").required(true)))
        .subcommand(SubCommand::with_name("create-thread")
                    .about("Opens a thread in a forum")
                    .arg(Arg::with_name("forum").short("f").long("forum").takes_value(true).required(true))
                    .arg(Arg::with_name("author").long("author").takes_value(true).required(true))
                    .arg(Arg::with_name("title").long("title").takes_value(true).required(true))
                    .arg(Arg::with_name("message").long("message").takes_value(true).required(true))
                    .arg(Arg::with_name("slug").long("slug").takes_value(true)))
        .subcommand(SubCommand::with_name("thread")
                    .about("Shows a thread")
                    .arg(thread_arg.clone()))
        .subcommand(SubCommand::with_name("update-thread")
                    .about("Changes a thread's title or message")
                    .arg(thread_arg.clone())
                    .arg(Arg::with_name("title").long("title").takes_value(true))
                    .arg(Arg::with_name("message").long("message").takes_value(true)))
        .subcommand(SubCommand::with_name("threads")
                    .about("Lists the threads of a forum")
                    .arg(Arg::with_name("forum").short("f").long("forum").takes_value(true).required(true))
                    .arg(limit_arg.clone())
                    .arg(Arg::with_name("since")
                         .short("s")
                         .long("since")
                         .help("RFC 3339 creation time to start from (inclusive)")
                         .takes_value(true))
                    .arg(desc_arg.clone()))
        .subcommand(SubCommand::with_name("create-posts")
                    .about("Adds a JSON array of posts to a thread, all or nothing")
                    .arg(thread_arg.clone())
                    .arg(Arg::with_name("file")
                         .help("JSON file with [{\"parent\", \"author\", \"message\"}]; stdin if omitted")))
        .subcommand(SubCommand::with_name("posts")
                    .about("Lists the posts of a thread")
                    .arg(thread_arg.clone())
                    .arg(limit_arg)
                    .arg(Arg::with_name("since")
                         .short("s")
                         .long("since")
                         .help("Post id to continue after")
                         .takes_value(true))
                    .arg(Arg::with_name("sort")
                         .long("sort")
                         .help("flat, tree or parent_tree")
                         .takes_value(true))
                    .arg(desc_arg))
        .subcommand(SubCommand::with_name("post")
                    .about("Shows a post")
                    .arg(Arg::with_name("id").required(true))
                    .arg(Arg::with_name("related")
                         .long("related")
                         .help("Comma separated: user, forum, thread")
                         .takes_value(true)))
        .subcommand(SubCommand::with_name("edit-post")
                    .about("Replaces a post's message")
                    .arg(Arg::with_name("id").required(true))
                    .arg(Arg::with_name("message").long("message").takes_value(true).required(true)))
        .subcommand(SubCommand::with_name("vote")
                    .about("Votes on a thread; voting again replaces the earlier vote")
                    .arg(thread_arg)
                    .arg(Arg::with_name("nickname").long("nickname").takes_value(true).required(true))
                    .arg(Arg::with_name("voice")
                         .long("voice")
                         .takes_value(true)
                         .allow_hyphen_values(true)
                         .required(true)))
}

fn main() {
    let matches = app().get_matches();

    env_logger::init();
    let _ = dotenv::dotenv();

    let arg_url = matches.value_of("url").map(str::to_string);
    let config = Config::from_vars(|key| match (key, &arg_url) {
        ("DATABASE_URL", &Some(ref url)) => Some(url.clone()),
        _ => env::var(key).ok(),
    });
    let config = match config {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            exit(1);
        },
    };

    let system = System::new();
    if let Err(e) = system.block_on(run(config, matches)) {
        eprintln!("Error: {}", e);
        exit(1);
    }
}

async fn run(config: Config, matches: ArgMatches<'static>) -> Result<(), Error> {
    let addr = db::start(&config)?;
    let json = matches.is_present("json");

    match matches.subcommand() {
        ("init", _) => {
            ask(&addr, SetupSchema).await?;
            println!("schema ready");
        },
        ("status", _) => {
            let status = ask(&addr, GetStatus).await?;
            if json {
                return print_json(&StatusResponse::from(status));
            }
            let mut table = Table::new();
            table.add_row(row!["Forums", "Threads", "Posts", "Users"]);
            table.add_row(row![status.forum, status.thread, status.post, status.user]);
            table.printstd();
        },
        ("clear", _) => {
            ask(&addr, Clear).await?;
            println!("cleared");
        },
        ("create-user", Some(m)) => {
            let profile = UserProfile {
                fullname: m.value_of("fullname").unwrap_or_default().to_string(),
                about: m.value_of("about").unwrap_or_default().to_string(),
                email: m.value_of("email").unwrap_or_default().to_string(),
            };
            let msg = CreateUser {
                nickname: required(m, "nickname")?.to_string(),
                profile,
            };
            match send(&addr, msg).await? {
                Err(ForumError::UserConflict(existing)) => {
                    print_users(&existing, json)?;
                    return Err(format_err!("nickname or email already taken"));
                },
                other => print_users(&[other?], json)?,
            }
        },
        ("user", Some(m)) => {
            let user = ask(&addr, GetUser { nickname: required(m, "nickname")?.to_string() }).await?;
            print_users(&[user], json)?;
        },
        ("update-user", Some(m)) => {
            let profile = UserProfile {
                fullname: m.value_of("fullname").unwrap_or_default().to_string(),
                about: m.value_of("about").unwrap_or_default().to_string(),
                email: m.value_of("email").unwrap_or_default().to_string(),
            };
            let msg = UpdateUser {
                nickname: required(m, "nickname")?.to_string(),
                profile,
            };
            let user = ask(&addr, msg).await?;
            print_users(&[user], json)?;
        },
        ("create-forum", Some(m)) => {
            let draft = ForumDraft {
                title: required(m, "title")?.to_string(),
                user: required(m, "user")?.to_string(),
                slug: required(m, "slug")?.to_string(),
            };
            match send(&addr, CreateForum(draft)).await? {
                Err(ForumError::ForumConflict(existing)) => {
                    print_forum(&existing, json)?;
                    return Err(format_err!("forum slug already taken"));
                },
                other => print_forum(&other?, json)?,
            }
        },
        ("forum", Some(m)) => {
            let forum = ask(&addr, GetForum { slug: required(m, "slug")?.to_string() }).await?;
            print_forum(&forum, json)?;
        },
        ("create-thread", Some(m)) => {
            let draft = ThreadDraft {
                title: required(m, "title")?.to_string(),
                author: required(m, "author")?.to_string(),
                message: required(m, "message")?.to_string(),
                slug: m.value_of("slug").map(str::to_string),
                created: None,
            };
            let msg = CreateThread {
                forum: required(m, "forum")?.to_string(),
                draft,
            };
            match send(&addr, msg).await? {
                Err(ForumError::ThreadConflict(existing)) => {
                    print_threads(&[existing], json)?;
                    return Err(format_err!("thread slug already taken"));
                },
                other => print_threads(&[other?], json)?,
            }
        },
        ("thread", Some(m)) => {
            let thread = ask(&addr, GetThread { thread: thread_ref(m)? }).await?;
            print_threads(&[thread], json)?;
        },
        ("update-thread", Some(m)) => {
            let patch = ThreadPatch {
                title: m.value_of("title").unwrap_or_default().to_string(),
                message: m.value_of("message").unwrap_or_default().to_string(),
            };
            let thread = ask(&addr, UpdateThread { thread: thread_ref(m)?, patch }).await?;
            print_threads(&[thread], json)?;
        },
        ("threads", Some(m)) => {
            let since = match m.value_of("since") {
                Some(s) => Some(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc)),
                None => None,
            };
            let query = ThreadsQuery::default()
                .limit(int_arg(m, "limit")?.unwrap_or(DEFAULT_LIMIT))
                .since(since)
                .desc(m.is_present("desc"));
            let msg = ListThreads {
                forum: required(m, "forum")?.to_string(),
                query,
            };
            let threads = ask(&addr, msg).await?;
            print_threads(&threads, json)?;
        },
        ("create-posts", Some(m)) => {
            let drafts: Vec<PostDraft> = match m.value_of("file") {
                Some(path) => serde_json::from_reader(File::open(path)?)?,
                None => {
                    let mut buf = String::new();
                    io::stdin().read_to_string(&mut buf)?;
                    serde_json::from_str(&buf)?
                },
            };
            let posts = ask(&addr, CreatePosts { thread: thread_ref(m)?, drafts }).await?;
            print_posts(&posts, false, json)?;
        },
        ("posts", Some(m)) => {
            let msg = GetPosts {
                thread: thread_ref(m)?,
                limit: int_arg(m, "limit")?,
                since: int_arg(m, "since")?,
                sort: m.value_of("sort").map(str::to_string),
                desc: m.is_present("desc"),
            };
            let indent = msg.sort.as_ref().map_or(false, |s| s != "flat");
            let posts = ask(&addr, msg).await?;
            print_posts(&posts, indent, json)?;
        },
        ("post", Some(m)) => {
            let msg = GetPost {
                id: required_int(m, "id")?,
                related: Related::parse(m.value_of("related").unwrap_or_default()),
            };
            let details = ask(&addr, msg).await?;
            if json {
                return print_json(&PostDetailsResponse::from(&details));
            }
            print_posts(&[details.post], false, false)?;
            if let Some(ref author) = details.author {
                print_users(&[author.clone()], false)?;
            }
            if let Some(ref forum) = details.forum {
                print_forum(forum, false)?;
            }
            if let Some(ref thread) = details.thread {
                print_threads(&[thread.clone()], false)?;
            }
        },
        ("edit-post", Some(m)) => {
            let msg = UpdatePost {
                id: required_int(m, "id")?,
                message: required(m, "message")?.to_string(),
            };
            let post = ask(&addr, msg).await?;
            print_posts(&[post], false, json)?;
        },
        ("vote", Some(m)) => {
            let msg = VoteThread {
                thread: thread_ref(m)?,
                nickname: required(m, "nickname")?.to_string(),
                voice: parse_voice(required(m, "voice")?)?,
            };
            let thread = ask(&addr, msg).await?;
            print_threads(&[thread], json)?;
        },
        _ => unreachable!(),
    }

    Ok(())
}

/// Sends `msg` to the executors and waits for the answer, keeping the
/// store's error so callers can match on it.
async fn send<M, T>(addr: &Addr<DbExecutor>, msg: M) -> Result<Result<T, ForumError>, Error>
where
    M: Message<Result = Result<T, ForumError>> + Send + 'static,
    T: Send + 'static,
    DbExecutor: Handler<M>,
{
    addr.send(msg)
        .await
        .map_err(|e| format_err!("database executor unavailable: {}", e))
}

async fn ask<M, T>(addr: &Addr<DbExecutor>, msg: M) -> Result<T, Error>
where
    M: Message<Result = Result<T, ForumError>> + Send + 'static,
    T: Send + 'static,
    DbExecutor: Handler<M>,
{
    Ok(send(addr, msg).await??)
}

fn required<'a>(m: &'a ArgMatches, name: &str) -> Result<&'a str, Error> {
    m.value_of(name).ok_or_else(|| format_err!("--{} is required", name))
}

fn int_arg(m: &ArgMatches, name: &str) -> Result<Option<i64>, Error> {
    match m.value_of(name) {
        Some(raw) => raw
            .parse::<i64>()
            .map(Some)
            .map_err(|_| format_err!("{} expects an integer, got {:?}", name, raw)),
        None => Ok(None),
    }
}

fn required_int(m: &ArgMatches, name: &str) -> Result<i64, Error> {
    int_arg(m, name)?.ok_or_else(|| format_err!("{} is required", name))
}

fn parse_voice(raw: &str) -> Result<i32, Error> {
    raw.parse::<i32>()
        .map_err(|_| format_err!("voice expects a 32-bit integer, got {:?}", raw))
}

fn thread_ref(m: &ArgMatches) -> Result<ThreadRef, Error> {
    Ok(required(m, "thread")?.parse::<ThreadRef>()?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_users(users: &[User], json: bool) -> Result<(), Error> {
    if json {
        let users: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();
        return print_json(&users);
    }
    let mut table = Table::new();
    table.add_row(row!["ID", "Nickname", "Full name", "Email", "About"]);
    for user in users {
        table.add_row(row![user.id, user.nickname, user.fullname, user.email, user.about]);
    }
    table.printstd();
    Ok(())
}

fn print_forum(forum: &Forum, json: bool) -> Result<(), Error> {
    if json {
        return print_json(&ForumResponse::from(forum));
    }
    let mut table = Table::new();
    table.add_row(row!["Slug", "Title", "Owner", "Threads", "Posts"]);
    table.add_row(row![forum.slug, forum.title, forum.user, forum.threads, forum.posts]);
    table.printstd();
    Ok(())
}

fn print_threads(threads: &[Thread], json: bool) -> Result<(), Error> {
    if json {
        let threads: Vec<ThreadResponse> = threads.iter().map(ThreadResponse::from).collect();
        return print_json(&threads);
    }
    let mut table = Table::new();
    table.add_row(row!["ID", "Slug", "Forum", "Author", "Title", "Votes", "Created"]);
    for thread in threads {
        let slug = if let Some(ref s) = thread.slug { s.to_string() } else { "".to_string() };
        table.add_row(row![
            thread.id,
            slug,
            thread.forum,
            thread.author,
            thread.title,
            thread.votes,
            thread.created.to_rfc3339()
        ]);
    }
    table.printstd();
    Ok(())
}

fn print_posts(posts: &[Post], indent: bool, json: bool) -> Result<(), Error> {
    if json {
        let posts: Vec<PostResponse> = posts.iter().map(PostResponse::from).collect();
        return print_json(&posts);
    }
    let mut table = Table::new();
    table.add_row(row!["ID", "Parent", "Path", "Author", "Message", "Edited", "Created"]);
    for post in posts {
        let message = if indent {
            format!("{}{}", "  ".repeat(post.path.depth() - 1), post.message)
        } else {
            post.message.clone()
        };
        let edited = if post.is_edited { "yes" } else { "" };
        table.add_row(row![
            post.id,
            post.parent,
            post.path,
            post.author,
            message,
            edited,
            post.created.to_rfc3339()
        ]);
    }
    table.printstd();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_must_fit_in_32_bits() {
        assert_eq!(parse_voice("-3").unwrap(), -3);
        assert_eq!(parse_voice("2147483647").unwrap(), i32::MAX);
        assert!(parse_voice("4294967297").is_err());
        assert!(parse_voice("up").is_err());
    }
}
