use diesel::pg::PgConnection;
use diesel::prelude::*;
use log::debug;

use super::optional;
use crate::error::ForumError;
use crate::models::{User, UserInsert, UserProfile};
use crate::schema::users;

pub fn lookup_user(conn: &mut PgConnection, nickname: &str) -> Result<Option<User>, ForumError> {
    optional(
        users::table
            .filter(users::nickname.eq(nickname))
            .first::<User>(conn),
    )
}

pub fn find_user(conn: &mut PgConnection, nickname: &str) -> Result<User, ForumError> {
    lookup_user(conn, nickname)?.ok_or_else(|| ForumError::UserNotFound(nickname.to_string()))
}

/// Creates a user. If the nickname or the email is taken, fails with
/// `UserConflict` carrying every user that holds either of them.
pub fn create_user(
    conn: &mut PgConnection,
    nickname: &str,
    profile: &UserProfile,
) -> Result<User, ForumError> {
    conn.transaction(|conn| {
        let existing = users::table
            .filter(
                users::nickname
                    .eq(nickname)
                    .or(users::email.eq(&profile.email)),
            )
            .order(users::id)
            .load::<User>(conn)?;
        if !existing.is_empty() {
            return Err(ForumError::UserConflict(existing));
        }

        let user = diesel::insert_into(users::table)
            .values(UserInsert {
                nickname,
                fullname: &profile.fullname,
                about: &profile.about,
                email: &profile.email,
            })
            .get_result::<User>(conn)?;
        debug!("created user {} ({})", user.nickname, user.id);
        Ok(user)
    })
}

/// Updates a user's profile. Empty fields keep their stored value.
pub fn update_user(
    conn: &mut PgConnection,
    nickname: &str,
    profile: &UserProfile,
) -> Result<User, ForumError> {
    conn.transaction(|conn| {
        let current = find_user(conn, nickname)?;

        let fullname = keep_if_empty(&profile.fullname, &current.fullname);
        let about = keep_if_empty(&profile.about, &current.about);
        let email = keep_if_empty(&profile.email, &current.email);

        let taken = users::table
            .filter(users::email.eq(email))
            .filter(users::id.ne(current.id))
            .load::<User>(conn)?;
        if !taken.is_empty() {
            return Err(ForumError::UserConflict(taken));
        }

        let user = diesel::update(users::table.find(current.id))
            .set((
                users::fullname.eq(fullname),
                users::about.eq(about),
                users::email.eq(email),
            ))
            .get_result::<User>(conn)?;
        Ok(user)
    })
}

fn keep_if_empty<'a>(new: &'a str, old: &'a str) -> &'a str {
    if new.is_empty() {
        old
    } else {
        new
    }
}
