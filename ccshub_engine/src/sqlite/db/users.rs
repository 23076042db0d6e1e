use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewUser, User},
    traits::AccountApiError,
};

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at";

pub async fn fetch_user_by_id(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, AccountApiError> {
    let q = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let user = sqlx::query_as::<_, User>(&q).bind(user_id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_user_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<User>, AccountApiError> {
    let q = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    let user = sqlx::query_as::<_, User>(&q).bind(email).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn search_users(pattern: Option<String>, conn: &mut SqliteConnection) -> Result<Vec<User>, AccountApiError> {
    let users = match pattern {
        Some(p) => {
            trace!("🗃️ Searching users matching {p}");
            let q = format!(
                "SELECT {USER_COLUMNS} FROM users WHERE lower(username) LIKE $1 OR lower(email) LIKE $1 ORDER BY id"
            );
            sqlx::query_as::<_, User>(&q).bind(p).fetch_all(conn).await?
        },
        None => {
            let q = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
            sqlx::query_as::<_, User>(&q).fetch_all(conn).await?
        },
    };
    Ok(users)
}

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, AccountApiError> {
    let q = format!(
        "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
    );
    let result = sqlx::query_as::<_, User>(&q)
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .fetch_one(conn)
        .await;
    match result {
        Ok(user) => {
            debug!("🗃️ User #{} created for {}", user.id, user.email);
            Ok(user)
        },
        Err(sqlx::Error::Database(de)) if de.is_unique_violation() => Err(AccountApiError::EmailAlreadyRegistered),
        Err(e) => Err(e.into()),
    }
}

/// Inserts the user unless the email is already present, then reads back whichever record owns the email.
///
/// The insert and the conflict check are one statement, so racing callers cannot create duplicates.
pub async fn fetch_or_create_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, AccountApiError> {
    let email = user.email.clone();
    let inserted = sqlx::query(
        "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) ON CONFLICT(email) DO NOTHING",
    )
    .bind(user.username)
    .bind(user.email)
    .bind(user.password_hash)
    .execute(&mut *conn)
    .await?
    .rows_affected();
    if inserted > 0 {
        debug!("🗃️ New user account created for {email}");
    }
    fetch_user_by_email(&email, conn)
        .await?
        .ok_or_else(|| AccountApiError::DatabaseError(format!("User {email} vanished after insert")))
}

pub async fn delete_user(user_id: i64, conn: &mut SqliteConnection) -> Result<bool, AccountApiError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(user_id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}
