use thiserror::Error;

use crate::db_types::{NewUser, User};

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Email is already registered")]
    EmailAlreadyRegistered,
    #[error("Username is already taken")]
    UsernameTaken,
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}

/// The `AccountManagement` trait defines behaviour for storing and querying user accounts.
///
/// Users are keyed by email. Emails compare case-insensitively.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    async fn fetch_user_by_id(&self, user_id: i64) -> Result<Option<User>, AccountApiError>;

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AccountApiError>;

    /// Lists users ordered by id. With a keyword, only users whose username or email contains it
    /// (case-insensitively) are returned.
    async fn search_users(&self, keyword: Option<&str>) -> Result<Vec<User>, AccountApiError>;

    /// Inserts a brand-new user. Returns [`AccountApiError::EmailAlreadyRegistered`] if the email exists.
    async fn create_user(&self, user: NewUser) -> Result<User, AccountApiError>;

    /// Returns the user with the given email, creating it from `user` if it does not exist yet.
    ///
    /// The insert is a single conditional statement, so concurrent first logins for the same email produce exactly
    /// one account. The first writer's username and password hash are kept; later callers get the existing record.
    async fn fetch_or_create_user(&self, user: NewUser) -> Result<User, AccountApiError>;

    /// Deletes the user. Returns `false` if there was no such user.
    async fn delete_user(&self, user_id: i64) -> Result<bool, AccountApiError>;
}
