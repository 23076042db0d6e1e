//! Unifies API for accessing user accounts.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewUser, User},
    traits::{AccountApiError, AccountManagement},
};

/// The `AccountApi` provides a unified API for accessing user accounts.
pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn user_by_id(&self, user_id: i64) -> Result<Option<User>, AccountApiError> {
        self.db.fetch_user_by_id(user_id).await
    }

    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>, AccountApiError> {
        self.db.fetch_user_by_email(email).await
    }

    /// All users, or those whose username or email contains `keyword`.
    pub async fn search_users(&self, keyword: Option<&str>) -> Result<Vec<User>, AccountApiError> {
        self.db.search_users(keyword).await
    }

    /// Registers a new local account. The password must already be hashed.
    pub async fn register(&self, user: NewUser) -> Result<User, AccountApiError> {
        let email = user.email.clone();
        let user = self.db.create_user(user).await?;
        info!("🧑️ New user #{} registered with {email}", user.id);
        Ok(user)
    }

    /// Returns the account for the user's email, creating it if this is the first time the email is seen.
    pub async fn fetch_or_create(&self, user: NewUser) -> Result<User, AccountApiError> {
        trace!("🧑️ Fetching or creating account for {}", user.email);
        self.db.fetch_or_create_user(user).await
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<bool, AccountApiError> {
        let deleted = self.db.delete_user(user_id).await?;
        if deleted {
            info!("🧑️ User #{user_id} deleted");
        }
        Ok(deleted)
    }
}
