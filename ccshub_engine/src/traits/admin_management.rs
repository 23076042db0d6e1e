use crate::{
    db_types::{Admin, NewAdmin},
    traits::AccountApiError,
};

/// Storage for administrator accounts. Admins are keyed by username.
#[allow(async_fn_in_trait)]
pub trait AdminManagement {
    async fn fetch_admins(&self) -> Result<Vec<Admin>, AccountApiError>;

    async fn fetch_admin_by_id(&self, admin_id: i64) -> Result<Option<Admin>, AccountApiError>;

    async fn fetch_admin_by_username(&self, username: &str) -> Result<Option<Admin>, AccountApiError>;

    /// Returns [`AccountApiError::UsernameTaken`] if another admin already uses the username.
    async fn create_admin(&self, admin: NewAdmin) -> Result<Admin, AccountApiError>;

    /// Replaces the username, role and password hash. Returns `None` if the admin does not exist.
    async fn update_admin(&self, admin_id: i64, admin: NewAdmin) -> Result<Option<Admin>, AccountApiError>;

    async fn delete_admin(&self, admin_id: i64) -> Result<bool, AccountApiError>;
}
