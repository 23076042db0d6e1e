use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Admin, NewAdmin},
    traits::{AccountApiError, AdminManagement},
};

pub struct AdminApi<B> {
    db: B,
}

impl<B: Debug> Debug for AdminApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AdminApi ({:?})", self.db)
    }
}

impl<B> AdminApi<B>
where B: AdminManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn admins(&self) -> Result<Vec<Admin>, AccountApiError> {
        self.db.fetch_admins().await
    }

    pub async fn admin_by_id(&self, admin_id: i64) -> Result<Option<Admin>, AccountApiError> {
        self.db.fetch_admin_by_id(admin_id).await
    }

    pub async fn admin_by_username(&self, username: &str) -> Result<Option<Admin>, AccountApiError> {
        self.db.fetch_admin_by_username(username).await
    }

    pub async fn create_admin(&self, admin: NewAdmin) -> Result<Admin, AccountApiError> {
        let admin = self.db.create_admin(admin).await?;
        info!("🧑️ Admin #{} ({}) created", admin.id, admin.username);
        Ok(admin)
    }

    pub async fn update_admin(&self, admin_id: i64, admin: NewAdmin) -> Result<Option<Admin>, AccountApiError> {
        self.db.update_admin(admin_id, admin).await
    }

    pub async fn delete_admin(&self, admin_id: i64) -> Result<bool, AccountApiError> {
        let deleted = self.db.delete_admin(admin_id).await?;
        if deleted {
            info!("🧑️ Admin #{admin_id} deleted");
        }
        Ok(deleted)
    }
}
