//! `SqliteDatabase` is the concrete ccsHub storage backend.
//!
//! It uses SQLite and implements all the traits defined in the [`crate::traits`] module.
use std::fmt::Debug;

use ccshub_common::substring_pattern;
use log::*;
use sqlx::SqlitePool;

use super::db::{admins, events, merchandise, new_pool, orders, run_migrations, users};
use crate::{
    db_types::{
        Admin,
        Event,
        Merchandise,
        NewAdmin,
        NewEvent,
        NewMerchandise,
        NewOrder,
        NewUser,
        Order,
        OrderChanges,
        OrderUpdate,
        User,
    },
    traits::{
        AccountApiError,
        AccountManagement,
        AdminManagement,
        CatalogApiError,
        EventManagement,
        MerchandiseManagement,
        OrderFlowError,
        OrderManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Connects to the database at `url`, creating the file if necessary, and brings the schema up to date.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        run_migrations(&pool).await?;
        info!("🗃️ Connected to {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_user_by_id(&self, user_id: i64) -> Result<Option<User>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user_by_id(user_id, &mut conn).await
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user_by_email(email, &mut conn).await
    }

    async fn search_users(&self, keyword: Option<&str>) -> Result<Vec<User>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        users::search_users(substring_pattern(keyword), &mut conn).await
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(user, &mut conn).await
    }

    async fn fetch_or_create_user(&self, user: NewUser) -> Result<User, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_or_create_user(user, &mut conn).await
    }

    async fn delete_user(&self, user_id: i64) -> Result<bool, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        users::delete_user(user_id, &mut conn).await
    }
}

impl AdminManagement for SqliteDatabase {
    async fn fetch_admins(&self) -> Result<Vec<Admin>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        admins::fetch_admins(&mut conn).await
    }

    async fn fetch_admin_by_id(&self, admin_id: i64) -> Result<Option<Admin>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        admins::fetch_admin_by_id(admin_id, &mut conn).await
    }

    async fn fetch_admin_by_username(&self, username: &str) -> Result<Option<Admin>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        admins::fetch_admin_by_username(username, &mut conn).await
    }

    async fn create_admin(&self, admin: NewAdmin) -> Result<Admin, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        admins::insert_admin(admin, &mut conn).await
    }

    async fn update_admin(&self, admin_id: i64, admin: NewAdmin) -> Result<Option<Admin>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        admins::update_admin(admin_id, admin, &mut conn).await
    }

    async fn delete_admin(&self, admin_id: i64) -> Result<bool, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        admins::delete_admin(admin_id, &mut conn).await
    }
}

impl MerchandiseManagement for SqliteDatabase {
    async fn search_merchandise(&self, keyword: Option<&str>) -> Result<Vec<Merchandise>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        merchandise::search_merchandise(substring_pattern(keyword), &mut conn).await
    }

    async fn fetch_merchandise(&self, id: i64) -> Result<Option<Merchandise>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        merchandise::fetch_merchandise(id, &mut conn).await
    }

    async fn fetch_merchandise_image(&self, id: i64) -> Result<Option<Vec<u8>>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        merchandise::fetch_image(id, &mut conn).await
    }

    async fn create_merchandise(&self, item: NewMerchandise) -> Result<Merchandise, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        merchandise::insert_merchandise(item, &mut conn).await
    }

    async fn update_merchandise(&self, id: i64, item: NewMerchandise) -> Result<Option<Merchandise>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        merchandise::update_merchandise(id, item, &mut conn).await
    }

    async fn delete_merchandise(&self, id: i64) -> Result<bool, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        merchandise::delete_merchandise(id, &mut conn).await
    }

    async fn decrement_stock(&self, id: i64) -> Result<Option<i64>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        merchandise::decrement_stock(id, &mut conn).await
    }
}

impl EventManagement for SqliteDatabase {
    async fn search_events(&self, keyword: Option<&str>) -> Result<Vec<Event>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        events::search_events(substring_pattern(keyword), &mut conn).await
    }

    async fn fetch_event(&self, id: i64) -> Result<Option<Event>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        events::fetch_event(id, &mut conn).await
    }

    async fn fetch_event_image(&self, id: i64) -> Result<Option<Vec<u8>>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        events::fetch_image(id, &mut conn).await
    }

    async fn create_event(&self, event: NewEvent) -> Result<Event, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        events::insert_event(event, &mut conn).await
    }

    async fn update_event(&self, id: i64, event: NewEvent) -> Result<Option<Event>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        events::update_event(id, event, &mut conn).await
    }

    async fn delete_event(&self, id: i64) -> Result<bool, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        events::delete_event(id, &mut conn).await
    }
}

impl OrderManagement for SqliteDatabase {
    async fn search_orders(&self, keyword: Option<&str>) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        orders::search_orders(substring_pattern(keyword), &mut conn).await
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(order_id, &mut conn).await
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders_for_user(user_id, &mut conn).await
    }

    async fn fetch_receipt_image(&self, order_id: i64) -> Result<Option<Vec<u8>>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_receipt_image(order_id, &mut conn).await
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let id = orders::insert_order(order, &mut tx).await?;
        let order = orders::fetch_order(id, &mut tx).await?.ok_or(OrderFlowError::OrderNotFound(id))?;
        tx.commit().await?;
        Ok(order)
    }

    /// The approval compare-and-swap runs first in the transaction so that the transaction takes the write lock
    /// before it reads anything.
    async fn update_order(&self, order_id: i64, changes: OrderChanges) -> Result<Option<OrderUpdate>, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let approval =
            if changes.approves_payment() { orders::approve_payment(order_id, &mut tx).await? } else { None };
        orders::update_columns(order_id, changes, &mut tx).await?;
        let order = match orders::fetch_order(order_id, &mut tx).await? {
            Some(o) => o,
            None => {
                debug!("🗃️ Order #{order_id} does not exist. Nothing updated");
                return Ok(None);
            },
        };
        tx.commit().await?;
        Ok(Some(OrderUpdate { order, approval }))
    }

    async fn delete_order(&self, order_id: i64) -> Result<bool, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        orders::delete_order(order_id, &mut conn).await
    }
}
