use thiserror::Error;

use crate::db_types::{Event, Merchandise, NewEvent, NewMerchandise};

#[derive(Debug, Clone, Error)]
pub enum CatalogApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid catalogue item: {0}")]
    InvalidItem(String),
}

impl From<sqlx::Error> for CatalogApiError {
    fn from(e: sqlx::Error) -> Self {
        CatalogApiError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait MerchandiseManagement {
    /// Lists merchandise ordered by id, optionally filtered by a case-insensitive keyword on the name or
    /// description.
    async fn search_merchandise(&self, keyword: Option<&str>) -> Result<Vec<Merchandise>, CatalogApiError>;

    async fn fetch_merchandise(&self, id: i64) -> Result<Option<Merchandise>, CatalogApiError>;

    async fn fetch_merchandise_image(&self, id: i64) -> Result<Option<Vec<u8>>, CatalogApiError>;

    async fn create_merchandise(&self, item: NewMerchandise) -> Result<Merchandise, CatalogApiError>;

    /// Replaces the item's fields. A `None` image keeps the stored one. Returns `None` if the item does not exist.
    async fn update_merchandise(&self, id: i64, item: NewMerchandise) -> Result<Option<Merchandise>, CatalogApiError>;

    async fn delete_merchandise(&self, id: i64) -> Result<bool, CatalogApiError>;

    /// Takes one unit out of stock with a single conditional update that never lets stock go below zero.
    ///
    /// Returns the remaining stock, or `None` if nothing changed because the stock was already zero or the item does
    /// not exist.
    async fn decrement_stock(&self, id: i64) -> Result<Option<i64>, CatalogApiError>;
}

#[allow(async_fn_in_trait)]
pub trait EventManagement {
    /// Lists events by date, optionally filtered by a case-insensitive keyword on the title, description or
    /// location.
    async fn search_events(&self, keyword: Option<&str>) -> Result<Vec<Event>, CatalogApiError>;

    async fn fetch_event(&self, id: i64) -> Result<Option<Event>, CatalogApiError>;

    async fn fetch_event_image(&self, id: i64) -> Result<Option<Vec<u8>>, CatalogApiError>;

    async fn create_event(&self, event: NewEvent) -> Result<Event, CatalogApiError>;

    async fn update_event(&self, id: i64, event: NewEvent) -> Result<Option<Event>, CatalogApiError>;

    async fn delete_event(&self, id: i64) -> Result<bool, CatalogApiError>;
}
