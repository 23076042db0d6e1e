//! APIs for the merchandise and event catalogues.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Event, Merchandise, NewEvent, NewMerchandise},
    traits::{CatalogApiError, EventManagement, MerchandiseManagement},
};

pub struct MerchandiseApi<B> {
    db: B,
}

impl<B: Debug> Debug for MerchandiseApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MerchandiseApi ({:?})", self.db)
    }
}

impl<B> MerchandiseApi<B>
where B: MerchandiseManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn search(&self, keyword: Option<&str>) -> Result<Vec<Merchandise>, CatalogApiError> {
        self.db.search_merchandise(keyword).await
    }

    pub async fn merchandise(&self, id: i64) -> Result<Option<Merchandise>, CatalogApiError> {
        self.db.fetch_merchandise(id).await
    }

    pub async fn image(&self, id: i64) -> Result<Option<Vec<u8>>, CatalogApiError> {
        self.db.fetch_merchandise_image(id).await
    }

    pub async fn create(&self, item: NewMerchandise) -> Result<Merchandise, CatalogApiError> {
        let item = self.db.create_merchandise(item).await?;
        info!("🛍️ Merchandise #{} ({}) added to the catalogue", item.id, item.name);
        Ok(item)
    }

    pub async fn update(&self, id: i64, item: NewMerchandise) -> Result<Option<Merchandise>, CatalogApiError> {
        self.db.update_merchandise(id, item).await
    }

    pub async fn delete(&self, id: i64) -> Result<bool, CatalogApiError> {
        self.db.delete_merchandise(id).await
    }
}

pub struct EventApi<B> {
    db: B,
}

impl<B: Debug> Debug for EventApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EventApi ({:?})", self.db)
    }
}

impl<B> EventApi<B>
where B: EventManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn search(&self, keyword: Option<&str>) -> Result<Vec<Event>, CatalogApiError> {
        self.db.search_events(keyword).await
    }

    pub async fn event(&self, id: i64) -> Result<Option<Event>, CatalogApiError> {
        self.db.fetch_event(id).await
    }

    pub async fn image(&self, id: i64) -> Result<Option<Vec<u8>>, CatalogApiError> {
        self.db.fetch_event_image(id).await
    }

    pub async fn create(&self, event: NewEvent) -> Result<Event, CatalogApiError> {
        let event = self.db.create_event(event).await?;
        info!("📅️ Event #{} ({}) scheduled for {}", event.id, event.title, event.event_date);
        Ok(event)
    }

    pub async fn update(&self, id: i64, event: NewEvent) -> Result<Option<Event>, CatalogApiError> {
        self.db.update_event(id, event).await
    }

    pub async fn delete(&self, id: i64) -> Result<bool, CatalogApiError> {
        self.db.delete_event(id).await
    }
}
