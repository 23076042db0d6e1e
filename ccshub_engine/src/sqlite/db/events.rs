use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Event, NewEvent},
    traits::CatalogApiError,
};

const EVENT_COLUMNS: &str = "id, title, description, location, event_date, image IS NOT NULL AS has_image";

pub async fn search_events(pattern: Option<String>, conn: &mut SqliteConnection) -> Result<Vec<Event>, CatalogApiError> {
    let events = match pattern {
        Some(p) => {
            let q = format!(
                "SELECT {EVENT_COLUMNS} FROM events WHERE lower(title) LIKE $1 OR lower(description) LIKE $1 OR \
                 lower(location) LIKE $1 ORDER BY event_date, id"
            );
            sqlx::query_as::<_, Event>(&q).bind(p).fetch_all(conn).await?
        },
        None => {
            let q = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY event_date, id");
            sqlx::query_as::<_, Event>(&q).fetch_all(conn).await?
        },
    };
    Ok(events)
}

pub async fn fetch_event(id: i64, conn: &mut SqliteConnection) -> Result<Option<Event>, CatalogApiError> {
    let q = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
    let event = sqlx::query_as::<_, Event>(&q).bind(id).fetch_optional(conn).await?;
    Ok(event)
}

pub async fn fetch_image(id: i64, conn: &mut SqliteConnection) -> Result<Option<Vec<u8>>, CatalogApiError> {
    let image: Option<Option<Vec<u8>>> =
        sqlx::query_scalar("SELECT image FROM events WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(image.flatten())
}

pub async fn insert_event(event: NewEvent, conn: &mut SqliteConnection) -> Result<Event, CatalogApiError> {
    if event.title.trim().is_empty() {
        return Err(CatalogApiError::InvalidItem("Event title is required".into()));
    }
    let q = format!(
        "INSERT INTO events (title, description, location, event_date, image) VALUES ($1, $2, $3, $4, $5) RETURNING \
         {EVENT_COLUMNS}"
    );
    let event = sqlx::query_as::<_, Event>(&q)
        .bind(event.title)
        .bind(event.description)
        .bind(event.location)
        .bind(event.event_date)
        .bind(event.image)
        .fetch_one(conn)
        .await?;
    debug!("🗃️ Event #{} ({}) created for {}", event.id, event.title, event.event_date);
    Ok(event)
}

pub async fn update_event(
    id: i64,
    event: NewEvent,
    conn: &mut SqliteConnection,
) -> Result<Option<Event>, CatalogApiError> {
    let q = format!(
        "UPDATE events SET title = $1, description = $2, location = $3, event_date = $4, image = coalesce($5, image) \
         WHERE id = $6 RETURNING {EVENT_COLUMNS}"
    );
    let event = sqlx::query_as::<_, Event>(&q)
        .bind(event.title)
        .bind(event.description)
        .bind(event.location)
        .bind(event.event_date)
        .bind(event.image)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(event)
}

pub async fn delete_event(id: i64, conn: &mut SqliteConnection) -> Result<bool, CatalogApiError> {
    let result = sqlx::query("DELETE FROM events WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}
