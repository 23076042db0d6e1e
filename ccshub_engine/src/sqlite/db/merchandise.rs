use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{Merchandise, NewMerchandise},
    traits::CatalogApiError,
};

const MERCH_COLUMNS: &str = "id, name, description, price, stock, image IS NOT NULL AS has_image";

fn check_item(item: &NewMerchandise) -> Result<(), CatalogApiError> {
    if item.stock < 0 {
        return Err(CatalogApiError::InvalidItem("Stock cannot be negative".into()));
    }
    if item.name.trim().is_empty() {
        return Err(CatalogApiError::InvalidItem("Merchandise name is required".into()));
    }
    Ok(())
}

pub async fn search_merchandise(
    pattern: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Merchandise>, CatalogApiError> {
    let items = match pattern {
        Some(p) => {
            trace!("🗃️ Searching merchandise matching {p}");
            let q = format!(
                "SELECT {MERCH_COLUMNS} FROM merchandise WHERE lower(name) LIKE $1 OR lower(description) LIKE $1 \
                 ORDER BY id"
            );
            sqlx::query_as::<_, Merchandise>(&q).bind(p).fetch_all(conn).await?
        },
        None => {
            let q = format!("SELECT {MERCH_COLUMNS} FROM merchandise ORDER BY id");
            sqlx::query_as::<_, Merchandise>(&q).fetch_all(conn).await?
        },
    };
    Ok(items)
}

pub async fn fetch_merchandise(id: i64, conn: &mut SqliteConnection) -> Result<Option<Merchandise>, CatalogApiError> {
    let q = format!("SELECT {MERCH_COLUMNS} FROM merchandise WHERE id = $1");
    let item = sqlx::query_as::<_, Merchandise>(&q).bind(id).fetch_optional(conn).await?;
    Ok(item)
}

/// `None` if either the item or its image is missing.
pub async fn fetch_image(id: i64, conn: &mut SqliteConnection) -> Result<Option<Vec<u8>>, CatalogApiError> {
    let image: Option<Option<Vec<u8>>> =
        sqlx::query_scalar("SELECT image FROM merchandise WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(image.flatten())
}

pub async fn insert_merchandise(
    item: NewMerchandise,
    conn: &mut SqliteConnection,
) -> Result<Merchandise, CatalogApiError> {
    check_item(&item)?;
    let q = format!(
        "INSERT INTO merchandise (name, description, price, stock, image) VALUES ($1, $2, $3, $4, $5) RETURNING \
         {MERCH_COLUMNS}"
    );
    let item = sqlx::query_as::<_, Merchandise>(&q)
        .bind(item.name)
        .bind(item.description)
        .bind(item.price)
        .bind(item.stock)
        .bind(item.image)
        .fetch_one(conn)
        .await?;
    debug!("🗃️ Merchandise #{} ({}) created with stock {}", item.id, item.name, item.stock);
    Ok(item)
}

pub async fn update_merchandise(
    id: i64,
    item: NewMerchandise,
    conn: &mut SqliteConnection,
) -> Result<Option<Merchandise>, CatalogApiError> {
    check_item(&item)?;
    let q = format!(
        "UPDATE merchandise SET name = $1, description = $2, price = $3, stock = $4, image = coalesce($5, image) \
         WHERE id = $6 RETURNING {MERCH_COLUMNS}"
    );
    let item = sqlx::query_as::<_, Merchandise>(&q)
        .bind(item.name)
        .bind(item.description)
        .bind(item.price)
        .bind(item.stock)
        .bind(item.image)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(item)
}

pub async fn delete_merchandise(id: i64, conn: &mut SqliteConnection) -> Result<bool, CatalogApiError> {
    let result = sqlx::query("DELETE FROM merchandise WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

/// Removes one unit of stock. The `stock > 0` guard and the decrement are a single statement, so concurrent callers
/// can never drive the stock negative. Returns the remaining stock, or `None` if no row was changed.
pub async fn decrement_stock(id: i64, conn: &mut SqliteConnection) -> Result<Option<i64>, CatalogApiError> {
    let remaining: Option<i64> =
        sqlx::query_scalar("UPDATE merchandise SET stock = stock - 1 WHERE id = $1 AND stock > 0 RETURNING stock")
            .bind(id)
            .fetch_optional(conn)
            .await?;
    match remaining {
        Some(n) => debug!("🗃️ Merchandise #{id} stock decremented to {n}"),
        None => debug!("🗃️ Merchandise #{id} has no stock left (or does not exist). Stock unchanged"),
    }
    Ok(remaining)
}
