use chrono::Utc;
use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{Approval, NewOrder, Order, OrderChanges, OrderStatus, PaymentStatus},
    traits::OrderFlowError,
};

const ORDER_SELECT: &str = r#"
    SELECT
        o.id,
        o.user_id,
        u.username AS username,
        o.merchandise_id,
        m.name AS merchandise_name,
        o.event_id,
        e.title AS event_title,
        o.total_amount,
        o.order_date,
        o.payment_status,
        o.order_status,
        o.receipt_image IS NOT NULL AS has_receipt
    FROM orders o
        LEFT JOIN users u ON u.id = o.user_id
        LEFT JOIN merchandise m ON m.id = o.merchandise_id
        LEFT JOIN events e ON e.id = o.event_id"#;

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, OrderFlowError> {
    let q = format!("{ORDER_SELECT} WHERE o.id = $1");
    let order = sqlx::query_as::<_, Order>(&q).bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn search_orders(pattern: Option<String>, conn: &mut SqliteConnection) -> Result<Vec<Order>, OrderFlowError> {
    let orders = match pattern {
        Some(p) => {
            trace!("🗃️ Searching orders matching {p}");
            let q = format!(
                "{ORDER_SELECT} WHERE lower(u.username) LIKE $1 OR lower(m.name) LIKE $1 OR lower(e.title) LIKE $1 \
                 ORDER BY o.id"
            );
            sqlx::query_as::<_, Order>(&q).bind(p).fetch_all(conn).await?
        },
        None => {
            let q = format!("{ORDER_SELECT} ORDER BY o.id");
            sqlx::query_as::<_, Order>(&q).fetch_all(conn).await?
        },
    };
    Ok(orders)
}

pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, OrderFlowError> {
    let q = format!("{ORDER_SELECT} WHERE o.user_id = $1 ORDER BY o.order_date DESC, o.id DESC");
    let orders = sqlx::query_as::<_, Order>(&q).bind(user_id).fetch_all(conn).await?;
    Ok(orders)
}

pub async fn fetch_receipt_image(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Vec<u8>>, OrderFlowError> {
    let image: Option<Option<Vec<u8>>> = sqlx::query_scalar("SELECT receipt_image FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(image.flatten())
}

/// Inserts a new order and returns its id. Missing statuses fall back to `Pending` / `Processing`, and a missing
/// order date to the current time.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<i64, OrderFlowError> {
    let payment_status = order.payment_status.unwrap_or(PaymentStatus::Pending);
    let order_status = order.order_status.unwrap_or(OrderStatus::Processing);
    let order_date = order.order_date.unwrap_or_else(Utc::now);
    let id: i64 = sqlx::query_scalar(
        r#"INSERT INTO orders (
            user_id, merchandise_id, event_id, total_amount, order_date, receipt_image, payment_status, order_status
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id"#,
    )
    .bind(order.user_id)
    .bind(order.merchandise_id)
    .bind(order.event_id)
    .bind(order.total_amount)
    .bind(order_date)
    .bind(order.receipt_image)
    .bind(String::from(payment_status))
    .bind(String::from(order_status))
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order #{id} saved for user #{}", order.user_id);
    Ok(id)
}

/// Moves the order's payment status into `Approved` iff it is not already there.
///
/// This is a single conditional update, so when several callers race to approve the same order, exactly one of them
/// gets `Some` back. The returned approval carries the merchandise the order referenced at that moment.
pub async fn approve_payment(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Approval>, OrderFlowError> {
    let approved: Option<Option<i64>> = sqlx::query_scalar(
        "UPDATE orders SET payment_status = 'Approved' WHERE id = $1 AND payment_status <> 'Approved' RETURNING \
         merchandise_id",
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    if approved.is_some() {
        debug!("🗃️ Order #{order_id} payment status moved to Approved");
    }
    Ok(approved.map(|merchandise_id| Approval { merchandise_id }))
}

/// Writes every supplied column except an approving payment status, which is [`approve_payment`]'s job.
/// Returns `false` if there was nothing to write, or the order does not exist.
pub async fn update_columns(
    order_id: i64,
    changes: OrderChanges,
    conn: &mut SqliteConnection,
) -> Result<bool, OrderFlowError> {
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE orders SET ");
    let mut set_clause = builder.separated(", ");
    let mut count = 0;
    if let Some(user_id) = changes.user_id {
        set_clause.push("user_id = ").push_bind_unseparated(user_id);
        count += 1;
    }
    if let Some(merchandise_id) = changes.merchandise_id {
        set_clause.push("merchandise_id = ").push_bind_unseparated(merchandise_id);
        count += 1;
    }
    if let Some(event_id) = changes.event_id {
        set_clause.push("event_id = ").push_bind_unseparated(event_id);
        count += 1;
    }
    if let Some(total_amount) = changes.total_amount {
        set_clause.push("total_amount = ").push_bind_unseparated(total_amount);
        count += 1;
    }
    if let Some(order_date) = changes.order_date {
        set_clause.push("order_date = ").push_bind_unseparated(order_date);
        count += 1;
    }
    if let Some(status) = changes.payment_status.filter(|s| !s.is_approved()) {
        set_clause.push("payment_status = ").push_bind_unseparated(String::from(status));
        count += 1;
    }
    if let Some(status) = changes.order_status {
        set_clause.push("order_status = ").push_bind_unseparated(String::from(status));
        count += 1;
    }
    if let Some(image) = changes.receipt_image {
        set_clause.push("receipt_image = ").push_bind_unseparated(image);
        count += 1;
    }
    if count == 0 {
        return Ok(false);
    }
    builder.push(" WHERE id = ").push_bind(order_id);
    trace!("🗃️ Executing query: {}", builder.sql());
    let result = builder.build().execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_order(order_id: i64, conn: &mut SqliteConnection) -> Result<bool, OrderFlowError> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1").bind(order_id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}
