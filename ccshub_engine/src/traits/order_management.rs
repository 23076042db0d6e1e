use thiserror::Error;

use crate::db_types::{NewOrder, Order, OrderChanges, OrderUpdate};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("The order refers to a user, merchandise item or event that does not exist")]
    InvalidReference,
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(ref de) if de.is_foreign_key_violation() => OrderFlowError::InvalidReference,
            _ => OrderFlowError::DatabaseError(e.to_string()),
        }
    }
}

/// Storage for orders.
///
/// Implementations own the atomicity of [`OrderManagement::update_order`]: the move into `Approved` must be a
/// compare-and-swap on the stored payment status so that exactly one caller observes it, however many concurrent
/// "Approved" updates arrive.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// All orders by id, or, with a keyword, the orders whose username, merchandise name or event title contains
    /// it (case-insensitively).
    async fn search_orders(&self, keyword: Option<&str>) -> Result<Vec<Order>, OrderFlowError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;

    /// A user's orders, newest first.
    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError>;

    async fn fetch_receipt_image(&self, order_id: i64) -> Result<Option<Vec<u8>>, OrderFlowError>;

    /// Stores a new order. Never touches inventory.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderFlowError>;

    /// Applies `changes` to the order in one transaction. Returns `None` if the order does not exist. Empty changes
    /// return the order as stored.
    ///
    /// [`OrderUpdate::approval`] is `Some` iff this call changed the payment status from something other than
    /// `Approved` to `Approved`.
    async fn update_order(&self, order_id: i64, changes: OrderChanges) -> Result<Option<OrderUpdate>, OrderFlowError>;

    async fn delete_order(&self, order_id: i64) -> Result<bool, OrderFlowError>;
}
