use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{
        Approval,
        InventoryAdjustment,
        NewOrder,
        Order,
        OrderChanges,
        OrderEdit,
        OrderStatus,
        OrderUpdateOutcome,
        PaymentStatus,
    },
    traits::{MerchandiseManagement, OrderFlowError, OrderManagement},
};

/// `OrderFlowApi` handles the order lifecycle: checkout, admin status changes, full edits and receipt uploads.
///
/// The one piece of workflow it enforces is the inventory rule. When an update moves an order's payment status into
/// `Approved` and the order is for a merchandise item, one unit is taken out of that item's stock. The move is
/// detected by the backend's compare-and-swap, so re-approving an approved order never decrements again. The stock
/// change is best effort: if it fails, the failure is logged and the order update still stands.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B: Debug> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.db)
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement + MerchandiseManagement
{
    pub async fn orders(&self, keyword: Option<&str>) -> Result<Vec<Order>, OrderFlowError> {
        self.db.search_orders(keyword).await
    }

    pub async fn order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError> {
        self.db.fetch_order(order_id).await
    }

    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError> {
        self.db.fetch_orders_for_user(user_id).await
    }

    pub async fn receipt_image(&self, order_id: i64) -> Result<Option<Vec<u8>>, OrderFlowError> {
        self.db.fetch_receipt_image(order_id).await
    }

    /// Places a new order from the checkout flow.
    ///
    /// A checkout order that does not say otherwise starts as `Verification Needed` / `Processing`, dated now.
    /// Creating an order never touches inventory, even when it is created as `Approved`.
    pub async fn create_order(&self, mut order: NewOrder) -> Result<Order, OrderFlowError> {
        order.payment_status.get_or_insert(PaymentStatus::VerificationNeeded);
        order.order_status.get_or_insert(OrderStatus::Processing);
        order.order_date.get_or_insert_with(Utc::now);
        let order = self.db.insert_order(order).await?;
        info!("🔄️📦️ Order #{} placed by user #{}. Payment: {}", order.id, order.user_id, order.payment_status);
        Ok(order)
    }

    /// Changes the payment and/or order status. Only the statuses supplied are touched.
    pub async fn update_status(
        &self,
        order_id: i64,
        payment_status: Option<PaymentStatus>,
        order_status: Option<OrderStatus>,
    ) -> Result<Option<OrderUpdateOutcome>, OrderFlowError> {
        self.apply_changes(order_id, OrderChanges::statuses(payment_status, order_status)).await
    }

    /// Overwrites the order's references and amount, and whichever of the statuses, date and receipt are supplied.
    ///
    /// If the edit approves the payment, the stock is taken from the merchandise the order referenced *before* the
    /// edit.
    pub async fn edit_order(&self, order_id: i64, edit: OrderEdit) -> Result<Option<OrderUpdateOutcome>, OrderFlowError> {
        self.apply_changes(order_id, edit.into()).await
    }

    /// Stores a payment receipt, replacing any earlier one, and puts the order back into `Verification Needed`
    /// whatever its payment status was.
    pub async fn upload_receipt(
        &self,
        order_id: i64,
        image: Vec<u8>,
    ) -> Result<Option<OrderUpdateOutcome>, OrderFlowError> {
        debug!("🔄️🧾️ Receipt of {} bytes received for order #{order_id}", image.len());
        let changes = OrderChanges {
            receipt_image: Some(image),
            payment_status: Some(PaymentStatus::VerificationNeeded),
            ..Default::default()
        };
        self.apply_changes(order_id, changes).await
    }

    pub async fn delete_order(&self, order_id: i64) -> Result<bool, OrderFlowError> {
        let deleted = self.db.delete_order(order_id).await?;
        if deleted {
            info!("🔄️📦️ Order #{order_id} deleted");
        }
        Ok(deleted)
    }

    async fn apply_changes(
        &self,
        order_id: i64,
        changes: OrderChanges,
    ) -> Result<Option<OrderUpdateOutcome>, OrderFlowError> {
        let update = match self.db.update_order(order_id, changes).await? {
            Some(u) => u,
            None => {
                debug!("🔄️📦️ Order #{order_id} does not exist");
                return Ok(None);
            },
        };
        let inventory = match update.approval {
            Some(approval) => self.adjust_inventory(order_id, approval).await,
            None => InventoryAdjustment::NotRequired,
        };
        Ok(Some(OrderUpdateOutcome { order: update.order, inventory }))
    }

    /// Takes one unit of stock for a newly approved order. Never fails: errors are logged and reported in the
    /// returned adjustment.
    async fn adjust_inventory(&self, order_id: i64, approval: Approval) -> InventoryAdjustment {
        let Some(merchandise_id) = approval.merchandise_id else {
            debug!("🔄️✅️ Order #{order_id} approved. It is not a merchandise order, so inventory is unchanged");
            return InventoryAdjustment::NotRequired;
        };
        match self.db.decrement_stock(merchandise_id).await {
            Ok(Some(remaining)) => {
                info!(
                    "🔄️✅️ Order #{order_id} approved. Stock for merchandise #{merchandise_id} reduced to {remaining}"
                );
                InventoryAdjustment::Decremented { merchandise_id, remaining }
            },
            Ok(None) => {
                warn!(
                    "🔄️✅️ Order #{order_id} approved, but merchandise #{merchandise_id} is out of stock or no longer \
                     exists. Stock unchanged"
                );
                InventoryAdjustment::Unchanged { merchandise_id }
            },
            Err(e) => {
                error!(
                    "🔄️✅️ Order #{order_id} approved, but updating the stock for merchandise #{merchandise_id} \
                     failed. {e}"
                );
                InventoryAdjustment::Failed { merchandise_id }
            },
        }
    }
}
