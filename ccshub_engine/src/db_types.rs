use std::{convert::Infallible, fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

//--------------------------------------        Role         ---------------------------------------------------------
/// The roles that the API understands. Tokens carry role *names*; anything that is not recognised here is still
/// carried through to the identity, but it grants nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, Error)]
#[error("Unknown role: {0}")]
pub struct RoleParseError(String);

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "USER"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    /// Role names are matched case-insensitively, and the `ROLE_` authority prefix is accepted, so `ROLE_ADMIN`,
    /// `admin` and `ADMIN` all parse as [`Role::Admin`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_uppercase();
        let name = name.strip_prefix("ROLE_").unwrap_or(name.as_str());
        match name {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(RoleParseError(s.to_string())),
        }
    }
}

//--------------------------------------   PaymentStatus     ---------------------------------------------------------
/// The payment field of an order. The set of values is open: the known values are given variants, and anything else
/// an admin chooses to write is kept verbatim in [`PaymentStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    Pending,
    VerificationNeeded,
    Approved,
    Rejected,
    Other(String),
}

impl PaymentStatus {
    pub fn is_approved(&self) -> bool {
        matches!(self, PaymentStatus::Approved)
    }

    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::VerificationNeeded => "Verification Needed",
            PaymentStatus::Approved => "Approved",
            PaymentStatus::Rejected => "Rejected",
            PaymentStatus::Other(s) => s.as_str(),
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Pending" => PaymentStatus::Pending,
            "Verification Needed" => PaymentStatus::VerificationNeeded,
            "Approved" => PaymentStatus::Approved,
            "Rejected" => PaymentStatus::Rejected,
            _ => PaymentStatus::Other(value),
        }
    }
}

impl From<&str> for PaymentStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<PaymentStatus> for String {
    fn from(value: PaymentStatus) -> Self {
        match value {
            PaymentStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

//--------------------------------------    OrderStatus      ---------------------------------------------------------
/// Fulfilment status of an order. Like [`PaymentStatus`], unknown values are preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Processing,
    Completed,
    Cancelled,
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Processing => "Processing",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Other(s) => s.as_str(),
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Processing" => OrderStatus::Processing,
            "Completed" => OrderStatus::Completed,
            "Cancelled" => OrderStatus::Cancelled,
            _ => OrderStatus::Other(value),
        }
    }
}

impl From<&str> for OrderStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<OrderStatus> for String {
    fn from(value: OrderStatus) -> Self {
        match value {
            OrderStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

//--------------------------------------        User         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "userId")]
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn new<S: Into<String>>(username: S, email: S, password_hash: S) -> Self {
        Self { username: username.into(), email: email.into(), password_hash: password_hash.into() }
    }
}

//--------------------------------------        Admin        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    #[serde(rename = "adminId")]
    pub id: i64,
    pub username: String,
    pub role: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Admin {
    /// The role names an admin's token carries. A blank stored role counts as `ADMIN`.
    pub fn roles(&self) -> Vec<String> {
        let role = self.role.trim();
        if role.is_empty() {
            vec![Role::Admin.to_string()]
        } else {
            vec![role.to_ascii_uppercase()]
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAdmin {
    pub username: String,
    pub role: String,
    pub password_hash: String,
}

//--------------------------------------     Merchandise     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Merchandise {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i64,
    pub has_image: bool,
}

/// Used for both creating and replacing a merchandise item. When replacing, `image: None` keeps the stored image.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewMerchandise {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i64,
    pub image: Option<Vec<u8>>,
}

//--------------------------------------        Event        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "eventId")]
    pub id: i64,
    pub title: String,
    pub description: String,
    pub location: String,
    pub event_date: NaiveDate,
    pub has_image: bool,
}

/// Used for both creating and replacing an event. When replacing, `image: None` keeps the stored image.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub location: String,
    pub event_date: NaiveDate,
    pub image: Option<Vec<u8>>,
}

//--------------------------------------        Order        ---------------------------------------------------------
/// An order row, joined with the display names of the records it references. The receipt blob itself is never
/// loaded with the order; `has_receipt` says whether one is stored.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "orderId")]
    pub id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub merchandise_id: Option<i64>,
    pub merchandise_name: Option<String>,
    pub event_id: Option<i64>,
    pub event_title: Option<String>,
    pub total_amount: f64,
    pub order_date: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub payment_status: PaymentStatus,
    #[sqlx(try_from = "String")]
    pub order_status: OrderStatus,
    pub has_receipt: bool,
}

/// A new order as the store receives it. Missing statuses are stored as `Pending` / `Processing`; a missing date
/// is stored as the current time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewOrder {
    pub user_id: i64,
    pub merchandise_id: Option<i64>,
    pub event_id: Option<i64>,
    pub total_amount: f64,
    pub order_date: Option<DateTime<Utc>>,
    pub payment_status: Option<PaymentStatus>,
    pub order_status: Option<OrderStatus>,
    pub receipt_image: Option<Vec<u8>>,
}

impl NewOrder {
    pub fn new(user_id: i64, total_amount: f64) -> Self {
        Self { user_id, total_amount, ..Default::default() }
    }

    pub fn for_merchandise(mut self, merchandise_id: i64) -> Self {
        self.merchandise_id = Some(merchandise_id);
        self
    }

    pub fn for_event(mut self, event_id: i64) -> Self {
        self.event_id = Some(event_id);
        self
    }

    pub fn with_payment_status(mut self, status: PaymentStatus) -> Self {
        self.payment_status = Some(status);
        self
    }
}

/// A set of column changes to apply to an existing order. Every `None` leaves the column untouched. The nested
/// options on the references distinguish "leave alone" (`None`) from "clear" (`Some(None)`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderChanges {
    pub user_id: Option<i64>,
    pub merchandise_id: Option<Option<i64>>,
    pub event_id: Option<Option<i64>>,
    pub total_amount: Option<f64>,
    pub order_date: Option<DateTime<Utc>>,
    pub payment_status: Option<PaymentStatus>,
    pub order_status: Option<OrderStatus>,
    pub receipt_image: Option<Vec<u8>>,
}

impl OrderChanges {
    /// A partial status change: only the supplied statuses are touched.
    pub fn statuses(payment_status: Option<PaymentStatus>, order_status: Option<OrderStatus>) -> Self {
        Self { payment_status, order_status, ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() &&
            self.merchandise_id.is_none() &&
            self.event_id.is_none() &&
            self.total_amount.is_none() &&
            self.order_date.is_none() &&
            self.payment_status.is_none() &&
            self.order_status.is_none() &&
            self.receipt_image.is_none()
    }

    /// True when these changes ask for the payment status to become `Approved`.
    pub fn approves_payment(&self) -> bool {
        self.payment_status.as_ref().map(PaymentStatus::is_approved).unwrap_or(false)
    }
}

/// A full replacement of an order's editable fields. References and the amount are always overwritten; statuses,
/// date and receipt are only overwritten when supplied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderEdit {
    pub user_id: i64,
    pub merchandise_id: Option<i64>,
    pub event_id: Option<i64>,
    pub total_amount: f64,
    pub order_date: Option<DateTime<Utc>>,
    pub payment_status: Option<PaymentStatus>,
    pub order_status: Option<OrderStatus>,
    pub receipt_image: Option<Vec<u8>>,
}

impl From<OrderEdit> for OrderChanges {
    fn from(edit: OrderEdit) -> Self {
        Self {
            user_id: Some(edit.user_id),
            merchandise_id: Some(edit.merchandise_id),
            event_id: Some(edit.event_id),
            total_amount: Some(edit.total_amount),
            order_date: edit.order_date,
            payment_status: edit.payment_status,
            order_status: edit.order_status,
            receipt_image: edit.receipt_image,
        }
    }
}

/// The result of applying [`OrderChanges`] to a stored order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderUpdate {
    pub order: Order,
    /// `Some` only when *this* update moved the payment status into `Approved`. Holds the merchandise the order
    /// referenced at that moment, if any.
    pub approval: Option<Approval>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Approval {
    pub merchandise_id: Option<i64>,
}

/// What happened to inventory as a side effect of an order update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum InventoryAdjustment {
    /// The update did not newly approve a merchandise order.
    NotRequired,
    Decremented { merchandise_id: i64, remaining: i64 },
    /// The stock was already zero (or the item no longer exists), so nothing changed.
    Unchanged { merchandise_id: i64 },
    /// The decrement itself failed. The order update still stands.
    Failed { merchandise_id: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderUpdateOutcome {
    pub order: Order,
    pub inventory: InventoryAdjustment,
}
