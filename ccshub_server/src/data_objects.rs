//! Request and response bodies. Field names are camelCase on the wire.
use std::sync::OnceLock;

use ccshub_engine::db_types::{Admin, NewOrder, OrderEdit, OrderStatus, PaymentStatus, User};
use chrono::{DateTime, NaiveDateTime, Utc};
use log::*;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::ServerError;

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
/// Browsers often send images as data URLs (`data:image/png;base64,....`). Only the part after the comma is base64.
const DATA_URL_PREFIX: &str = r"^data:[^,]*;base64,";

static EMAIL_RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
static DATA_URL_RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.get_or_init(|| Regex::new(EMAIL_PATTERN)).as_ref().map(|re| re.is_match(email)).unwrap_or(false)
}

/// Decodes a base64 image, with or without a data URL prefix.
pub fn decode_image(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let encoded = encoded.trim();
    let payload = match DATA_URL_RE.get_or_init(|| Regex::new(DATA_URL_PREFIX)).as_ref() {
        Ok(re) => re.find(encoded).map(|m| &encoded[m.end()..]).unwrap_or(encoded),
        Err(_) => encoded,
    };
    base64::decode(payload)
}

//----------------------------------------------   Auth   -------------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminLoginResponse {
    pub message: String,
    pub token: String,
    pub admin: Admin,
}

//----------------------------------------------   Admins   -----------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct AdminRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

//----------------------------------------------   Queries   ----------------------------------------------------------
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub keyword: Option<String>,
}

impl SearchParams {
    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

//----------------------------------------------   Orders   -----------------------------------------------------------
/// The body of order creation and full order edits.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub user_id: i64,
    #[serde(default)]
    pub merchandise_id: Option<i64>,
    #[serde(default)]
    pub event_id: Option<i64>,
    pub total_amount: f64,
    #[serde(default, deserialize_with = "flexible_datetime")]
    pub order_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub order_status: Option<OrderStatus>,
    #[serde(default)]
    pub receipt_image_base64: Option<String>,
}

impl OrderRequest {
    fn receipt(&self) -> Option<&str> {
        self.receipt_image_base64.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// A receipt that does not decode is dropped, and the order is still created.
    pub fn into_new_order(self) -> NewOrder {
        let receipt_image = self.receipt().and_then(|s| match decode_image(s) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("💻️ Ignoring the receipt image on a new order for user #{}. {e}", self.user_id);
                None
            },
        });
        NewOrder {
            user_id: self.user_id,
            merchandise_id: self.merchandise_id,
            event_id: self.event_id,
            total_amount: self.total_amount,
            order_date: self.order_date,
            payment_status: self.payment_status,
            order_status: self.order_status,
            receipt_image,
        }
    }

    /// A receipt that does not decode fails the whole edit.
    pub fn try_into_edit(self) -> Result<OrderEdit, ServerError> {
        let receipt_image = self
            .receipt()
            .map(decode_image)
            .transpose()
            .map_err(|e| ServerError::InvalidRequestBody(format!("Invalid receipt image. {e}")))?;
        Ok(OrderEdit {
            user_id: self.user_id,
            merchandise_id: self.merchandise_id,
            event_id: self.event_id,
            total_amount: self.total_amount,
            order_date: self.order_date,
            payment_status: self.payment_status,
            order_status: self.order_status,
            receipt_image,
        })
    }
}

/// A partial status change. Fields that are absent are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub order_status: Option<OrderStatus>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedResponse {
    pub order_id: i64,
    pub message: String,
    pub status: String,
}

impl OrderCreatedResponse {
    pub fn new(order_id: i64) -> Self {
        Self { order_id, message: "Order created successfully".into(), status: "success".into() }
    }
}

const LOCAL_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Order dates are accepted either as RFC 3339 timestamps or as zone-less local date-times
/// (`2024-10-20T09:30:00`), which are taken to be UTC.
fn flexible_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where D: Deserializer<'de> {
    let value = Option::<String>::deserialize(deserializer)?;
    let Some(s) = value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    LOCAL_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&s, fmt).ok())
        .map(|dt| Some(dt.and_utc()))
        .ok_or_else(|| serde::de::Error::custom(format!("Invalid order date '{s}'")))
}
