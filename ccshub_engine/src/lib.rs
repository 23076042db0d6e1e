//! ccsHub engine
//!
//! This library holds the storage and workflow logic behind the ccsHub API: user and admin accounts, the
//! merchandise and event catalogues, and orders.
//!
//! The library is divided into three main sections:
//! 1. The storage contracts ([`mod@traits`]) and a SQLite backend that implements them ([`SqliteDatabase`]). The
//!    data types stored by the backend are defined in [`mod@db_types`] and are public.
//! 2. The engine API ([`mod@api`]). This provides the public-facing functionality. The HTTP server only ever talks to
//!    these API objects, never to the backend directly.
//! 3. The order workflow in [`OrderFlowApi`], which owns the rule that approving a merchandise order takes exactly one
//!    unit out of stock.
pub mod api;
pub mod db_types;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "test_utils")]
pub mod test_utils;

pub use api::{
    accounts_api::AccountApi,
    admin_api::AdminApi,
    catalog_api::{EventApi, MerchandiseApi},
    order_flow_api::OrderFlowApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    AccountApiError,
    AccountManagement,
    AdminManagement,
    CatalogApiError,
    EventManagement,
    MerchandiseManagement,
    OrderFlowError,
    OrderManagement,
};
