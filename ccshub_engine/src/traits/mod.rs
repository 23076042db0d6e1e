//! # Storage backend contracts
//!
//! This module defines the behaviour a storage backend must expose to support the ccsHub API. Each concern gets its
//! own trait so that the HTTP layer (and tests) only depend on what they use.
//!
//! * [`AccountManagement`] stores user accounts, including the lazy lookup-or-create used by external logins.
//! * [`AdminManagement`] stores administrator accounts.
//! * [`MerchandiseManagement`] and [`EventManagement`] store the catalogue. Merchandise also owns the atomic
//!   stock decrement used by the order workflow.
//! * [`OrderManagement`] stores orders and applies order changes with the guarded `Approved` transition.
mod account_management;
mod admin_management;
mod catalog_management;
mod order_management;

pub use account_management::{AccountApiError, AccountManagement};
pub use admin_management::AdminManagement;
pub use catalog_management::{CatalogApiError, EventManagement, MerchandiseManagement};
pub use order_management::{OrderFlowError, OrderManagement};
