//! The public-facing ccsHub engine API.
//!
//! Each API object wraps a storage backend and exposes the operations the HTTP layer needs. They are generic over
//! the backend so that the server can be tested against mocks.
pub mod accounts_api;
pub mod admin_api;
pub mod catalog_api;
pub mod order_flow_api;
