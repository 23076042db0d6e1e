//! SQLite storage backend for ccsHub.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
