//! Storage Layer - SQLite-backed persistence
//!
//! The bill store is the only reader and writer of the database file:
//! - category(id, name)
//! - usage(id, categoryId -> category, name)
//! - shops(id, name)
//! - bills(id, date, price, shopId -> shops, usageId -> usage, filename)

pub mod schema;
pub mod sqlite;

pub use sqlite::{BillStore, DbStats};
