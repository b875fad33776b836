//! # Bill Tracker - personal expense store
//!
//! Bills are tied to a shop and a usage, and every usage belongs to a
//! spending category. All of it lives in one embedded SQLite file.
//!
//! Bill Tracker provides:
//! - A `BillStore` facade that owns the connection and the schema
//! - Validated, parameter-bound insert operations for every entity
//! - Lookups resolving identifiers back to human-readable names
//! - TOML configuration for the database and backup locations

pub mod model;
pub mod storage;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use model::{Bill, BillDetails, Category, RowId, Shop, Usage, UNSET_ID};
pub use storage::{BillStore, DbStats};

use std::path::PathBuf;

/// Result type alias for Bill Tracker operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Bill Tracker operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Unknown {entity} id: {id}")]
    NotFound { entity: &'static str, id: RowId },

    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Could not open database '{}': {source}", .path.display())]
    Connection {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Database is not open")]
    NotConnected,

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for input rejected before the database was touched
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// True when a lookup referenced an id the store never issued
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// True when the engine rejected a mutation
    pub fn is_constraint(&self) -> bool {
        matches!(self, Error::Constraint(_))
    }
}
