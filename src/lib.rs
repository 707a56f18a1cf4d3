//! # Lodgebook - listing persistence engine
//!
//! Persists accounts, regions, locations, listings, reviews and amenities
//! behind one storage contract with two interchangeable backends:
//! - a whole-store JSON snapshot file that resolves relationships by scanning
//! - a SQLite database with declared foreign keys, cascades and a join table
//!
//! Both backends are driven by the same relationship schema, so cascades and
//! associations behave identically whichever one is selected at startup.

pub mod kind;
pub mod key;
pub mod entity;
pub mod relation;
pub mod storage;
pub mod config;
pub mod params;
pub mod ui;

// Re-exports for convenient access
pub use kind::EntityKind;
pub use key::LookupKey;
pub use entity::{Account, Amenity, Attributes, Entity, EntityData, Listing, Location, Region, Review, Scalar};
pub use relation::Relation;
pub use storage::{Backend, EntityMap, FileStore, SqliteStore, Storage, UnitOfWork};
pub use config::{BackendKind, StorageConfig};

/// Result type alias for Lodgebook operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Lodgebook operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid attribute: {0}")]
    InvalidAttribute(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::ConstraintViolation) => Error::IntegrityViolation(err.to_string()),
            _ => Error::Persistence(err.to_string()),
        }
    }
}
