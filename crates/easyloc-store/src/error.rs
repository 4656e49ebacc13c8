//! Error types for the EasyLoc storage layer.
//!
//! Absence of an entity is never an error here: lookups return `Option` and
//! update/delete return `bool`, so callers can branch without special
//! control flow. The variants below cover everything else, and in
//! particular keep foreign-key failures and transport failures distinct —
//! neither may be collapsed into a `false` or a "not found".

use easyloc_core::ArgumentError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not be reached or the exchange failed
    /// mid-flight. Distinct from "entity absent".
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A relational constraint rejected the write, e.g. a billing insert
    /// referencing a missing contract, or a contract delete blocked by
    /// dependent billing rows.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Encoding or decoding a stored value failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A caller-supplied argument was rejected before any storage access.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] ArgumentError),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) => {
                if matches!(db.kind(), sqlx::error::ErrorKind::ForeignKeyViolation) {
                    Self::ConstraintViolation(db.to_string())
                } else {
                    Self::Unavailable(db.to_string())
                }
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                Self::Serialization(err.to_string())
            }
            other => Self::Unavailable(other.to_string()),
        }
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::ErrorKind;

        match err.kind.as_ref() {
            ErrorKind::BsonSerialization(e) => Self::Serialization(e.to_string()),
            ErrorKind::BsonDeserialization(e) => Self::Serialization(e.to_string()),
            _ => Self::Unavailable(err.to_string()),
        }
    }
}
