//! Store Errors
//!
//! Error types for the persistence components.

/// Errors raised by the store components
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// A stored row no longer satisfies the domain rules
    #[error("Invalid stored data: {0}")]
    InvalidRow(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Classify a write failure: unique violations become `Duplicate`
    /// carrying `what`, everything else stays a database error.
    pub fn from_write(err: sqlx::Error, what: impl FnOnce(Option<&str>) -> String) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Duplicate(what(db_err.constraint()));
            }
        }
        StoreError::Database(err)
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
