use thiserror::Error;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The store could not carry out the operation.
    ///
    /// Raised by the in-memory store when a failure has been injected.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A write referenced a row that doesn't exist.
    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl StoreError {
    /// Returns true if this error is a transient conflict that the caller may
    /// retry: serialization failures and detected deadlocks.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Database(sqlx::Error::Database(db_err)) => {
                matches!(db_err.code().as_deref(), Some("40001") | Some("40P01"))
            }
            StoreError::Database(sqlx::Error::PoolTimedOut) => true,
            StoreError::Unavailable(_) => true,
            _ => false,
        }
    }

    /// Returns true if a write was refused because it referenced a missing
    /// row or broke a check, such as a line naming an unknown item.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            StoreError::Constraint(_) => true,
            // SQLSTATE class 23: integrity constraint violation
            StoreError::Database(sqlx::Error::Database(db_err)) => db_err
                .code()
                .is_some_and(|code| code.starts_with("23")),
            _ => false,
        }
    }
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_is_retryable() {
        assert!(StoreError::Unavailable("down".to_string()).is_retryable());
    }

    #[test]
    fn unavailable_message() {
        let err = StoreError::Unavailable("injected failure".to_string());
        assert_eq!(err.to_string(), "Store unavailable: injected failure");
    }

    #[test]
    fn constraint_is_not_retryable() {
        let err = StoreError::Constraint("missing item".to_string());
        assert!(!err.is_retryable());
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn unavailable_is_not_a_constraint_violation() {
        assert!(!StoreError::Unavailable("down".to_string()).is_constraint_violation());
    }

    #[test]
    fn row_not_found_is_not_retryable() {
        assert!(!StoreError::Database(sqlx::Error::RowNotFound).is_retryable());
    }
}
