//! Error types for the shared database layer
//!
//! Every fallible operation in [`crate::database`] maps its sqlx failure
//! into one of these variants so callers can tell connection problems
//! apart from query and migration failures.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Failure of a database operation
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Could not establish a connection to the database
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// A query failed to execute
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Applying migrations failed
    #[error("Database migration error: {0}")]
    Migration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_errors_carry_the_underlying_message() {
        let err = DatabaseError::Migration("version 2 was previously applied".to_string());

        assert_eq!(
            err.to_string(),
            "Database migration error: version 2 was previously applied"
        );
    }
}
