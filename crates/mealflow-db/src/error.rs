//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  RepoError (mealflow-core port) ← What the service layer sees          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use mealflow_core::RepoError;
use thiserror::Error;

/// Database operation errors.
///
/// These wrap sqlx errors and provide the categorization the repository
/// port needs (is this a unique violation? a missing row? the engine
/// falling over?).
#[derive(Debug, Error)]
pub enum DbError {
    /// No row matched the lookup.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A unique index rejected the write. For orders this is almost
    /// always `orders.order_number`, the collision surface of checkout.
    #[error("duplicate {field}")]
    UniqueViolation { field: String },

    /// A referenced row does not exist (order items pointing at a
    /// missing order).
    #[error("foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The pool could not be built or the file could not be opened.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// A migration could not be applied.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// The statement itself failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Every pooled connection is in use.
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// Anything sqlx surfaces that has no mapping above.
    #[error("internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Shorthand for a missing-row error.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Categorizes a SQLite constraint failure by its message text.
///
/// SQLite reports constraint violations as plain strings:
/// `UNIQUE constraint failed: orders.order_number` and
/// `FOREIGN KEY constraint failed`. The unique case keeps the
/// `<table>.<column>` tail so the repository can tell an order-number
/// collision apart from any other index.
fn categorize_constraint(msg: &str) -> Option<DbError> {
    if let Some(tail) = msg.strip_prefix("UNIQUE constraint failed: ") {
        return Some(DbError::UniqueViolation {
            field: tail.to_string(),
        });
    }

    if msg.contains("UNIQUE constraint failed") {
        return Some(DbError::UniqueViolation {
            field: "unknown".to_string(),
        });
    }

    if msg.contains("FOREIGN KEY constraint failed") {
        return Some(DbError::ForeignKeyViolation {
            message: msg.to_string(),
        });
    }

    None
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                categorize_constraint(msg).unwrap_or_else(|| DbError::QueryFailed(msg.to_string()))
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Lift database errors into the repository port's error kinds.
impl From<DbError> for RepoError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => RepoError::NotFound { entity, id },
            DbError::UniqueViolation { field } => RepoError::UniqueViolation { field },
            other => RepoError::Unavailable(other.to_string()),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_messages_are_categorized() {
        let err = categorize_constraint("UNIQUE constraint failed: orders.order_number").unwrap();
        assert!(matches!(
            err,
            DbError::UniqueViolation { ref field } if field == "orders.order_number"
        ));

        let err = categorize_constraint("FOREIGN KEY constraint failed").unwrap();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        assert!(categorize_constraint("no such table: orders").is_none());
    }

    #[test]
    fn test_unique_violation_lifts_to_repo_error_with_field() {
        let db_err = DbError::UniqueViolation {
            field: "orders.order_number".to_string(),
        };

        let repo_err: RepoError = db_err.into();
        assert!(repo_err.is_order_number_collision());
    }

    #[test]
    fn test_engine_failures_lift_to_unavailable() {
        let repo_err: RepoError = DbError::PoolExhausted.into();
        assert!(matches!(repo_err, RepoError::Unavailable(_)));
    }
}
