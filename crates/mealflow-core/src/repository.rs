//! # Order Repository Port
//!
//! The persistence contract consumed by the service layer. The production
//! implementation lives in `mealflow-db`; tests supply an in-memory double
//! with the same semantics.
//!
//! ## Contract Highlights
//! - `create` assigns the opaque id and enforces the unique index on
//!   `order_number`; a duplicate surfaces as
//!   [`RepoError::UniqueViolation`] so the caller can regenerate and
//!   retry.
//! - `update` is a compare-and-set: the write succeeds only when the
//!   stored `revision` still matches `expected_revision`, otherwise
//!   [`RepoError::Conflict`]. This is how concurrent status updates lose
//!   cleanly instead of clobbering each other.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{Order, OrderFilter, Page};

// =============================================================================
// Repository Error
// =============================================================================

/// Errors surfaced by [`OrderRepository`] implementations.
#[derive(Debug, Error)]
pub enum RepoError {
    /// No row for the id.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A unique index rejected the write. `field` names the index column
    /// (for order creation, `order_number`).
    #[error("duplicate value for unique field {field}")]
    UniqueViolation { field: String },

    /// A conditional write found the row changed since it was read.
    #[error("concurrent update detected for order {id}")]
    Conflict { id: String },

    /// The storage engine itself failed (connection, pool, disk).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl RepoError {
    /// Creates a NotFound error for a given entity type and id.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        RepoError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Whether this is the one retriable creation failure: a unique
    /// violation on the order-number index.
    pub fn is_order_number_collision(&self) -> bool {
        matches!(self, RepoError::UniqueViolation { field } if field.contains("order_number"))
    }
}

// =============================================================================
// Repository Port
// =============================================================================

/// Persistence port for the order aggregate.
///
/// The aggregate is exclusively owned by the repository between calls:
/// callers read, mutate in memory through aggregate methods, and write
/// back conditionally. No implementation caches orders across requests.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists a new order, assigning its repository id, and returns the
    /// stored row. Rejects a duplicate `order_number` with
    /// [`RepoError::UniqueViolation`].
    async fn create(&self, order: &Order) -> Result<Order, RepoError>;

    /// Fetches one order by repository id.
    async fn find_by_id(&self, id: &str) -> Result<Order, RepoError>;

    /// Fetches a filtered page of orders, newest first, along with the
    /// total match count (for pagination UIs).
    async fn find(&self, filter: &OrderFilter, page: Page) -> Result<(Vec<Order>, u64), RepoError>;

    /// Conditionally replaces the stored order: succeeds only when the
    /// stored `revision` equals `expected_revision`, bumping it by one.
    /// Returns the stored row.
    async fn update(
        &self,
        id: &str,
        expected_revision: i64,
        order: &Order,
    ) -> Result<Order, RepoError>;
}

// =============================================================================
// Unit Tests
// =============================================================================
