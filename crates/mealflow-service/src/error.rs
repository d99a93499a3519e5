//! # Service Error Type
//!
//! The caller-facing error taxonomy of the order core.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Order Core                         │
//! │                                                                         │
//! │  ValidationError ──┐                                                    │
//! │  CoreError ────────┤                                                    │
//! │  RepoError ────────┼──► ServiceError ──► transport layer (HTTP codes)  │
//! │  AuthError ────────┤                                                    │
//! │  CatalogError ─────┘                                                    │
//! │                                                                         │
//! │  Retry policy: only order-number unique violations are retried (by     │
//! │  the creation loop) and only conditional-write conflicts are re-read   │
//! │  (by the mutation loop). Everything else propagates as-is.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::auth::AuthError;
use crate::catalog::CatalogError;
use mealflow_core::{CoreError, OrderStatus, RepoError, ValidationError};

// =============================================================================
// Service Error
// =============================================================================

/// Errors returned by [`crate::OrderService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing input, attributed to a field.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The status state machine rejected the move. Carries both states so
    /// the caller can reconcile its view.
    #[error("order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The operation is not available in the order's current state
    /// (rating an undelivered order, repricing into the negative).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The actor may not touch this order.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// No such entity.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A concurrent writer won, or a unique constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The order-number retry budget ran out.
    #[error("could not allocate a unique order number after {attempts} attempts")]
    ResourceExhausted { attempts: u32 },

    /// A collaborator (authorizer, catalog, storage engine) is down.
    #[error("dependency failure: {0}")]
    DependencyFailure(String),
}

impl ServiceError {
    /// Creates a PermissionDenied error.
    pub fn permission_denied(reason: impl Into<String>) -> Self {
        ServiceError::PermissionDenied(reason.into())
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidTransition { from, to } => {
                ServiceError::InvalidTransition { from, to }
            }
            CoreError::NotDelivered { .. } | CoreError::AlreadyRated => {
                ServiceError::InvalidOperation(err.to_string())
            }
            CoreError::NegativeTotal { .. } => ServiceError::InvalidOperation(err.to_string()),
            CoreError::Validation(v) => ServiceError::Validation(v),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
            RepoError::UniqueViolation { .. } | RepoError::Conflict { .. } => {
                ServiceError::Conflict(err.to_string())
            }
            RepoError::Unavailable(msg) => ServiceError::DependencyFailure(msg),
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredential => ServiceError::permission_denied(err.to_string()),
            AuthError::Unavailable(msg) => ServiceError::DependencyFailure(msg),
        }
    }
}

impl From<CatalogError> for ServiceError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::RestaurantNotFound(id) => ServiceError::NotFound {
                entity: "Restaurant".to_string(),
                id,
            },
            CatalogError::Unavailable(msg) => ServiceError::DependencyFailure(msg),
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Unit Tests
// =============================================================================
