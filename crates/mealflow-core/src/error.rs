//! # Error Types
//!
//! Domain-specific error types for mealflow-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  mealflow-core errors (this file)                                      │
//! │  ├── CoreError        - Aggregate invariant / lifecycle violations     │
//! │  └── ValidationError  - Field-attributed input failures                │
//! │                                                                         │
//! │  mealflow-core port errors (repository.rs)                            │
//! │  └── RepoError        - NotFound / UniqueViolation / Conflict          │
//! │                                                                         │
//! │  mealflow-service errors (separate crate)                              │
//! │  └── ServiceError     - Full caller-facing taxonomy                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → caller             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (status names, cent amounts)
//! 3. Errors are enum variants, never String
//! 4. Transition failures carry both the current and the rejected state so
//!    the caller can reconcile

use thiserror::Error;

use crate::types::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Aggregate-level business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The status state machine has no edge from `from` to `to`.
    ///
    /// ## When This Occurs
    /// - Moving a delivered order back to `preparing`
    /// - Cancelling an order that is already out for delivery
    #[error("order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Rating attempted before the order was delivered.
    #[error("order is {status}, only delivered orders can be rated")]
    NotDelivered { status: OrderStatus },

    /// Rating attempted a second time.
    #[error("order has already been rated")]
    AlreadyRated,

    /// The charge inputs drive the grand total below zero.
    ///
    /// A negative total is a pricing-input fault (discount larger than the
    /// order, bogus fee data) and is surfaced instead of being clamped.
    #[error("order total would be negative ({cents} cents)")]
    NegativeTotal { cents: i64 },

    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Field-attributed so the caller can point at the offending input.
/// Produced by the checks in [`crate::validation`] before any business
/// logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// A required collection has no elements.
    #[error("{field} must not be empty")]
    Empty { field: String },

    /// Value must be at least 1.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value is not in the allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Creates a Required error for the given field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
