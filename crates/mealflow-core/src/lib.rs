//! # mealflow-core: Pure Business Logic for the Mealflow Order System
//!
//! This crate is the heart of the order-management core. It holds the
//! invariants that must never break: money that reconciles, a lifecycle
//! that only moves along guarded edges, and feedback that is recorded
//! exactly once.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mealflow Data Flow                               │
//! │                                                                         │
//! │  HTTP edge (separate deployment)                                        │
//! │       │ checkout payload                                                │
//! │       ▼                                                                 │
//! │  mealflow-service (OrderService)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               ★ mealflow-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌─────────────┐  ┌──────────┐ │   │
//! │  │   │   money   │  │   order   │  │ order_number│  │validation│ │   │
//! │  │   │   Money   │  │ aggregate │  │  generator  │  │  checks  │ │   │
//! │  │   │  Charges  │  │ lifecycle │  │             │  │          │ │   │
//! │  │   └───────────┘  └───────────┘  └─────────────┘  └──────────┘ │   │
//! │  │                                                                 │   │
//! │  │   repository ── the OrderRepository port (implemented below)   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  mealflow-db (SQLite behind the port)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Order, OrderItem, status enums, filters)
//! - [`money`] - Money type with integer arithmetic and total reconciliation
//! - [`order`] - Aggregate construction, validation, and lifecycle methods
//! - [`order_number`] - Human-readable order-number generation
//! - [`repository`] - The OrderRepository port and its error kinds
//! - [`error`] - Domain error types
//! - [`validation`] - Field-attributed input checks
//!
//! ## Design Principles
//!
//! 1. **Integer Money**: all monetary values are cents (i64), never floats
//! 2. **Explicit Errors**: typed errors, never strings or panics
//! 3. **Domain-owned timestamps**: delivered/cancelled stamps are set by
//!    aggregate methods, not by persistence hooks

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod order;
pub mod order_number;
pub mod repository;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{compute_total, Charges, Money};
pub use order::NewOrder;
pub use order_number::{OrderNumberGenerator, ORDER_NUMBER_PREFIX};
pub use repository::{OrderRepository, RepoError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items on a single order.
///
/// Keeps runaway carts out of the kitchen; large catering orders go
/// through a different channel.
pub const MAX_ORDER_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// Guards against fat-fingered quantities (999 instead of 9).
pub const MAX_ITEM_QUANTITY: i64 = 99;

/// How far (in cents) a client-computed total may drift from the server
/// figure before the disagreement is logged. One cent absorbs honest
/// client-side rounding differences.
pub const TOTAL_DRIFT_TOLERANCE_CENTS: i64 = 1;
