//! # mealflow-service: Order Orchestration for Mealflow
//!
//! The primary entry point of the order-management core. `OrderService`
//! drives checkout, reads, lifecycle transitions, cancellation, and
//! rating, delegating invariants to the aggregate in `mealflow-core` and
//! persistence to whatever implements the `OrderRepository` port.
//!
//! ## Collaborators
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        OrderService                                     │
//! │                                                                         │
//! │   Arc<dyn OrderRepository>  ─ storage (mealflow-db in production)      │
//! │   Arc<dyn Authorizer>       ─ identity resolution, guest checkout      │
//! │   Arc<dyn PricingSource>    ─ restaurant fees, tax rate, ETA window    │
//! │   Arc<dyn Notifier>         ─ fire-and-forget confirmations            │
//! │   OrderPolicy               ─ retry budgets, cancellation window       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wiring Example
//! ```rust,ignore
//! use std::sync::Arc;
//! use mealflow_db::{Database, DbConfig};
//! use mealflow_service::{LogNotifier, OrderPolicy, OrderService};
//!
//! let db = Database::new(DbConfig::new("orders.db")).await?;
//! let service = OrderService::new(
//!     Arc::new(db.orders()),
//!     Arc::new(LogNotifier),
//!     Arc::new(my_authorizer),
//!     Arc::new(my_catalog),
//! )
//! .with_policy(OrderPolicy::default().allow_cancel_while_preparing(true));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod notify;
pub mod order_service;

// =============================================================================
// Re-exports
// =============================================================================

pub use auth::{Actor, AuthError, Authorizer, Credential};
pub use catalog::{CatalogError, PricingSource, RestaurantProfile};
pub use config::OrderPolicy;
pub use error::{ServiceError, ServiceResult};
pub use notify::{LogNotifier, Notifier, NotifyError};
pub use order_service::{
    AddressRequest, CartItemRequest, ContactRequest, CreateOrderRequest, OrderService, PlacedOrder,
};
