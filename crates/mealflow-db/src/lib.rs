//! # mealflow-db: Database Layer for Mealflow
//!
//! SQLite persistence for the order core, implementing the
//! `OrderRepository` port from `mealflow-core`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Mealflow Data Flow                                │
//! │                                                                         │
//! │  OrderService (mealflow-service)                                       │
//! │       │  via Arc<dyn OrderRepository>                                  │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    mealflow-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐   ┌───────────┐  │   │
//! │  │   │   Database    │    │ SqliteOrderRepo    │   │ Migrations│  │   │
//! │  │   │   (pool.rs)   │◄───│ (repository/)      │   │ (embedded)│  │   │
//! │  │   └───────────────┘    └────────────────────┘   └───────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (orders, order_items)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mealflow_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("orders.db")).await?;
//! let repo = db.orders();
//! let order = repo.find_by_id("some-id").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::order::SqliteOrderRepository;
