//! # Repository Implementations
//!
//! SQLite-backed implementations of the persistence ports defined in
//! `mealflow-core`.

pub mod order;

pub use order::SqliteOrderRepository;
