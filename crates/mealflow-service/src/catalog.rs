//! # Catalog / Pricing Source
//!
//! The collaborator that supplies authoritative pricing parameters for a
//! restaurant. Menu CRUD lives in the catalog deployment; the order core
//! only pulls the few figures checkout needs.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

// =============================================================================
// Restaurant Profile
// =============================================================================

/// Delivery parameters for one restaurant, as priced by the catalog.
#[derive(Debug, Clone, Copy)]
pub struct RestaurantProfile {
    /// Base delivery fee in cents, applied to delivery orders.
    pub delivery_fee_cents: i64,
    /// Sales tax rate in basis points, applied to the subtotal.
    pub tax_rate_bps: u32,
    /// Upper bound of the restaurant's delivery window, in minutes.
    pub max_delivery_minutes: i64,
}

impl RestaurantProfile {
    /// Projects the delivery estimate from the order time.
    pub fn estimated_delivery(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        from + Duration::minutes(self.max_delivery_minutes)
    }
}

// =============================================================================
// Pricing Source Port
// =============================================================================

/// Errors from the catalog collaborator.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The restaurant id does not exist in the catalog.
    #[error("restaurant not found: {0}")]
    RestaurantNotFound(String),

    /// The catalog service is unreachable.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// Supplies restaurant pricing profiles.
#[async_trait]
pub trait PricingSource: Send + Sync {
    /// Fetches the pricing profile for a restaurant.
    async fn restaurant_profile(&self, restaurant_id: &str) -> Result<RestaurantProfile, CatalogError>;
}

// =============================================================================
// Unit Tests
// =============================================================================
