//! # Identity Resolution
//!
//! The `Authorizer` collaborator and the resolved `Actor` it produces.
//! Credential verification (sessions, tokens, password hashing) lives in
//! the platform's auth deployment; the order core only needs to know who
//! is calling and what they may touch.

use async_trait::async_trait;
use thiserror::Error;

use mealflow_core::Order;

// =============================================================================
// Credential & Actor
// =============================================================================

/// What the caller presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// An opaque session or bearer token, resolved by the Authorizer.
    Token(String),
    /// No credential: guest checkout.
    Anonymous,
}

/// A resolved caller identity.
#[derive(Debug, Clone, Default)]
pub struct Actor {
    /// Account id; `None` for guests.
    pub id: Option<String>,
    /// Account email, when the account has one.
    pub email: Option<String>,
    /// Platform administrators can see and manage every order.
    pub is_admin: bool,
    /// Restaurant operators carry the restaurant they manage and may move
    /// that restaurant's orders through the kitchen lifecycle.
    pub restaurant_id: Option<String>,
}

impl Actor {
    /// The synthetic identity for guest checkout.
    ///
    /// Carries no account data at all; contact details must come from the
    /// checkout payload, never fabricated here.
    pub fn guest() -> Self {
        Actor::default()
    }

    /// Whether this actor placed the order.
    ///
    /// Guest orders have no owner; nobody but admins can read them back.
    pub fn owns(&self, order: &Order) -> bool {
        match (&self.id, &order.user_id) {
            (Some(actor_id), Some(owner_id)) => actor_id == owner_id,
            _ => false,
        }
    }

    /// Whether this actor operates the given restaurant.
    pub fn manages_restaurant(&self, restaurant_id: &str) -> bool {
        self.restaurant_id.as_deref() == Some(restaurant_id)
    }
}

// =============================================================================
// Authorizer Port
// =============================================================================

/// Errors from the identity collaborator.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The credential did not resolve to an identity.
    #[error("credential rejected")]
    InvalidCredential,

    /// The auth service itself is unreachable.
    #[error("authorizer unavailable: {0}")]
    Unavailable(String),
}

/// Resolves credentials to actors.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Resolves the caller's identity. An [`Credential::Anonymous`]
    /// credential resolves to [`Actor::guest`] rather than an error.
    async fn resolve(&self, credential: &Credential) -> Result<Actor, AuthError>;
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_owns_nothing() {
        let guest = Actor::guest();
        assert!(guest.id.is_none());
        assert!(!guest.is_admin);
    }

    #[test]
    fn test_restaurant_management() {
        let operator = Actor {
            restaurant_id: Some("rest-1".to_string()),
            ..Actor::default()
        };

        assert!(operator.manages_restaurant("rest-1"));
        assert!(!operator.manages_restaurant("rest-2"));
        assert!(!Actor::guest().manages_restaurant("rest-1"));
    }
}
