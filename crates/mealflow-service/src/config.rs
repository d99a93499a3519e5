//! # Order Policy
//!
//! Deployment-tunable knobs for the order service. The source platform
//! grew several competing hard-coded variants of these rules; here they
//! are one struct, configured once at wiring time.

// =============================================================================
// Policy
// =============================================================================

/// Tunable order-handling policy.
///
/// ## Example
/// ```rust
/// use mealflow_service::OrderPolicy;
///
/// let policy = OrderPolicy::default()
///     .order_number_attempts(5)
///     .allow_cancel_while_preparing(true);
/// assert_eq!(policy.order_number_attempts, 5);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct OrderPolicy {
    /// How many order numbers to try before giving up on creation.
    /// Each attempt regenerates the number; only unique-index collisions
    /// consume attempts. Default: 3
    pub order_number_attempts: u32,

    /// How many times a conditional write is retried (fresh read, re-apply,
    /// re-write) after losing a race, before surfacing a conflict.
    /// Default: 2. Zero means strict first-writer-wins.
    pub update_retry_attempts: u32,

    /// Whether customers may cancel an order the kitchen already started.
    /// Default: false (cancellation window closes at `confirmed`).
    /// Operator transitions to `cancelled` are unaffected.
    pub allow_cancel_while_preparing: bool,

    /// Platform service fee in cents, added to every order.
    /// Default: 0
    pub service_fee_cents: i64,
}

impl Default for OrderPolicy {
    fn default() -> Self {
        OrderPolicy {
            order_number_attempts: 3,
            update_retry_attempts: 2,
            allow_cancel_while_preparing: false,
            service_fee_cents: 0,
        }
    }
}

impl OrderPolicy {
    /// Sets the order-number attempt budget (minimum 1).
    pub fn order_number_attempts(mut self, attempts: u32) -> Self {
        self.order_number_attempts = attempts.max(1);
        self
    }

    /// Sets the conditional-write retry budget.
    pub fn update_retry_attempts(mut self, attempts: u32) -> Self {
        self.update_retry_attempts = attempts;
        self
    }

    /// Widens the customer cancellation window into `preparing`.
    pub fn allow_cancel_while_preparing(mut self, allow: bool) -> Self {
        self.allow_cancel_while_preparing = allow;
        self
    }

    /// Sets the platform service fee.
    pub fn service_fee_cents(mut self, cents: i64) -> Self {
        self.service_fee_cents = cents;
        self
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
