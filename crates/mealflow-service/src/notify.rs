//! # Notification Dispatch
//!
//! The `Notifier` collaborator and the fire-and-forget dispatch helper.
//!
//! ## Reliability Tier
//! Order creation and notification delivery sit on different reliability
//! tiers: a persisted order with no confirmation email is an
//! inconvenience, a confirmation email for an unpersisted order is a lie.
//! Dispatch therefore happens *after* the order is stored, on spawned
//! tasks, and a failed notification is logged, never propagated into the
//! request result.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use mealflow_core::Order;

// =============================================================================
// Notifier Port
// =============================================================================

/// Error from a notification channel.
#[derive(Debug, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Sends order notifications.
///
/// Both methods must be safe to call more than once for the same order;
/// retried checkouts may dispatch twice.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Confirmation to the customer's contact email.
    async fn notify_order_confirmed(&self, order: &Order) -> Result<(), NotifyError>;

    /// Alert to the platform's order desk.
    async fn notify_admin(&self, order: &Order) -> Result<(), NotifyError>;
}

// =============================================================================
// Log Notifier
// =============================================================================

/// Degraded notifier that writes the payload to the log instead of a
/// mail queue. Useful for development and for deployments that wire the
/// real mailer in later.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_order_confirmed(&self, order: &Order) -> Result<(), NotifyError> {
        debug!(
            order_number = %order.order_number,
            email = %order.user_email,
            payload = %serde_json::to_string(order).unwrap_or_default(),
            "order confirmation (log only)"
        );
        Ok(())
    }

    async fn notify_admin(&self, order: &Order) -> Result<(), NotifyError> {
        debug!(
            order_number = %order.order_number,
            restaurant = %order.restaurant_name,
            total = %order.total(),
            "admin order alert (log only)"
        );
        Ok(())
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Fires both notifications for a freshly stored order on background
/// tasks.
///
/// The two channels fail independently: a dead customer mailbox does not
/// stop the admin alert, and vice versa. Neither blocks the caller.
pub(crate) fn dispatch_order_notifications(notifier: Arc<dyn Notifier>, order: Order) {
    let customer_notifier = Arc::clone(&notifier);
    let customer_order = order.clone();
    tokio::spawn(async move {
        if let Err(err) = customer_notifier.notify_order_confirmed(&customer_order).await {
            warn!(
                order_number = %customer_order.order_number,
                email = %customer_order.user_email,
                %err,
                "customer confirmation failed"
            );
        }
    });

    tokio::spawn(async move {
        if let Err(err) = notifier.notify_admin(&order).await {
            warn!(order_number = %order.order_number, %err, "admin alert failed");
        }
    });
}
