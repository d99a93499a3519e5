//! # Order Aggregate
//!
//! Construction, totals reconciliation, and lifecycle mutation for the
//! [`Order`] aggregate. Every invariant lives here, in the domain layer;
//! the persistence layer stores what these methods produce and never
//! recomputes anything on write.
//!
//! ## Mutation Surface
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Order Aggregate Methods                             │
//! │                                                                         │
//! │  Order::place(NewOrder)      validate → price → construct               │
//! │  order.transition_to(s)      guarded by the status table                │
//! │  order.cancel(reason, ..)    pending/confirmed only (policy-widened)    │
//! │  order.rate(stars, review)   delivered + not yet rated                  │
//! │  order.set_payment_status(s) independent payment axis, unguarded        │
//! │  order.set_*_cents(v)        charge mutators, each recomputes totals    │
//! │                                                                         │
//! │  Totals invariant, held by construction and every mutator:              │
//! │  total = subtotal + delivery_fee + tax + service_fee + tip - discount   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::{CoreError, CoreResult};
use crate::money::{compute_total, Charges, Money};
use crate::types::{
    ContactInfo, DeliveryAddress, DeliveryType, Order, OrderItem, OrderStatus, PaymentMethod,
    PaymentStatus, TaxRate,
};
use crate::validation::{
    resolve_email, validate_charge_cents, validate_contact, validate_delivery_address,
    validate_items, validate_rating, validate_restaurant,
};
use crate::TOTAL_DRIFT_TOLERANCE_CENTS;

// =============================================================================
// New Order Input
// =============================================================================

/// Everything needed to place an order, already priced by the catalog.
///
/// The service layer assembles this from the checkout request plus the
/// restaurant profile; the aggregate treats client-side totals as advisory
/// and recomputes everything.
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// Account placing the order; `None` for guest checkout.
    pub user_id: Option<String>,
    /// Account email, used when the contact block carries no email.
    pub account_email: Option<String>,

    pub restaurant_id: String,
    pub restaurant_name: String,
    pub restaurant_image: Option<String>,

    pub items: Vec<OrderItem>,

    pub delivery_type: DeliveryType,
    pub delivery_address: Option<DeliveryAddress>,
    pub contact: ContactInfo,

    pub payment_method: PaymentMethod,

    /// Restaurant tax rate, applied to the subtotal.
    pub tax_rate: TaxRate,
    /// Restaurant base delivery fee; ignored for pickup orders.
    pub delivery_fee_cents: i64,
    /// Platform service fee.
    pub service_fee_cents: i64,
    pub tip_cents: i64,
    pub discount_cents: i64,

    /// Courier estimate supplied by the catalog profile.
    pub estimated_delivery: Option<DateTime<Utc>>,

    /// Client-computed grand total, advisory only. Drift beyond the
    /// tolerance is logged and the server figure wins.
    pub client_total_cents: Option<i64>,
}

// =============================================================================
// Construction
// =============================================================================

impl Order {
    /// Validates the input and constructs a priced, unpersisted order.
    ///
    /// ## Validation Order
    /// Checks run in a fixed order and fail fast with a field-attributed
    /// error:
    /// 1. items (non-empty, quantity ≥ 1, unit price ≥ 0)
    /// 2. restaurant id and name
    /// 3. delivery address (complete, when delivery)
    /// 4. contact block, and an explicit email on the contact block or the
    ///    account (the chosen source is recorded)
    /// 5. charge amounts (non-negative)
    ///
    /// ## Pricing
    /// Line totals and the subtotal are recomputed from unit price ×
    /// quantity. Tax is `subtotal × tax_rate` rounded half-up. The
    /// delivery fee only applies to delivery orders. A grand total below
    /// zero is rejected as a pricing-input fault.
    ///
    /// `id` and `order_number` are left empty: the repository assigns the
    /// id, the service assigns (and on collision reassigns) the number.
    pub fn place(input: NewOrder) -> CoreResult<Order> {
        validate_items(&input.items)?;
        validate_restaurant(&input.restaurant_id, &input.restaurant_name)?;
        validate_delivery_address(input.delivery_type, input.delivery_address.as_ref())?;
        validate_contact(&input.contact)?;
        let (user_email, email_source) = resolve_email(
            input.contact.email.as_deref(),
            input.account_email.as_deref(),
        )?;

        validate_charge_cents("deliveryFee", input.delivery_fee_cents)?;
        validate_charge_cents("serviceFee", input.service_fee_cents)?;
        validate_charge_cents("tip", input.tip_cents)?;
        validate_charge_cents("discount", input.discount_cents)?;

        // Server-side pricing. Client line totals are discarded.
        let mut items = input.items;
        for item in &mut items {
            item.item_total_cents = item.unit_price_cents * item.quantity;
        }
        let subtotal: i64 = items.iter().map(|i| i.item_total_cents).sum();

        let delivery_fee_cents = match input.delivery_type {
            DeliveryType::Delivery => input.delivery_fee_cents,
            DeliveryType::Pickup => 0,
        };
        let tax = Money::from_cents(subtotal).apply_rate(input.tax_rate);

        let charges = Charges {
            delivery_fee: Money::from_cents(delivery_fee_cents),
            tax,
            service_fee: Money::from_cents(input.service_fee_cents),
            tip: Money::from_cents(input.tip_cents),
            discount: Money::from_cents(input.discount_cents),
        };
        let total = compute_total(Money::from_cents(subtotal), &charges)?;

        if let Some(client_total) = input.client_total_cents {
            let drift = client_total - total.cents();
            if drift.abs() > TOTAL_DRIFT_TOLERANCE_CENTS {
                warn!(
                    client_total_cents = client_total,
                    server_total_cents = total.cents(),
                    drift_cents = drift,
                    "client-supplied total disagrees with server pricing; using server figure"
                );
            }
        }

        let now = Utc::now();

        Ok(Order {
            id: String::new(),
            order_number: String::new(),
            user_id: input.user_id,
            user_email,
            email_source,
            restaurant_id: input.restaurant_id,
            restaurant_name: input.restaurant_name,
            restaurant_image: input.restaurant_image,
            items,
            delivery_type: input.delivery_type,
            delivery_address: input.delivery_address,
            contact: input.contact,
            subtotal_cents: subtotal,
            delivery_fee_cents,
            tax_cents: tax.cents(),
            service_fee_cents: input.service_fee_cents,
            tip_cents: input.tip_cents,
            discount_cents: input.discount_cents,
            total_cents: total.cents(),
            status: input.payment_method.initial_status(),
            payment_method: input.payment_method,
            payment_status: input.payment_method.initial_payment_status(),
            created_at: now,
            updated_at: now,
            estimated_delivery: input.estimated_delivery,
            delivered_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            rated: false,
            rating: None,
            review: None,
            revision: 0,
        })
    }
}

// =============================================================================
// Totals
// =============================================================================

impl Order {
    /// The current non-item charges as a bundle.
    pub fn charges(&self) -> Charges {
        Charges {
            delivery_fee: Money::from_cents(self.delivery_fee_cents),
            tax: Money::from_cents(self.tax_cents),
            service_fee: Money::from_cents(self.service_fee_cents),
            tip: Money::from_cents(self.tip_cents),
            discount: Money::from_cents(self.discount_cents),
        }
    }

    /// Recomputes `subtotal` and `total` from items and charges.
    ///
    /// Idempotent: with unchanged inputs the stored figures do not move.
    /// Fails (leaving the order untouched) if the charges drive the total
    /// negative.
    pub fn recompute_totals(&mut self) -> CoreResult<()> {
        let subtotal: i64 = self.items.iter().map(|i| i.item_total_cents).sum();
        let total = compute_total(Money::from_cents(subtotal), &self.charges())?;

        self.subtotal_cents = subtotal;
        self.total_cents = total.cents();
        Ok(())
    }

    /// Sets the tip and recomputes totals. No-op when unchanged.
    pub fn set_tip_cents(&mut self, cents: i64) -> CoreResult<()> {
        validate_charge_cents("tip", cents)?;
        if self.tip_cents == cents {
            return Ok(());
        }

        let previous = self.tip_cents;
        self.tip_cents = cents;
        self.commit_charge_change(|order| order.tip_cents = previous)
    }

    /// Sets the discount and recomputes totals. No-op when unchanged.
    pub fn set_discount_cents(&mut self, cents: i64) -> CoreResult<()> {
        validate_charge_cents("discount", cents)?;
        if self.discount_cents == cents {
            return Ok(());
        }

        let previous = self.discount_cents;
        self.discount_cents = cents;
        self.commit_charge_change(|order| order.discount_cents = previous)
    }

    /// Sets the delivery fee and recomputes totals. No-op when unchanged.
    pub fn set_delivery_fee_cents(&mut self, cents: i64) -> CoreResult<()> {
        validate_charge_cents("deliveryFee", cents)?;
        if self.delivery_fee_cents == cents {
            return Ok(());
        }

        let previous = self.delivery_fee_cents;
        self.delivery_fee_cents = cents;
        self.commit_charge_change(|order| order.delivery_fee_cents = previous)
    }

    /// Sets the service fee and recomputes totals. No-op when unchanged.
    pub fn set_service_fee_cents(&mut self, cents: i64) -> CoreResult<()> {
        validate_charge_cents("serviceFee", cents)?;
        if self.service_fee_cents == cents {
            return Ok(());
        }

        let previous = self.service_fee_cents;
        self.service_fee_cents = cents;
        self.commit_charge_change(|order| order.service_fee_cents = previous)
    }

    /// Recomputes after a charge change, rolling the change back (via
    /// `restore`) when the new figures fail reconciliation. The order is
    /// never left half-mutated.
    fn commit_charge_change(&mut self, restore: impl FnOnce(&mut Order)) -> CoreResult<()> {
        if let Err(err) = self.recompute_totals() {
            restore(self);
            return Err(err);
        }

        self.updated_at = Utc::now();
        Ok(())
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

impl Order {
    /// Moves the order along the delivery lifecycle.
    ///
    /// Returns `Ok(true)` when the status changed, `Ok(false)` for a
    /// same-state no-op (nothing is stamped), and
    /// [`CoreError::InvalidTransition`] for an edge the table does not
    /// allow.
    ///
    /// `delivered_at` and `cancelled_at` are stamped on the first entry
    /// into their state and never overwritten.
    pub fn transition_to(&mut self, to: OrderStatus) -> CoreResult<bool> {
        if self.status == to {
            return Ok(false);
        }

        if !self.status.can_transition_to(to) {
            return Err(CoreError::InvalidTransition {
                from: self.status,
                to,
            });
        }

        let now = Utc::now();
        self.status = to;
        match to {
            OrderStatus::Delivered => {
                if self.delivered_at.is_none() {
                    self.delivered_at = Some(now);
                }
            }
            OrderStatus::Cancelled => {
                if self.cancelled_at.is_none() {
                    self.cancelled_at = Some(now);
                }
            }
            _ => {}
        }
        self.updated_at = now;
        Ok(true)
    }

    /// Cancels the order on the customer's behalf.
    ///
    /// Allowed from `pending` and `confirmed`; `allow_from_preparing`
    /// widens the window to `preparing` for deployments that want it.
    /// Cancelling an already-cancelled order is a no-op that keeps the
    /// original reason and timestamp.
    pub fn cancel(
        &mut self,
        reason: impl Into<String>,
        allow_from_preparing: bool,
    ) -> CoreResult<()> {
        if self.status == OrderStatus::Cancelled {
            return Ok(());
        }

        let allowed = matches!(self.status, OrderStatus::Pending | OrderStatus::Confirmed)
            || (allow_from_preparing && self.status == OrderStatus::Preparing);

        if !allowed {
            return Err(CoreError::InvalidTransition {
                from: self.status,
                to: OrderStatus::Cancelled,
            });
        }

        let now = Utc::now();
        self.status = OrderStatus::Cancelled;
        if self.cancelled_at.is_none() {
            self.cancelled_at = Some(now);
        }
        self.cancellation_reason = Some(reason.into());
        self.updated_at = now;
        Ok(())
    }

    /// Records post-delivery feedback, once.
    pub fn rate(&mut self, rating: i64, review: Option<String>) -> CoreResult<()> {
        if self.status != OrderStatus::Delivered {
            return Err(CoreError::NotDelivered {
                status: self.status,
            });
        }

        if self.rated {
            return Err(CoreError::AlreadyRated);
        }

        validate_rating(rating)?;

        self.rated = true;
        self.rating = Some(rating);
        self.review = review;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Sets the payment status.
    ///
    /// The payment axis is independent of the delivery lifecycle and the
    /// aggregate imposes no transition rules here; which payment moves are
    /// sane is the payment layer's business. Returns whether anything
    /// changed.
    pub fn set_payment_status(&mut self, new_status: PaymentStatus) -> bool {
        if self.payment_status == new_status {
            return false;
        }

        self.payment_status = new_status;
        self.updated_at = Utc::now();
        true
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn contact() -> ContactInfo {
        ContactInfo {
            first_name: "Ada".to_string(),
            last_name: "Nguyen".to_string(),
            email: Some("ada@example.com".to_string()),
            phone: "555-0100".to_string(),
        }
    }

    fn address() -> DeliveryAddress {
        DeliveryAddress {
            street: "1 Main St".to_string(),
            city: "Austin".to_string(),
            state: "TX".to_string(),
            zip_code: "78701".to_string(),
        }
    }

    fn new_order() -> NewOrder {
        NewOrder {
            user_id: Some("user-1".to_string()),
            account_email: Some("account@example.com".to_string()),
            restaurant_id: "rest-1".to_string(),
            restaurant_name: "Thai Garden".to_string(),
            restaurant_image: None,
            items: vec![
                OrderItem::new("Pad Thai", 1699, 1, None, None),
                OrderItem::new("Spring Rolls", 699, 2, None, None),
            ],
            delivery_type: DeliveryType::Delivery,
            delivery_address: Some(address()),
            contact: contact(),
            payment_method: PaymentMethod::CreditCard,
            tax_rate: TaxRate::from_bps(800),
            delivery_fee_cents: 299,
            service_fee_cents: 0,
            tip_cents: 0,
            discount_cents: 0,
            estimated_delivery: None,
            client_total_cents: None,
        }
    }

    fn delivered_order() -> Order {
        let mut order = Order::place(NewOrder {
            payment_method: PaymentMethod::CreditCard,
            ..new_order()
        })
        .unwrap();
        order.transition_to(OrderStatus::Preparing).unwrap();
        order.transition_to(OrderStatus::Ready).unwrap();
        order.transition_to(OrderStatus::OutForDelivery).unwrap();
        order.transition_to(OrderStatus::Delivered).unwrap();
        order
    }

    // -------------------------------------------------------------------------
    // Construction & pricing
    // -------------------------------------------------------------------------

    #[test]
    fn test_place_prices_the_known_scenario() {
        // $16.99 + 2 × $6.99 = $30.97; 8% tax = $2.48; fee $2.99; total $36.44
        let order = Order::place(new_order()).unwrap();

        assert_eq!(order.subtotal_cents, 3097);
        assert_eq!(order.tax_cents, 248);
        assert_eq!(order.delivery_fee_cents, 299);
        assert_eq!(order.total_cents, 3644);
    }

    #[test]
    fn test_place_recomputes_client_line_totals() {
        let mut input = new_order();
        input.items[0].item_total_cents = 1; // client lied
        input.client_total_cents = Some(99); // and lied about the total

        let order = Order::place(input).unwrap();
        assert_eq!(order.items[0].item_total_cents, 1699);
        assert_eq!(order.total_cents, 3644);
    }

    #[test]
    fn test_place_fails_fast_in_field_order() {
        let mut input = new_order();
        input.items.clear();
        input.restaurant_id.clear();

        // items are checked before the restaurant
        let err = Order::place(input).unwrap_err();
        assert_eq!(err.to_string(), "validation error: items must not be empty");
    }

    #[test]
    fn test_place_requires_address_for_delivery_only() {
        let mut input = new_order();
        input.delivery_address = None;
        assert!(Order::place(input).is_err());

        let mut input = new_order();
        input.delivery_type = DeliveryType::Pickup;
        input.delivery_address = None;
        let order = Order::place(input).unwrap();

        // pickup orders never carry a delivery fee
        assert_eq!(order.delivery_fee_cents, 0);
        assert_eq!(order.total_cents, 3097 + 248);
    }

    #[test]
    fn test_place_records_email_source() {
        let order = Order::place(new_order()).unwrap();
        assert_eq!(order.user_email, "ada@example.com");
        assert_eq!(order.email_source, crate::types::EmailSource::Contact);

        let mut input = new_order();
        input.contact.email = None;
        let order = Order::place(input).unwrap();
        assert_eq!(order.user_email, "account@example.com");
        assert_eq!(order.email_source, crate::types::EmailSource::Account);

        let mut input = new_order();
        input.contact.email = None;
        input.account_email = None;
        let err = Order::place(input).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_place_initial_statuses() {
        let cash = Order::place(NewOrder {
            payment_method: PaymentMethod::CashOnDelivery,
            ..new_order()
        })
        .unwrap();
        assert_eq!(cash.status, OrderStatus::Pending);
        assert_eq!(cash.payment_status, PaymentStatus::Pending);

        let card = Order::place(new_order()).unwrap();
        assert_eq!(card.status, OrderStatus::Confirmed);
        assert_eq!(card.payment_status, PaymentStatus::Completed);
    }

    #[test]
    fn test_place_rejects_negative_total() {
        let mut input = new_order();
        input.discount_cents = 100_000;

        let err = Order::place(input).unwrap_err();
        assert!(matches!(err, CoreError::NegativeTotal { .. }));
    }

    // -------------------------------------------------------------------------
    // Totals invariant under mutation
    // -------------------------------------------------------------------------

    #[test]
    fn test_totals_invariant_holds_after_each_charge_mutation() {
        let mut order = Order::place(new_order()).unwrap();

        order.set_tip_cents(500).unwrap();
        order.set_discount_cents(300).unwrap();
        order.set_service_fee_cents(99).unwrap();
        order.set_delivery_fee_cents(399).unwrap();

        let expected = order.subtotal_cents + order.delivery_fee_cents + order.tax_cents
            + order.service_fee_cents
            + order.tip_cents
            - order.discount_cents;
        assert_eq!(order.total_cents, expected);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut order = Order::place(new_order()).unwrap();
        let before = (order.subtotal_cents, order.total_cents, order.updated_at);

        order.recompute_totals().unwrap();
        order.recompute_totals().unwrap();

        assert_eq!(
            (order.subtotal_cents, order.total_cents, order.updated_at),
            before
        );
    }

    #[test]
    fn test_rejected_charge_leaves_order_unchanged() {
        let mut order = Order::place(new_order()).unwrap();
        let before_total = order.total_cents;

        let err = order.set_discount_cents(1_000_000).unwrap_err();
        assert!(matches!(err, CoreError::NegativeTotal { .. }));
        assert_eq!(order.discount_cents, 0);
        assert_eq!(order.total_cents, before_total);
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    #[test]
    fn test_happy_path_to_delivered() {
        let order = delivered_order();
        assert_eq!(order.status, OrderStatus::Delivered);
        assert!(order.delivered_at.is_some());
    }

    #[test]
    fn test_invalid_transition_reports_both_states() {
        let mut order = Order::place(new_order()).unwrap(); // confirmed

        let err = order.transition_to(OrderStatus::Delivered).unwrap_err();
        match err {
            CoreError::InvalidTransition { from, to } => {
                assert_eq!(from, OrderStatus::Confirmed);
                assert_eq!(to, OrderStatus::Delivered);
            }
            other => panic!("expected InvalidTransition, got {other:?}"),
        }
    }

    #[test]
    fn test_same_state_transition_is_a_noop() {
        let mut order = delivered_order();
        let stamped = order.delivered_at;
        let updated = order.updated_at;

        let changed = order.transition_to(OrderStatus::Delivered).unwrap();
        assert!(!changed);
        assert_eq!(order.delivered_at, stamped);
        assert_eq!(order.updated_at, updated);
    }

    #[test]
    fn test_cancel_window() {
        let mut pending = Order::place(NewOrder {
            payment_method: PaymentMethod::CashOnDelivery,
            ..new_order()
        })
        .unwrap();
        pending.cancel("changed my mind", false).unwrap();
        assert_eq!(pending.status, OrderStatus::Cancelled);
        assert!(pending.cancelled_at.is_some());
        assert_eq!(
            pending.cancellation_reason.as_deref(),
            Some("changed my mind")
        );

        let mut confirmed = Order::place(new_order()).unwrap();
        confirmed.cancel("late", false).unwrap();
        assert_eq!(confirmed.status, OrderStatus::Cancelled);

        for target in [
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ] {
            let mut order = Order::place(new_order()).unwrap();
            order.status = target;
            assert!(
                order.cancel("too late", false).is_err(),
                "cancel must be rejected from {target}"
            );
        }
    }

    #[test]
    fn test_cancel_from_preparing_is_policy_gated() {
        let mut order = Order::place(new_order()).unwrap();
        order.transition_to(OrderStatus::Preparing).unwrap();

        assert!(order.cancel("kitchen is slow", false).is_err());
        order.cancel("kitchen is slow", true).unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_cancel_twice_keeps_first_reason_and_timestamp() {
        let mut order = Order::place(new_order()).unwrap();
        order.cancel("first", false).unwrap();
        let stamped = order.cancelled_at;

        order.cancel("second", false).unwrap();
        assert_eq!(order.cancellation_reason.as_deref(), Some("first"));
        assert_eq!(order.cancelled_at, stamped);
    }

    // -------------------------------------------------------------------------
    // Rating
    // -------------------------------------------------------------------------

    #[test]
    fn test_rate_requires_delivery() {
        let mut order = Order::place(new_order()).unwrap();
        let err = order.rate(5, None).unwrap_err();
        assert!(matches!(err, CoreError::NotDelivered { .. }));
    }

    #[test]
    fn test_rate_only_once() {
        let mut order = delivered_order();
        order.rate(4, Some("great noodles".to_string())).unwrap();
        assert!(order.rated);
        assert_eq!(order.rating, Some(4));

        let err = order.rate(1, None).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyRated));
        assert_eq!(order.rating, Some(4));
    }

    #[test]
    fn test_rate_bounds() {
        let mut order = delivered_order();
        assert!(order.rate(0, None).is_err());
        assert!(order.rate(6, None).is_err());
        assert!(!order.rated);
        order.rate(1, None).unwrap();
    }

    // -------------------------------------------------------------------------
    // Payment axis
    // -------------------------------------------------------------------------

    #[test]
    fn test_payment_status_is_independent_of_lifecycle() {
        let mut order = Order::place(NewOrder {
            payment_method: PaymentMethod::CashOnDelivery,
            ..new_order()
        })
        .unwrap();

        // still pending delivery-wise, payment can move freely
        assert!(order.set_payment_status(PaymentStatus::Failed));
        assert_eq!(order.payment_status, PaymentStatus::Failed);
        assert_eq!(order.status, OrderStatus::Pending);

        assert!(order.set_payment_status(PaymentStatus::Completed));
        // same value again is a no-op
        assert!(!order.set_payment_status(PaymentStatus::Completed));
    }
}
