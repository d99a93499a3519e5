//! # Order Service
//!
//! The primary entry point of the order core: checkout, reads, lifecycle
//! transitions, cancellation, and rating.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       create_order                                      │
//! │                                                                         │
//! │  CreateOrderRequest + Credential                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Authorizer.resolve ──► Actor (guest checkout allowed)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PricingSource.restaurant_profile ──► fee, tax rate, delivery window   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Order::place ──► validated aggregate, server-priced totals            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  create (regenerate order number on collision, bounded attempts)       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  spawn notifications (failure logged, never fails the request)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PlacedOrder { order, notifications_queued }                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! Mutations use read → apply → conditional-write: the repository update
//! is conditioned on the revision the order was read at. A lost race is
//! re-read and re-applied a bounded number of times (policy), then
//! surfaces as a conflict. There is no locking and no shared in-process
//! order state.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::auth::{Actor, Authorizer, Credential};
use crate::catalog::PricingSource;
use crate::config::OrderPolicy;
use crate::error::{ServiceError, ServiceResult};
use crate::notify::{dispatch_order_notifications, Notifier};
use mealflow_core::{
    ContactInfo, DeliveryAddress, DeliveryType, NewOrder, Order, OrderFilter, OrderItem,
    OrderNumberGenerator, OrderRepository, OrderStatus, Page, PaymentMethod, PaymentStatus,
    RepoError, TaxRate,
};

// =============================================================================
// Request / Response Types
// =============================================================================

/// One cart line as submitted by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    #[serde(default)]
    pub image_ref: Option<String>,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

/// Delivery address as submitted by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

/// Contact block as submitted by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub phone: String,
}

/// A cart submission.
///
/// Client-side money figures (`clientTotalCents`) are advisory; the
/// server reprices everything from unit prices and the restaurant
/// profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub restaurant_id: String,
    pub restaurant_name: String,
    #[serde(default)]
    pub restaurant_image: Option<String>,

    pub items: Vec<CartItemRequest>,

    pub delivery_type: DeliveryType,
    #[serde(default)]
    pub delivery_address: Option<AddressRequest>,
    pub contact: ContactRequest,

    pub payment_method: PaymentMethod,

    #[serde(default)]
    pub tip_cents: i64,
    #[serde(default)]
    pub discount_cents: i64,
    #[serde(default)]
    pub client_total_cents: Option<i64>,
}

/// Result of a successful checkout.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    /// The stored order, with server-computed totals and assigned ids.
    pub order: Order,
    /// Whether notification dispatch was scheduled. Dispatch runs on
    /// background tasks; terminal delivery failures land in the log, not
    /// here.
    pub notifications_queued: bool,
}

// =============================================================================
// Order Service
// =============================================================================

/// Orchestrates the order aggregate and its collaborators.
///
/// Holds no order state of its own: every operation reads from the
/// repository, mutates through aggregate methods, and writes back.
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    notifier: Arc<dyn Notifier>,
    authorizer: Arc<dyn Authorizer>,
    catalog: Arc<dyn PricingSource>,
    generator: OrderNumberGenerator,
    policy: OrderPolicy,
}

impl OrderService {
    /// Wires a service with the default policy.
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        notifier: Arc<dyn Notifier>,
        authorizer: Arc<dyn Authorizer>,
        catalog: Arc<dyn PricingSource>,
    ) -> Self {
        OrderService {
            repo,
            notifier,
            authorizer,
            catalog,
            generator: OrderNumberGenerator::new(),
            policy: OrderPolicy::default(),
        }
    }

    /// Replaces the policy (builder-style, used at wiring time).
    pub fn with_policy(mut self, policy: OrderPolicy) -> Self {
        self.policy = policy;
        self
    }

    // -------------------------------------------------------------------------
    // Checkout
    // -------------------------------------------------------------------------

    /// Places an order from a cart submission.
    ///
    /// See the module docs for the full flow. Validation and pricing
    /// errors are never retried; an order-number collision is retried
    /// with a fresh number up to the policy's attempt budget.
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
        credential: &Credential,
    ) -> ServiceResult<PlacedOrder> {
        debug!(restaurant_id = %request.restaurant_id, "create_order");

        let actor = self.authorizer.resolve(credential).await?;
        let profile = self.catalog.restaurant_profile(&request.restaurant_id).await?;

        let items: Vec<OrderItem> = request
            .items
            .into_iter()
            .map(|i| {
                OrderItem::new(
                    i.name,
                    i.unit_price_cents,
                    i.quantity,
                    i.image_ref,
                    i.special_instructions,
                )
            })
            .collect();

        let now = Utc::now();
        let order = Order::place(NewOrder {
            user_id: actor.id.clone(),
            account_email: actor.email.clone(),
            restaurant_id: request.restaurant_id,
            restaurant_name: request.restaurant_name,
            restaurant_image: request.restaurant_image,
            items,
            delivery_type: request.delivery_type,
            delivery_address: request.delivery_address.map(|a| DeliveryAddress {
                street: a.street,
                city: a.city,
                state: a.state,
                zip_code: a.zip_code,
            }),
            contact: ContactInfo {
                first_name: request.contact.first_name,
                last_name: request.contact.last_name,
                email: request.contact.email,
                phone: request.contact.phone,
            },
            payment_method: request.payment_method,
            tax_rate: TaxRate::from_bps(profile.tax_rate_bps),
            delivery_fee_cents: profile.delivery_fee_cents,
            service_fee_cents: self.policy.service_fee_cents,
            tip_cents: request.tip_cents,
            discount_cents: request.discount_cents,
            estimated_delivery: Some(profile.estimated_delivery(now)),
            client_total_cents: request.client_total_cents,
        })?;

        let stored = self.create_with_retry(order).await?;

        info!(
            order_id = %stored.id,
            order_number = %stored.order_number,
            total = %stored.total(),
            guest = actor.id.is_none(),
            "Order placed"
        );

        dispatch_order_notifications(Arc::clone(&self.notifier), stored.clone());

        Ok(PlacedOrder {
            order: stored,
            notifications_queued: true,
        })
    }

    /// Persists the order, regenerating the order number on collision.
    ///
    /// Only a unique violation on the order-number index consumes an
    /// attempt; every other persistence failure propagates immediately.
    async fn create_with_retry(&self, mut order: Order) -> ServiceResult<Order> {
        let attempts = self.policy.order_number_attempts.max(1);

        for attempt in 1..=attempts {
            order.order_number = self.generator.generate();

            match self.repo.create(&order).await {
                Ok(stored) => return Ok(stored),
                Err(err) if err.is_order_number_collision() => {
                    warn!(
                        attempt,
                        order_number = %order.order_number,
                        "order number collision, regenerating"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(ServiceError::ResourceExhausted { attempts })
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Fetches one order. Owners and admins only.
    pub async fn get_order(&self, id: &str, actor: &Actor) -> ServiceResult<Order> {
        let order = self.repo.find_by_id(id).await?;

        if !(actor.is_admin || actor.owns(&order)) {
            return Err(ServiceError::permission_denied(
                "only the order's owner or an admin may view it",
            ));
        }

        Ok(order)
    }

    /// Lists the calling account's orders, newest first.
    ///
    /// Requires an authenticated actor; guests have no order history to
    /// list. Any `user_id` already on the filter is overridden.
    pub async fn list_my_orders(
        &self,
        actor: &Actor,
        filter: OrderFilter,
        page: Page,
    ) -> ServiceResult<(Vec<Order>, u64)> {
        let user_id = actor.id.clone().ok_or_else(|| {
            ServiceError::permission_denied("sign in to list your orders")
        })?;

        let filter = OrderFilter {
            user_id: Some(user_id),
            ..filter
        };

        Ok(self.repo.find(&filter, page).await?)
    }

    /// Lists orders across all accounts. Admins only.
    pub async fn list_all_orders(
        &self,
        actor: &Actor,
        filter: OrderFilter,
        page: Page,
    ) -> ServiceResult<(Vec<Order>, u64)> {
        if !actor.is_admin {
            return Err(ServiceError::permission_denied(
                "only admins may list all orders",
            ));
        }

        Ok(self.repo.find(&filter, page).await?)
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Moves an order along the delivery lifecycle. Admins and the
    /// restaurant's own operators only.
    pub async fn update_status(
        &self,
        id: &str,
        new_status: OrderStatus,
        actor: &Actor,
    ) -> ServiceResult<Order> {
        let order = self.repo.find_by_id(id).await?;
        if !(actor.is_admin || actor.manages_restaurant(&order.restaurant_id)) {
            return Err(ServiceError::permission_denied(
                "only admins or the restaurant's operators may update order status",
            ));
        }

        self.mutate_with_retry(id, |order| Ok(order.transition_to(new_status)?))
            .await
    }

    /// Sets the payment status. Admins only (payment webhooks come in
    /// through an admin-scoped integration).
    pub async fn update_payment_status(
        &self,
        id: &str,
        new_status: PaymentStatus,
        actor: &Actor,
    ) -> ServiceResult<Order> {
        if !actor.is_admin {
            return Err(ServiceError::permission_denied(
                "only admins may update payment status",
            ));
        }

        self.mutate_with_retry(id, |order| Ok(order.set_payment_status(new_status)))
            .await
    }

    /// Cancels an order on the customer's behalf. Owners and admins only;
    /// the window is governed by the policy.
    pub async fn cancel_order(
        &self,
        id: &str,
        reason: &str,
        actor: &Actor,
    ) -> ServiceResult<Order> {
        let order = self.repo.find_by_id(id).await?;
        if !(actor.is_admin || actor.owns(&order)) {
            return Err(ServiceError::permission_denied(
                "only the order's owner or an admin may cancel it",
            ));
        }

        let allow_from_preparing = self.policy.allow_cancel_while_preparing;
        self.mutate_with_retry(id, move |order| {
            if order.status == OrderStatus::Cancelled {
                // already cancelled: idempotent, nothing to write
                return Ok(false);
            }
            order.cancel(reason, allow_from_preparing)?;
            Ok(true)
        })
        .await
    }

    /// Records post-delivery feedback. The owner only, once.
    pub async fn rate_order(
        &self,
        id: &str,
        rating: i64,
        review: Option<String>,
        actor: &Actor,
    ) -> ServiceResult<Order> {
        let order = self.repo.find_by_id(id).await?;
        if !actor.owns(&order) {
            return Err(ServiceError::permission_denied(
                "only the order's owner may rate it",
            ));
        }

        self.mutate_with_retry(id, move |order| {
            order.rate(rating, review.clone())?;
            Ok(true)
        })
        .await
    }

    // -------------------------------------------------------------------------
    // Conditional-write loop
    // -------------------------------------------------------------------------

    /// Read → apply → conditional write, retried on a lost race.
    ///
    /// `apply` returns whether anything changed; unchanged orders are
    /// returned without touching storage (same-state transitions, repeated
    /// cancellations). A write that loses the revision race is re-read and
    /// re-applied up to the policy budget, after which the conflict
    /// surfaces to the caller.
    async fn mutate_with_retry<F>(&self, id: &str, mut apply: F) -> ServiceResult<Order>
    where
        F: FnMut(&mut Order) -> ServiceResult<bool>,
    {
        let mut lost_races = 0;

        loop {
            let mut order = self.repo.find_by_id(id).await?;
            if !apply(&mut order)? {
                return Ok(order);
            }

            match self.repo.update(id, order.revision, &order).await {
                Ok(stored) => return Ok(stored),
                Err(RepoError::Conflict { .. })
                    if lost_races < self.policy.update_retry_attempts =>
                {
                    lost_races += 1;
                    debug!(order_id = %id, lost_races, "conditional write lost the race, re-reading");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}
