//! Shared test doubles for the service suites.
//!
//! The in-memory repository mirrors the production SQLite semantics the
//! service relies on: a unique order-number index, revision
//! compare-and-set updates, and newest-first filtered listing. Failure
//! injection knobs simulate the races and outages the service must
//! survive.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use mealflow_core::{
    ContactInfo, DeliveryAddress, DeliveryType, NewOrder, Order, OrderFilter, OrderItem,
    OrderRepository, Page, PaymentMethod, RepoError, TaxRate,
};
use mealflow_service::{
    Actor, AuthError, Authorizer, CatalogError, Credential, Notifier, NotifyError, PricingSource,
    RestaurantProfile,
};

// =============================================================================
// In-Memory Repository
// =============================================================================

#[derive(Default)]
struct RepoState {
    orders: HashMap<String, Order>,
    /// Next N creates fail as order-number collisions.
    collisions_to_inject: u32,
    /// Next N creates fail as storage outages.
    outages_to_inject: u32,
    /// Next N updates fail as lost races.
    conflicts_to_inject: u32,
}

/// HashMap-backed `OrderRepository` with the same contract as the SQLite
/// implementation.
pub struct InMemoryOrderRepository {
    state: Mutex<RepoState>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(InMemoryOrderRepository {
            state: Mutex::new(RepoState::default()),
        })
    }

    /// The next `n` creates are rejected as duplicate order numbers.
    pub async fn inject_order_number_collisions(&self, n: u32) {
        self.state.lock().await.collisions_to_inject = n;
    }

    /// The next `n` creates are rejected as storage outages.
    pub async fn inject_outages(&self, n: u32) {
        self.state.lock().await.outages_to_inject = n;
    }

    /// The next `n` conditional updates lose their race.
    pub async fn inject_update_conflicts(&self, n: u32) {
        self.state.lock().await.conflicts_to_inject = n;
    }

    pub async fn stored_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: &Order) -> Result<Order, RepoError> {
        let mut state = self.state.lock().await;

        if state.collisions_to_inject > 0 {
            state.collisions_to_inject -= 1;
            return Err(RepoError::UniqueViolation {
                field: "orders.order_number".to_string(),
            });
        }

        if state.outages_to_inject > 0 {
            state.outages_to_inject -= 1;
            return Err(RepoError::Unavailable("injected outage".to_string()));
        }

        if state
            .orders
            .values()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(RepoError::UniqueViolation {
                field: "orders.order_number".to_string(),
            });
        }

        let mut stored = order.clone();
        stored.id = Uuid::new_v4().to_string();
        stored.revision = 0;
        state.orders.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: &str) -> Result<Order, RepoError> {
        self.state
            .lock()
            .await
            .orders
            .get(id)
            .cloned()
            .ok_or_else(|| RepoError::not_found("Order", id))
    }

    async fn find(&self, filter: &OrderFilter, page: Page) -> Result<(Vec<Order>, u64), RepoError> {
        let state = self.state.lock().await;

        let mut matches: Vec<Order> = state
            .orders
            .values()
            .filter(|o| {
                filter
                    .user_id
                    .as_ref()
                    .map_or(true, |u| o.user_id.as_ref() == Some(u))
                    && filter
                        .restaurant_id
                        .as_ref()
                        .map_or(true, |r| &o.restaurant_id == r)
                    && filter.status.map_or(true, |s| o.status == s)
                    && filter
                        .payment_status
                        .map_or(true, |s| o.payment_status == s)
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matches.len() as u64;
        let window: Vec<Order> = matches
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .collect();

        Ok((window, total))
    }

    async fn update(
        &self,
        id: &str,
        expected_revision: i64,
        order: &Order,
    ) -> Result<Order, RepoError> {
        let mut state = self.state.lock().await;

        if state.conflicts_to_inject > 0 {
            state.conflicts_to_inject -= 1;
            return Err(RepoError::Conflict { id: id.to_string() });
        }

        let current = state
            .orders
            .get(id)
            .ok_or_else(|| RepoError::not_found("Order", id))?;

        if current.revision != expected_revision {
            return Err(RepoError::Conflict { id: id.to_string() });
        }

        let mut stored = order.clone();
        stored.id = id.to_string();
        stored.revision = expected_revision + 1;
        state.orders.insert(id.to_string(), stored.clone());
        Ok(stored)
    }
}

// =============================================================================
// Notifier Double
// =============================================================================

/// Notification attempt: which channel, for which order number.
pub type NotificationEvent = (&'static str, String);

/// Records every notification attempt on a channel the test can await,
/// optionally failing one or both channels.
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<NotificationEvent>,
    fail_customer: bool,
    fail_admin: bool,
}

impl ChannelNotifier {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<NotificationEvent>) {
        Self::with_failures(false, false)
    }

    pub fn with_failures(
        fail_customer: bool,
        fail_admin: bool,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<NotificationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Arc::new(ChannelNotifier {
                tx,
                fail_customer,
                fail_admin,
            }),
            rx,
        )
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify_order_confirmed(&self, order: &Order) -> Result<(), NotifyError> {
        let _ = self.tx.send(("customer", order.order_number.clone()));
        if self.fail_customer {
            return Err(NotifyError("smtp down".to_string()));
        }
        Ok(())
    }

    async fn notify_admin(&self, order: &Order) -> Result<(), NotifyError> {
        let _ = self.tx.send(("admin", order.order_number.clone()));
        if self.fail_admin {
            return Err(NotifyError("pager down".to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// Authorizer & Catalog Doubles
// =============================================================================

/// Resolves tokens to one configured actor; anonymous resolves to guest.
pub struct StaticAuthorizer {
    actor: Actor,
    fail: bool,
}

impl StaticAuthorizer {
    pub fn new(actor: Actor) -> Arc<Self> {
        Arc::new(StaticAuthorizer { actor, fail: false })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(StaticAuthorizer {
            actor: Actor::guest(),
            fail: true,
        })
    }
}

#[async_trait]
impl Authorizer for StaticAuthorizer {
    async fn resolve(&self, credential: &Credential) -> Result<Actor, AuthError> {
        if self.fail {
            return Err(AuthError::Unavailable("auth service down".to_string()));
        }

        match credential {
            Credential::Anonymous => Ok(Actor::guest()),
            Credential::Token(_) => Ok(self.actor.clone()),
        }
    }
}

/// Serves one configured profile for every restaurant id.
pub struct StaticCatalog {
    profile: RestaurantProfile,
    fail: bool,
}

impl StaticCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(StaticCatalog {
            profile: RestaurantProfile {
                delivery_fee_cents: 299,
                tax_rate_bps: 800,
                max_delivery_minutes: 45,
            },
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(StaticCatalog {
            profile: RestaurantProfile {
                delivery_fee_cents: 0,
                tax_rate_bps: 0,
                max_delivery_minutes: 0,
            },
            fail: true,
        })
    }
}

#[async_trait]
impl PricingSource for StaticCatalog {
    async fn restaurant_profile(
        &self,
        _restaurant_id: &str,
    ) -> Result<RestaurantProfile, CatalogError> {
        if self.fail {
            return Err(CatalogError::Unavailable("catalog down".to_string()));
        }
        Ok(self.profile)
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn customer(id: &str) -> Actor {
    Actor {
        id: Some(id.to_string()),
        email: Some(format!("{id}@example.com")),
        is_admin: false,
        restaurant_id: None,
    }
}

pub fn admin() -> Actor {
    Actor {
        id: Some("admin-1".to_string()),
        email: Some("ops@mealflow.example".to_string()),
        is_admin: true,
        restaurant_id: None,
    }
}

pub fn operator(restaurant_id: &str) -> Actor {
    Actor {
        id: Some("operator-1".to_string()),
        email: None,
        is_admin: false,
        restaurant_id: Some(restaurant_id.to_string()),
    }
}

/// A fully-populated order for direct repository seeding.
pub fn sample_order(order_number: &str, user_id: Option<&str>) -> Order {
    let mut order = Order::place(NewOrder {
        user_id: user_id.map(str::to_string),
        account_email: None,
        restaurant_id: "rest-1".to_string(),
        restaurant_name: "Thai Garden".to_string(),
        restaurant_image: None,
        items: vec![
            OrderItem::new("Pad Thai", 1699, 1, None, None),
            OrderItem::new("Spring Rolls", 699, 2, None, None),
        ],
        delivery_type: DeliveryType::Delivery,
        delivery_address: Some(DeliveryAddress {
            street: "1 Main St".to_string(),
            city: "Austin".to_string(),
            state: "TX".to_string(),
            zip_code: "78701".to_string(),
        }),
        contact: ContactInfo {
            first_name: "Ada".to_string(),
            last_name: "Nguyen".to_string(),
            email: Some("ada@example.com".to_string()),
            phone: "555-0100".to_string(),
        },
        payment_method: PaymentMethod::CreditCard,
        tax_rate: TaxRate::from_bps(800),
        delivery_fee_cents: 299,
        service_fee_cents: 0,
        tip_cents: 0,
        discount_cents: 0,
        estimated_delivery: None,
        client_total_cents: None,
    })
    .unwrap();
    order.order_number = order_number.to_string();
    order
}
