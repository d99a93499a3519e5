//! # Domain Types
//!
//! Core domain types for the mealflow order system.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Order       │   │   OrderItem     │   │ DeliveryAddress │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  name           │   │  street         │       │
//! │  │  order_number   │   │  unit_price     │   │  city           │       │
//! │  │  status         │   │  quantity       │   │  state          │       │
//! │  │  total_cents    │   │  item_total     │   │  zip_code       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  OrderStatus ── the delivery lifecycle (8 states, guarded edges)       │
//! │  PaymentMethod / PaymentStatus ── payment axis, independent of the     │
//! │                                   delivery lifecycle                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every order has:
//! - `id`: UUID v4 - immutable, repository-assigned, used for relations
//! - `order_number`: human-readable business identifier, unique, shown to
//!   customers and support staff

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 800 bps = 8.00% sales tax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Delivery Type
// =============================================================================

/// How the order reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    /// Courier delivery to the customer's address.
    Delivery,
    /// Customer collects at the restaurant.
    Pickup,
}

impl DeliveryType {
    /// Wire value for persistence and transport.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DeliveryType::Delivery => "delivery",
            DeliveryType::Pickup => "pickup",
        }
    }
}

impl fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delivery" => Ok(DeliveryType::Delivery),
            "pickup" => Ok(DeliveryType::Pickup),
            _ => Err(not_allowed("deliveryType", &["delivery", "pickup"])),
        }
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The delivery lifecycle status of an order.
///
/// ## Lifecycle
/// ```text
/// pending ──► confirmed ──► preparing ──► ready ──► out_for_delivery ──► delivered ──► refunded
///    │            │             │
///    └────────────┴─────────────┴──► cancelled
/// ```
/// The `preparing → cancelled` edge exists for operator flows; whether a
/// *customer* cancellation may use it is a policy decision made in the
/// service layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, awaiting restaurant confirmation (cash orders start here).
    Pending,
    /// Accepted by the restaurant (pre-paid orders start here).
    Confirmed,
    /// Kitchen is working on it.
    Preparing,
    /// Ready for courier pickup or customer collection.
    Ready,
    /// Courier is on the way.
    OutForDelivery,
    /// Handed to the customer.
    Delivered,
    /// Cancelled before fulfilment.
    Cancelled,
    /// Money returned after delivery.
    Refunded,
}

impl OrderStatus {
    const VALUES: &'static [&'static str] = &[
        "pending",
        "confirmed",
        "preparing",
        "ready",
        "out_for_delivery",
        "delivered",
        "cancelled",
        "refunded",
    ];

    /// Wire value for persistence and transport.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    /// Whether the state machine has an edge from `self` to `to`.
    ///
    /// Self-transitions are not edges; the aggregate treats them as no-ops
    /// before consulting this table.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, to),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Preparing)
                | (Confirmed, Cancelled)
                | (Preparing, Ready)
                | (Preparing, Cancelled)
                | (Ready, OutForDelivery)
                | (OutForDelivery, Delivered)
                | (Delivered, Refunded)
        )
    }

    /// Terminal states are retained for history and never leave.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Refunded)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "preparing" => Ok(OrderStatus::Preparing),
            "ready" => Ok(OrderStatus::Ready),
            "out_for_delivery" => Ok(OrderStatus::OutForDelivery),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "refunded" => Ok(OrderStatus::Refunded),
            _ => Err(not_allowed("status", Self::VALUES)),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Paypal,
    CashOnDelivery,
}

impl PaymentMethod {
    const VALUES: &'static [&'static str] =
        &["credit_card", "debit_card", "paypal", "cash_on_delivery"];

    /// Wire value for persistence and transport.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
        }
    }

    /// Initial lifecycle status for a fresh order paid this way.
    ///
    /// Cash orders wait for restaurant confirmation; pre-paid orders are
    /// confirmed the moment the charge cleared.
    pub const fn initial_status(&self) -> OrderStatus {
        match self {
            PaymentMethod::CashOnDelivery => OrderStatus::Pending,
            _ => OrderStatus::Confirmed,
        }
    }

    /// Initial payment status for a fresh order paid this way.
    ///
    /// Pre-paid methods reach checkout with the charge already captured;
    /// cash is collected at the door.
    pub const fn initial_payment_status(&self) -> PaymentStatus {
        match self {
            PaymentMethod::CashOnDelivery => PaymentStatus::Pending,
            _ => PaymentStatus::Completed,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit_card" => Ok(PaymentMethod::CreditCard),
            "debit_card" => Ok(PaymentMethod::DebitCard),
            "paypal" => Ok(PaymentMethod::Paypal),
            "cash_on_delivery" => Ok(PaymentMethod::CashOnDelivery),
            _ => Err(not_allowed("paymentMethod", Self::VALUES)),
        }
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Payment state, independent of the delivery lifecycle.
///
/// A delivered order can still have a failed payment (cash customer walked
/// away), and a cancelled order can be refunded. The aggregate therefore
/// never couples the two axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    const VALUES: &'static [&'static str] = &["pending", "completed", "failed", "refunded"];

    /// Wire value for persistence and transport.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            _ => Err(not_allowed("paymentStatus", Self::VALUES)),
        }
    }
}

// =============================================================================
// Email Source
// =============================================================================

/// Which explicitly supplied address became the order's contact email.
///
/// Checkout accepts an email on the contact block or on the account; one of
/// the two must be present and the chosen source is recorded rather than
/// silently inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum EmailSource {
    /// Taken from `contact.email`.
    Contact,
    /// Taken from the account email supplied at checkout.
    Account,
}

impl EmailSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            EmailSource::Contact => "contact",
            EmailSource::Account => "account",
        }
    }
}

impl FromStr for EmailSource {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contact" => Ok(EmailSource::Contact),
            "account" => Ok(EmailSource::Account),
            _ => Err(not_allowed("emailSource", &["contact", "account"])),
        }
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line item on an order.
///
/// Menu data is frozen at order time: the name, price, and image travel
/// with the order so history stays intact when the restaurant edits its
/// menu later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Menu item name at order time (frozen).
    pub name: String,
    /// Unit price in cents at order time (frozen).
    pub unit_price_cents: i64,
    /// Quantity ordered.
    pub quantity: i64,
    /// Menu image reference at order time (frozen).
    pub image_ref: Option<String>,
    /// Free-text kitchen instructions ("no onions").
    pub special_instructions: Option<String>,
    /// Line total (unit_price × quantity).
    pub item_total_cents: i64,
}

impl OrderItem {
    /// Builds a line item, deriving the line total from price × quantity.
    pub fn new(
        name: impl Into<String>,
        unit_price_cents: i64,
        quantity: i64,
        image_ref: Option<String>,
        special_instructions: Option<String>,
    ) -> Self {
        OrderItem {
            name: name.into(),
            unit_price_cents,
            quantity,
            image_ref,
            special_instructions,
            item_total_cents: unit_price_cents * quantity,
        }
    }

    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn item_total(&self) -> Money {
        Money::from_cents(self.item_total_cents)
    }
}

// =============================================================================
// Delivery Address & Contact Info
// =============================================================================

/// Where a delivery order goes. Absent on pickup orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

/// Who to contact about the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub first_name: String,
    pub last_name: String,
    /// May be absent when the account email is supplied instead; checkout
    /// requires at least one of the two.
    pub email: Option<String>,
    pub phone: String,
}

// =============================================================================
// Order
// =============================================================================

/// The order aggregate root.
///
/// Mutation happens only through the methods in [`crate::order`]; the
/// struct's fields are public for persistence mapping and read access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier (UUID v4), assigned by the repository at create
    /// time. Empty until then.
    pub id: String,
    /// Human-readable business identifier (`ORD-...`), unique, immutable.
    pub order_number: String,

    /// Account that placed the order; `None` for guest checkout.
    pub user_id: Option<String>,
    /// Contact email for notifications and lookup.
    pub user_email: String,
    /// Which supplied address `user_email` came from.
    pub email_source: EmailSource,

    /// Restaurant snapshot at order time.
    pub restaurant_id: String,
    pub restaurant_name: String,
    pub restaurant_image: Option<String>,

    /// Line items, ordered as submitted; never empty.
    pub items: Vec<OrderItem>,

    pub delivery_type: DeliveryType,
    /// Required when `delivery_type` is `Delivery`.
    pub delivery_address: Option<DeliveryAddress>,
    pub contact: ContactInfo,

    // Monetary fields, all cents. Invariant:
    // total = subtotal + delivery_fee + tax + service_fee + tip - discount
    pub subtotal_cents: i64,
    pub delivery_fee_cents: i64,
    pub tax_cents: i64,
    pub service_fee_cents: i64,
    pub tip_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,

    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    /// Set exactly once, on the first transition into `delivered`.
    pub delivered_at: Option<DateTime<Utc>>,
    /// Set exactly once, on the first transition into `cancelled`.
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,

    /// Post-delivery feedback, settable once.
    pub rated: bool,
    pub rating: Option<i64>,
    pub review: Option<String>,

    /// Optimistic-concurrency token, incremented by every successful
    /// repository update.
    pub revision: i64,
}

impl Order {
    /// Returns the subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Query Types
// =============================================================================

/// Field filters for order listing. `None` means "don't filter".
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub user_id: Option<String>,
    pub restaurant_id: Option<String>,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

/// Pagination window for order listing. Page numbers are 1-based.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    /// First page with the given size.
    pub const fn first(size: u32) -> Self {
        Page { number: 1, size }
    }

    /// Row offset for SQL-style windows.
    pub const fn offset(&self) -> u32 {
        (self.number.saturating_sub(1)) * self.size
    }
}

impl Default for Page {
    fn default() -> Self {
        Page { number: 1, size: 20 }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn not_allowed(field: &str, allowed: &[&str]) -> ValidationError {
    ValidationError::NotAllowed {
        field: field.to_string(),
        allowed: allowed.iter().map(|s| s.to_string()).collect(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
