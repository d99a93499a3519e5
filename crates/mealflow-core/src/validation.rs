//! # Validation Module
//!
//! Checkout input validation for the order aggregate.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Transport (excluded HTTP edge)                               │
//! │  ├── Type validation (deserialization, enum parsing)                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE, called by Order::place                          │
//! │  ├── Checks run in a fixed order and fail fast on the first violation  │
//! │  └── Every error names the offending field                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  └── UNIQUE constraint on order_number                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::{ContactInfo, DeliveryAddress, DeliveryType, EmailSource, OrderItem};
use crate::{MAX_ITEM_QUANTITY, MAX_ORDER_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Item Validators
// =============================================================================

/// Validates the order's line items.
///
/// ## Rules
/// - At least one item
/// - At most MAX_ORDER_ITEMS items
/// - Every quantity between 1 and MAX_ITEM_QUANTITY
/// - Every unit price non-negative (zero allowed: promo items)
pub fn validate_items(items: &[OrderItem]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        });
    }

    if items.len() > MAX_ORDER_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_ORDER_ITEMS as i64,
        });
    }

    for (idx, item) in items.iter().enumerate() {
        if item.name.trim().is_empty() {
            return Err(ValidationError::required(format!("items[{idx}].name")));
        }

        if item.quantity < 1 {
            return Err(ValidationError::MustBePositive {
                field: format!("items[{idx}].quantity"),
            });
        }

        if item.quantity > MAX_ITEM_QUANTITY {
            return Err(ValidationError::OutOfRange {
                field: format!("items[{idx}].quantity"),
                min: 1,
                max: MAX_ITEM_QUANTITY,
            });
        }

        if item.unit_price_cents < 0 {
            return Err(ValidationError::OutOfRange {
                field: format!("items[{idx}].unitPrice"),
                min: 0,
                max: i64::MAX,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Restaurant Validators
// =============================================================================

/// Validates the restaurant snapshot fields.
pub fn validate_restaurant(restaurant_id: &str, restaurant_name: &str) -> ValidationResult<()> {
    if restaurant_id.trim().is_empty() {
        return Err(ValidationError::required("restaurantId"));
    }

    if restaurant_name.trim().is_empty() {
        return Err(ValidationError::required("restaurantName"));
    }

    Ok(())
}

// =============================================================================
// Address & Contact Validators
// =============================================================================

/// Validates the delivery address against the delivery type.
///
/// ## Rules
/// - `delivery` orders need an address with non-empty street, city, state
///   and zip code
/// - `pickup` orders may omit the address entirely
pub fn validate_delivery_address(
    delivery_type: DeliveryType,
    address: Option<&DeliveryAddress>,
) -> ValidationResult<()> {
    if delivery_type == DeliveryType::Pickup {
        return Ok(());
    }

    let address = address.ok_or_else(|| ValidationError::required("deliveryAddress"))?;

    for (field, value) in [
        ("deliveryAddress.street", &address.street),
        ("deliveryAddress.city", &address.city),
        ("deliveryAddress.state", &address.state),
        ("deliveryAddress.zipCode", &address.zip_code),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::required(field));
        }
    }

    Ok(())
}

/// Validates the contact block (email handled separately, see
/// [`resolve_email`]).
pub fn validate_contact(contact: &ContactInfo) -> ValidationResult<()> {
    for (field, value) in [
        ("contact.firstName", &contact.first_name),
        ("contact.lastName", &contact.last_name),
        ("contact.phone", &contact.phone),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::required(field));
        }
    }

    Ok(())
}

/// Picks the order's contact email from the explicitly supplied candidates.
///
/// The contact-block email wins; the account email is the fallback. One of
/// the two must be present. The chosen source is returned so the order can
/// record it; nothing is ever inferred from other data.
pub fn resolve_email(
    contact_email: Option<&str>,
    account_email: Option<&str>,
) -> ValidationResult<(String, EmailSource)> {
    if let Some(email) = contact_email.map(str::trim).filter(|e| !e.is_empty()) {
        return Ok((email.to_string(), EmailSource::Contact));
    }

    if let Some(email) = account_email.map(str::trim).filter(|e| !e.is_empty()) {
        return Ok((email.to_string(), EmailSource::Account));
    }

    Err(ValidationError::required("contact.email"))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a post-delivery rating.
pub fn validate_rating(rating: i64) -> ValidationResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(ValidationError::OutOfRange {
            field: "rating".to_string(),
            min: 1,
            max: 5,
        });
    }

    Ok(())
}

/// Validates a charge amount (fee, tip, discount) in cents.
///
/// Charges are stored as non-negative magnitudes; the discount's sign is
/// applied by the total reconciliation, not by its storage.
pub fn validate_charge_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
