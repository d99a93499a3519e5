//! # Order Number Generation
//!
//! Produces the human-readable business identifier printed on receipts and
//! read out to support staff.
//!
//! ## Format
//! `ORD-<YYMMDDHHMMSS><NNNN>` where the tail is a subsecond-derived
//! 4-digit suffix:
//!
//! ```text
//! ORD-2601311842077201
//!     └──┬───────┘└┬─┘
//!     timestamp   suffix
//! ```
//!
//! ## Collisions
//! This is a liveness concern, not a security one. Two checkouts in the
//! same second can draw the same suffix; the database's unique index
//! rejects the duplicate and the service regenerates and retries a bounded
//! number of times. Do not use order numbers as secrets.

use chrono::Utc;

/// Prefix carried by every order number.
pub const ORDER_NUMBER_PREFIX: &str = "ORD-";

/// Generates collision-tolerant, human-readable order numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderNumberGenerator;

impl OrderNumberGenerator {
    /// Creates a generator.
    pub fn new() -> Self {
        OrderNumberGenerator
    }

    /// Generates a fresh order number.
    ///
    /// Each call re-reads the clock, so a retry after a unique-constraint
    /// rejection draws a different suffix (and usually a different
    /// timestamp).
    pub fn generate(&self) -> String {
        let now = Utc::now();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos();
        let suffix = nanos % 10_000;

        format!("{}{}{:04}", ORDER_NUMBER_PREFIX, now.format("%y%m%d%H%M%S"), suffix)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        let number = OrderNumberGenerator::new().generate();

        assert!(number.starts_with(ORDER_NUMBER_PREFIX));
        // ORD- + 12 timestamp digits + 4 suffix digits
        assert_eq!(number.len(), ORDER_NUMBER_PREFIX.len() + 16);
        assert!(number[ORDER_NUMBER_PREFIX.len()..]
            .chars()
            .all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_generator_is_cheap_to_copy() {
        let generator = OrderNumberGenerator::new();
        let copy = generator;
        assert!(copy.generate().starts_with("ORD-"));
        assert!(generator.generate().starts_with("ORD-"));
    }
}
