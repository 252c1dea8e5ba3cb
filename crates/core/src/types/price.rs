//! Type-safe price representation using decimal arithmetic.
//!
//! The shop API reports order totals as plain JSON numbers without a currency,
//! so `Price` is a thin wrapper over [`Decimal`] that displays the amount the
//! way the API sent it (`89.99`, `100`).

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An order total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Create a price from an integer count of hundredths (cents).
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_display_drops_trailing_zeros() {
        assert_eq!(Price::from_cents(10_000).to_string(), "100");
        assert_eq!(Price::from_cents(8_999).to_string(), "89.99");
    }

    #[test]
    fn test_price_deserializes_from_json_number() {
        let price: Price = serde_json::from_str("45.5").unwrap_or_default();
        assert_eq!(price.to_string(), "45.5");
        assert_eq!(price, Price::from_cents(4_550));
    }
}
