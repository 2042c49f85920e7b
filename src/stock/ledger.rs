use rust_decimal::Decimal;

/// Quantity arithmetic for stock rows
pub struct StockLedger;

impl StockLedger {
    /// Take `quantity` out of stock, flooring at zero
    pub fn reserve(current: Decimal, quantity: Decimal) -> Decimal {
        (current - quantity).max(Decimal::ZERO)
    }

    /// Put `quantity` back, as when an order is cancelled
    pub fn release(current: Decimal, quantity: Decimal) -> Decimal {
        current + quantity
    }

    /// Whether a row should be flagged as low
    pub fn is_low(quantity: Decimal, threshold: Decimal) -> bool {
        quantity <= threshold
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Reservation never drives stock negative
        #[test]
        fn prop_reserve_never_negative(current in 0u32..=100_000u32, qty in 1u32..=200_000u32) {
            let after = StockLedger::reserve(Decimal::new(current as i64, 3), Decimal::new(qty as i64, 3));
            prop_assert!(after >= Decimal::ZERO);
        }

        /// Release undoes a reservation that fit in stock
        #[test]
        fn prop_release_inverts_reserve(current in 0u32..=100_000u32, qty in 1u32..=100_000u32) {
            prop_assume!(qty <= current);
            let current = Decimal::new(current as i64, 3);
            let qty = Decimal::new(qty as i64, 3);
            let after = StockLedger::reserve(current, qty);
            prop_assert_eq!(StockLedger::release(after, qty), current);
        }
    }
}
