use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};

/// Which printed document a check code belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckCodeKind {
    Invoice,
    Receipt,
}

impl CheckCodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckCodeKind::Invoice => "invoice",
            CheckCodeKind::Receipt => "receipt",
        }
    }
}

/// Four-digit codes printed on invoices and receipts and scanned at pickup
///
/// The hash must stay byte-for-byte compatible with the till apps that
/// print the codes: `h = h * 31 + c` over `"{order_number}-{total:.2}-{kind}"`
/// with 64-bit wrapping, folded to `|h % 10000|`.
pub struct CheckCode;

impl CheckCode {
    pub fn generate(order_number: &str, total: Decimal, kind: CheckCodeKind) -> String {
        let total = total.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let combined = format!("{}-{:.2}-{}", order_number, total, kind.as_str());

        let hash = combined
            .chars()
            .fold(0i64, |h, c| h.wrapping_mul(31).wrapping_add(c as i64));

        format!("{:04}", (hash % 10_000).abs())
    }

    /// Invoice and receipt codes for one order
    pub fn pair(order_number: &str, total: Decimal) -> (String, String) {
        (
            Self::generate(order_number, total, CheckCodeKind::Invoice),
            Self::generate(order_number, total, CheckCodeKind::Receipt),
        )
    }
}

/// `ORD-YYYYMMDD-NNNN` order numbers
pub struct OrderNumber;

impl OrderNumber {
    /// Suffix taken from the clock, as printed by the first attempt
    pub fn from_clock(now: DateTime<Utc>) -> String {
        Self::format(now, now.timestamp().rem_euclid(10_000) as u32)
    }

    /// Random suffix used after a collision
    pub fn random(now: DateTime<Utc>) -> String {
        let suffix = rand::thread_rng().gen_range(0..10_000);
        Self::format(now, suffix)
    }

    fn format(now: DateTime<Utc>, suffix: u32) -> String {
        format!("ORD-{}-{:04}", now.format("%Y%m%d"), suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_known_codes() {
        let (invoice, receipt) = CheckCode::pair("ORD-20240101-1234", dec!(72.50));
        assert_eq!(invoice, "3902");
        assert_eq!(receipt, "7523");
    }

    #[test]
    fn test_total_is_formatted_to_two_places() {
        // 72.5, 72.50 and 72.5000 all print as 72.50
        assert_eq!(
            CheckCode::generate("ORD-20240101-1234", dec!(72.5), CheckCodeKind::Invoice),
            CheckCode::generate("ORD-20240101-1234", dec!(72.5000), CheckCodeKind::Invoice)
        );
    }

    #[test]
    fn test_total_rounds_half_away_from_zero() {
        assert_eq!(
            CheckCode::generate("ORD-20240101-1234", dec!(72.505), CheckCodeKind::Invoice),
            "6461"
        );
    }

    #[test]
    fn test_order_number_from_clock() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let number = OrderNumber::from_clock(now);
        assert_eq!(number, format!("ORD-20240101-{:04}", now.timestamp() % 10_000));
    }

    #[test]
    fn test_random_order_number_shape() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap();
        let number = OrderNumber::random(now);
        assert!(number.starts_with("ORD-20240309-"));
        assert_eq!(number.len(), "ORD-20240309-0000".len());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Codes are always four ASCII digits
        #[test]
        fn prop_code_is_four_digits(number in "ORD-[0-9]{8}-[0-9]{4}", cents in 0i64..10_000_000i64) {
            let code = CheckCode::generate(&number, Decimal::new(cents, 2), CheckCodeKind::Receipt);
            prop_assert_eq!(code.len(), 4);
            prop_assert!(code.chars().all(|c| c.is_ascii_digit()));
        }

        /// Same inputs always give the same code
        #[test]
        fn prop_code_is_deterministic(number in "ORD-[0-9]{8}-[0-9]{4}", cents in 0i64..10_000_000i64) {
            let total = Decimal::new(cents, 2);
            prop_assert_eq!(
                CheckCode::pair(&number, total),
                CheckCode::pair(&number, total)
            );
        }
    }
}
