use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

/// A row with a validity window `[effective_from, effective_to)`
pub trait Versioned {
    fn effective_from(&self) -> DateTime<Utc>;
    fn effective_to(&self) -> Option<DateTime<Utc>>;

    /// Whether the row is in force at `at`; an open end means still active
    fn is_effective_at(&self, at: DateTime<Utc>) -> bool {
        self.effective_from() <= at && self.effective_to().map_or(true, |end| end > at)
    }
}

impl Versioned for crate::catalog::models::ProductCost {
    fn effective_from(&self) -> DateTime<Utc> {
        self.effective_from
    }
    fn effective_to(&self) -> Option<DateTime<Utc>> {
        self.effective_to
    }
}

impl Versioned for crate::catalog::models::ProductSectorDiscount {
    fn effective_from(&self) -> DateTime<Utc> {
        self.effective_from
    }
    fn effective_to(&self) -> Option<DateTime<Utc>> {
        self.effective_to
    }
}

/// Sector and product-sector rates with their additive combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
pub struct ResolvedDiscount {
    pub sector_rate: Decimal,
    pub product_sector_rate: Decimal,
    /// `sector_rate + product_sector_rate`, the percent shown to users
    pub combined_rate: Decimal,
}

impl ResolvedDiscount {
    pub fn new(sector_rate: Decimal, product_sector_rate: Decimal) -> Self {
        Self {
            sector_rate,
            product_sector_rate,
            combined_rate: sector_rate + product_sector_rate,
        }
    }
}

/// Picks effective rows and stacks discount rates
pub struct DiscountResolver;

impl DiscountResolver {
    /// Latest-starting row effective at `at`
    ///
    /// Writers keep at most one open row per key, but overlapping rows
    /// written before that held are tolerated by taking the newest start.
    pub fn select_effective<T: Versioned>(rows: &[T], at: DateTime<Utc>) -> Option<&T> {
        rows.iter()
            .filter(|row| row.is_effective_at(at))
            .max_by_key(|row| row.effective_from())
    }

    /// Combine a sector's base rate with an optional product override
    ///
    /// No sector means no discount at all. A missing override contributes zero.
    pub fn resolve(
        sector_rate: Option<Decimal>,
        product_sector_rate: Option<Decimal>,
    ) -> ResolvedDiscount {
        match sector_rate {
            None => ResolvedDiscount::default(),
            Some(rate) => ResolvedDiscount::new(rate, product_sector_rate.unwrap_or(Decimal::ZERO)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    struct Row {
        from: DateTime<Utc>,
        to: Option<DateTime<Utc>>,
        pct: Decimal,
    }

    impl Versioned for Row {
        fn effective_from(&self) -> DateTime<Utc> {
            self.from
        }
        fn effective_to(&self) -> Option<DateTime<Utc>> {
            self.to
        }
    }

    #[test]
    fn test_window_boundaries() {
        let now = Utc::now();
        let row = Row {
            from: now,
            to: Some(now + Duration::hours(1)),
            pct: dec!(5),
        };
        assert!(row.is_effective_at(now));
        assert!(!row.is_effective_at(now - Duration::seconds(1)));
        assert!(!row.is_effective_at(now + Duration::hours(1)));
    }

    #[test]
    fn test_latest_start_wins_among_effective() {
        let now = Utc::now();
        let rows = vec![
            Row { from: now - Duration::days(10), to: None, pct: dec!(5) },
            Row { from: now - Duration::days(2), to: None, pct: dec!(8) },
            Row { from: now - Duration::days(20), to: Some(now - Duration::days(10)), pct: dec!(1) },
            Row { from: now + Duration::days(1), to: None, pct: dec!(50) },
        ];
        let picked = DiscountResolver::select_effective(&rows, now).unwrap();
        assert_eq!(picked.pct, dec!(8));
    }

    #[test]
    fn test_closed_rows_are_ignored() {
        let now = Utc::now();
        let rows = vec![Row {
            from: now - Duration::days(3),
            to: Some(now - Duration::days(1)),
            pct: dec!(5),
        }];
        assert!(DiscountResolver::select_effective(&rows, now).is_none());

        let earlier = now - Duration::days(2);
        assert!(DiscountResolver::select_effective(&rows, earlier).is_some());
    }

    #[test]
    fn test_rates_stack_additively() {
        let d = DiscountResolver::resolve(Some(dec!(10)), Some(dec!(5)));
        assert_eq!(d.sector_rate, dec!(10));
        assert_eq!(d.product_sector_rate, dec!(5));
        assert_eq!(d.combined_rate, dec!(15));
    }

    #[test]
    fn test_missing_parts_contribute_zero() {
        assert_eq!(DiscountResolver::resolve(None, None), ResolvedDiscount::default());
        assert_eq!(DiscountResolver::resolve(None, Some(dec!(5))).combined_rate, dec!(0));
        assert_eq!(DiscountResolver::resolve(Some(dec!(12)), None).combined_rate, dec!(12));
    }
}
