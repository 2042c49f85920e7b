use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::currency::models::{CurrencyRate, RatesFeed, UpdatedBy};

/// Currency every rate is quoted against
pub const BASE_CURRENCY: &str = "GBP";

/// A row the sync will upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateWrite {
    pub currency_code: String,
    pub rate_to_gbp: Decimal,
    pub is_pinned: bool,
}

/// Merge rules between the feed and the stored rates
pub struct RateSync;

impl RateSync {
    /// Rows to write for one sync, base currency first then by code
    ///
    /// - GBP is always 1.0 and pinned, unless a manual row chose otherwise
    /// - Non-positive or malformed entries are skipped
    /// - A stored rate keeps its pin only if it was pinned manually
    /// - New rates start unpinned
    pub fn plan(feed: &RatesFeed, existing: &HashMap<String, CurrencyRate>) -> Vec<RateWrite> {
        let base_pinned = match existing.get(BASE_CURRENCY) {
            Some(row) if row.updated_by == UpdatedBy::Manual => row.is_pinned,
            _ => true,
        };

        let mut writes = vec![RateWrite {
            currency_code: BASE_CURRENCY.to_string(),
            rate_to_gbp: Decimal::ONE,
            is_pinned: base_pinned,
        }];

        for (code, rate) in &feed.rates {
            if code == BASE_CURRENCY || *rate <= Decimal::ZERO || !Self::is_code(code) {
                continue;
            }
            let is_pinned = existing
                .get(code)
                .map(|row| row.updated_by == UpdatedBy::Manual && row.is_pinned)
                .unwrap_or(false);
            writes.push(RateWrite {
                currency_code: code.clone(),
                rate_to_gbp: *rate,
                is_pinned,
            });
        }

        writes
    }

    fn is_code(code: &str) -> bool {
        code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase())
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    proptest! {
        /// Every written rate is positive and GBP appears exactly once at 1.0
        #[test]
        fn prop_writes_are_positive(
            rates in prop::collection::btree_map("[A-Z]{3}", -1000i64..100_000, 0..20)
        ) {
            let feed = RatesFeed {
                base: "GBP".into(),
                date: None,
                rates: rates
                    .into_iter()
                    .map(|(c, r)| (c, Decimal::new(r, 2)))
                    .collect::<BTreeMap<_, _>>(),
            };
            let writes = RateSync::plan(&feed, &HashMap::new());
            prop_assert!(writes.iter().all(|w| w.rate_to_gbp > Decimal::ZERO));
            let gbp: Vec<_> = writes.iter().filter(|w| w.currency_code == BASE_CURRENCY).collect();
            prop_assert_eq!(gbp.len(), 1);
            prop_assert_eq!(gbp[0].rate_to_gbp, Decimal::ONE);
            prop_assert!(writes.iter().skip(1).all(|w| !w.is_pinned));
        }
    }
}
