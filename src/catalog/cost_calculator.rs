use rust_decimal::Decimal;

use crate::catalog::{error::CatalogError, models::SetCostRequest};
use crate::validation::MAX_AMOUNT;

/// Derived values of the landed cost build-up, all in GBP unless suffixed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostBreakdown {
    pub purchasing_cost_gbp: Decimal,
    pub cost_buffer_gbp: Decimal,
    pub adjusted_purchasing_cost_gbp: Decimal,
    pub weight_kg_buffered: Decimal,
    pub freight_foreign: Decimal,
    pub freight_gbp: Decimal,
    pub import_duty_gbp: Decimal,
    pub wholesale_cost_gbp: Decimal,
}

/// Converts purchase-side inputs into a landed wholesale cost
pub struct CostCalculator;

impl CostCalculator {
    /// Run the cost build-up
    ///
    /// ```text
    /// purchase      = cost_foreign / rate
    /// adjusted      = purchase * (1 + buffer%)
    /// freight_fx    = freight_per_kg * kg * (1 + weight_buffer%) + freight_buffer_fx
    /// wholesale     = adjusted + freight_fx / rate + adjusted * duty% + packaging
    /// ```
    ///
    /// The exchange rate divides, so it must be strictly positive.
    pub fn calculate(input: &SetCostRequest) -> Result<CostBreakdown, CatalogError> {
        if input.exchange_rate <= Decimal::ZERO {
            return Err(CatalogError::InvalidInput(format!(
                "Exchange rate must be greater than zero, got {}",
                input.exchange_rate
            )));
        }

        let overflow = || {
            CatalogError::InvalidInput(format!(
                "Cost inputs are too large to calculate at exchange rate {}",
                input.exchange_rate
            ))
        };
        let hundred = Decimal::ONE_HUNDRED;
        let rate = input.exchange_rate;

        let purchasing_cost_gbp = input
            .purchasing_cost_foreign
            .checked_div(rate)
            .ok_or_else(overflow)?;
        let cost_buffer_gbp = purchasing_cost_gbp
            .checked_mul(input.purchasing_cost_buffer_percent / hundred)
            .ok_or_else(overflow)?;
        let adjusted_purchasing_cost_gbp = purchasing_cost_gbp
            .checked_add(cost_buffer_gbp)
            .ok_or_else(overflow)?;

        let weight_kg_buffered = (input.weight_g / Decimal::ONE_THOUSAND)
            .checked_mul(Decimal::ONE + input.weight_buffer_percent / hundred)
            .ok_or_else(overflow)?;
        let freight_foreign = input
            .freight_rate_per_kg
            .checked_mul(weight_kg_buffered)
            .and_then(|f| f.checked_add(input.freight_buffer_foreign))
            .ok_or_else(overflow)?;
        let freight_gbp = freight_foreign.checked_div(rate).ok_or_else(overflow)?;

        let import_duty_gbp = adjusted_purchasing_cost_gbp
            .checked_mul(input.import_duty_percent / hundred)
            .ok_or_else(overflow)?;

        let wholesale_cost_gbp = adjusted_purchasing_cost_gbp
            .checked_add(freight_gbp)
            .and_then(|c| c.checked_add(import_duty_gbp))
            .and_then(|c| c.checked_add(input.packaging_gbp))
            .ok_or_else(overflow)?;

        // Every derived amount is stored in a NUMERIC(12,4) column
        if wholesale_cost_gbp > MAX_AMOUNT || freight_foreign > MAX_AMOUNT {
            return Err(CatalogError::InvalidInput(format!(
                "Wholesale cost {} is larger than can be stored",
                wholesale_cost_gbp.round_dp(4)
            )));
        }

        Ok(CostBreakdown {
            purchasing_cost_gbp,
            cost_buffer_gbp,
            adjusted_purchasing_cost_gbp,
            weight_kg_buffered,
            freight_foreign,
            freight_gbp,
            import_duty_gbp,
            wholesale_cost_gbp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_input() -> SetCostRequest {
        SetCostRequest {
            exchange_rate: dec!(10),
            purchasing_cost_foreign: dec!(100),
            unit_weight_g: dec!(250),
            purchasing_cost_buffer_percent: dec!(10),
            weight_g: dec!(500),
            weight_buffer_percent: dec!(20),
            freight_rate_per_kg: dec!(50),
            freight_buffer_foreign: dec!(5),
            import_duty_percent: dec!(4),
            packaging_gbp: dec!(0.50),
            direct_retail_price_gbp: dec!(25),
        }
    }

    #[test]
    fn test_worked_example() {
        let cost = CostCalculator::calculate(&sample_input()).unwrap();

        assert_eq!(cost.purchasing_cost_gbp, dec!(10));
        assert_eq!(cost.cost_buffer_gbp, dec!(1));
        assert_eq!(cost.adjusted_purchasing_cost_gbp, dec!(11));
        assert_eq!(cost.weight_kg_buffered, dec!(0.6));
        // 50 * 0.6 + 5
        assert_eq!(cost.freight_foreign, dec!(35));
        assert_eq!(cost.freight_gbp, dec!(3.5));
        assert_eq!(cost.import_duty_gbp, dec!(0.44));
        // 11 + 3.5 + 0.44 + 0.5
        assert_eq!(cost.wholesale_cost_gbp, dec!(15.44));
    }

    #[test]
    fn test_zero_inputs_cost_nothing() {
        let input = SetCostRequest {
            exchange_rate: dec!(1),
            ..Default::default()
        };
        let cost = CostCalculator::calculate(&input).unwrap();
        assert_eq!(cost.wholesale_cost_gbp, Decimal::ZERO);
    }

    #[test]
    fn test_packaging_only() {
        let input = SetCostRequest {
            exchange_rate: dec!(9.8),
            packaging_gbp: dec!(1.25),
            ..Default::default()
        };
        assert_eq!(
            CostCalculator::calculate(&input).unwrap().wholesale_cost_gbp,
            dec!(1.25)
        );
    }

    #[test]
    fn test_tiny_rate_with_huge_cost_is_rejected() {
        let input = SetCostRequest {
            exchange_rate: dec!(0.0000000001),
            purchasing_cost_foreign: dec!(100000000000000000000),
            ..Default::default()
        };
        assert!(matches!(
            CostCalculator::calculate(&input),
            Err(CatalogError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_cost_beyond_column_range_is_rejected() {
        let input = SetCostRequest {
            exchange_rate: dec!(0.0001),
            purchasing_cost_foreign: dec!(50000),
            ..Default::default()
        };
        // 50000 / 0.0001 = 500 million pounds
        assert!(matches!(
            CostCalculator::calculate(&input),
            Err(CatalogError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_non_positive_exchange_rate_rejected() {
        for rate in [dec!(0), dec!(-1), dec!(-0.0001)] {
            let input = SetCostRequest {
                exchange_rate: rate,
                ..sample_input()
            };
            assert!(matches!(
                CostCalculator::calculate(&input),
                Err(CatalogError::InvalidInput(_))
            ));
        }
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn cents(v: u32) -> Decimal {
        Decimal::new(v as i64, 2)
    }

    proptest! {
        /// Wholesale cost is the sum of its components and never negative
        #[test]
        fn prop_wholesale_is_sum_of_parts(
            rate in 100u32..=100_000u32,
            cost in 0u32..=1_000_000u32,
            buffer in 0u32..=5_000u32,
            weight in 0u32..=100_000u32,
            weight_buffer in 0u32..=5_000u32,
            freight in 0u32..=100_000u32,
            freight_buffer in 0u32..=10_000u32,
            duty in 0u32..=5_000u32,
            packaging in 0u32..=10_000u32,
        ) {
            let input = SetCostRequest {
                exchange_rate: cents(rate),
                purchasing_cost_foreign: cents(cost),
                purchasing_cost_buffer_percent: cents(buffer),
                weight_g: Decimal::from(weight),
                weight_buffer_percent: cents(weight_buffer),
                freight_rate_per_kg: cents(freight),
                freight_buffer_foreign: cents(freight_buffer),
                import_duty_percent: cents(duty),
                packaging_gbp: cents(packaging),
                ..Default::default()
            };

            let c = CostCalculator::calculate(&input).unwrap();
            prop_assert_eq!(
                c.wholesale_cost_gbp,
                c.adjusted_purchasing_cost_gbp + c.freight_gbp + c.import_duty_gbp + input.packaging_gbp
            );
            prop_assert!(c.wholesale_cost_gbp >= Decimal::ZERO);
            prop_assert!(c.adjusted_purchasing_cost_gbp >= c.purchasing_cost_gbp);
        }

        #[test]
        fn prop_non_positive_rate_always_fails(rate in -100_000i64..=0i64) {
            let input = SetCostRequest {
                exchange_rate: Decimal::new(rate, 2),
                purchasing_cost_foreign: Decimal::ONE,
                ..Default::default()
            };
            prop_assert!(CostCalculator::calculate(&input).is_err());
        }
    }
}
