use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::{discount_resolver::ResolvedDiscount, error::CatalogError, models::ProductCost};

/// Priced order line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LinePrice {
    pub product_id: i32,
    pub quantity: Decimal,
    pub base_price: Decimal,
    pub sector_rate: Decimal,
    pub product_sector_rate: Decimal,
    pub unit_price: Decimal,
    /// Displayed percent, `sector_rate + product_sector_rate`
    pub discount_percent: Decimal,
    pub discount_amount: Decimal,
    pub line_total: Decimal,
}

/// Order level sums over priced lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
}

/// Pure pricing arithmetic
///
/// The displayed discount is the sum of the two rates while the unit price
/// applies them one after the other. Both are kept as-is because existing
/// totals depend on them.
pub struct PricingEngine;

impl PricingEngine {
    /// Direct retail price when set, else the wholesale cost
    pub fn base_price(cost: &ProductCost) -> Decimal {
        if cost.direct_retail_price_gbp > Decimal::ZERO {
            cost.direct_retail_price_gbp
        } else {
            cost.wholesale_cost_gbp
        }
    }

    /// `base * (1 - S/100) * (1 - P/100)`
    ///
    /// Both inputs come from stored columns (a NUMERIC(12,4) price and rates
    /// of at most 100), so the product stays well inside `Decimal` range.
    pub fn unit_price(base_price: Decimal, discount: &ResolvedDiscount) -> Decimal {
        let hundred = Decimal::ONE_HUNDRED;
        let after_sector = base_price * (Decimal::ONE - discount.sector_rate / hundred);
        after_sector * (Decimal::ONE - discount.product_sector_rate / hundred)
    }

    /// Price one line, failing instead of overflowing on absurd quantities
    pub fn price_line(
        product_id: i32,
        base_price: Decimal,
        quantity: Decimal,
        discount: &ResolvedDiscount,
    ) -> Result<LinePrice, CatalogError> {
        let overflow = || {
            CatalogError::InvalidInput(format!(
                "Line for product {} is too large to price (quantity {})",
                product_id, quantity
            ))
        };

        let unit_price = Self::unit_price(base_price, discount);
        let discount_amount = (base_price * (discount.combined_rate / Decimal::ONE_HUNDRED))
            .checked_mul(quantity)
            .ok_or_else(overflow)?;
        let line_total = unit_price.checked_mul(quantity).ok_or_else(overflow)?;

        Ok(LinePrice {
            product_id,
            quantity,
            base_price,
            sector_rate: discount.sector_rate,
            product_sector_rate: discount.product_sector_rate,
            unit_price,
            discount_percent: discount.combined_rate,
            discount_amount,
            line_total,
        })
    }

    /// Subtotal is the undiscounted sum; total subtracts the line discounts
    pub fn totals(lines: &[LinePrice]) -> Result<OrderTotals, CatalogError> {
        let overflow = || CatalogError::InvalidInput("Order total is too large".to_string());

        let mut subtotal = Decimal::ZERO;
        let mut discount_amount = Decimal::ZERO;
        for line in lines {
            let gross = line.base_price.checked_mul(line.quantity).ok_or_else(overflow)?;
            subtotal = subtotal.checked_add(gross).ok_or_else(overflow)?;
            discount_amount = discount_amount
                .checked_add(line.discount_amount)
                .ok_or_else(overflow)?;
        }

        Ok(OrderTotals {
            subtotal,
            discount_amount,
            total: subtotal - discount_amount,
        })
    }
}
