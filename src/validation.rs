// Validation utilities module
// Custom field validators used by the request DTOs

use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;
use validator::ValidationError;

fn currency_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{3}$").expect("static regex"))
}

fn pin_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{4,6}$").expect("static regex"))
}

/// Value must be zero or greater
pub fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        Err(ValidationError::new("must_not_be_negative"))
    } else {
        Ok(())
    }
}

/// Value must be strictly greater than zero
pub fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        Err(ValidationError::new("must_be_positive"))
    } else {
        Ok(())
    }
}

/// Percentages are accepted in the closed range 0..=100
pub fn validate_percent(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > Decimal::ONE_HUNDRED {
        Err(ValidationError::new("percent_out_of_range"))
    } else {
        Ok(())
    }
}

/// Largest value a NUMERIC(12,4) money column holds
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 4);

/// Largest value a NUMERIC(12,3) quantity or weight column holds
pub const MAX_QUANTITY: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 3);

/// Largest value a NUMERIC(7,4) percentage column holds
pub const MAX_STORED_PERCENT: Decimal = Decimal::from_parts(9_999_999, 0, 0, false, 4);

/// Smallest accepted exchange rate
pub const MIN_EXCHANGE_RATE: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// Money amount between zero and what the money columns can store
pub fn validate_amount(value: &Decimal) -> Result<(), ValidationError> {
    validate_non_negative(value)?;
    if *value > MAX_AMOUNT {
        return Err(ValidationError::new("amount_too_large"));
    }
    Ok(())
}

/// Strictly positive quantity that fits a quantity column
pub fn validate_quantity(value: &Decimal) -> Result<(), ValidationError> {
    validate_positive(value)?;
    if *value > MAX_QUANTITY {
        return Err(ValidationError::new("quantity_too_large"));
    }
    Ok(())
}

/// Zero or more, up to what a quantity column can store
pub fn validate_stock_quantity(value: &Decimal) -> Result<(), ValidationError> {
    validate_non_negative(value)?;
    if *value > MAX_QUANTITY {
        return Err(ValidationError::new("quantity_too_large"));
    }
    Ok(())
}

/// Buffers and duty may exceed 100% but must fit their columns
pub fn validate_buffer_percent(value: &Decimal) -> Result<(), ValidationError> {
    validate_non_negative(value)?;
    if *value > MAX_STORED_PERCENT {
        return Err(ValidationError::new("percent_too_large"));
    }
    Ok(())
}

/// Foreign units per pound, kept within a range the cost build-up can divide by
pub fn validate_exchange_rate(value: &Decimal) -> Result<(), ValidationError> {
    if *value < MIN_EXCHANGE_RATE || *value > MAX_AMOUNT {
        return Err(ValidationError::new("exchange_rate_out_of_range"));
    }
    Ok(())
}

/// ISO 4217 style code: exactly three upper-case letters
pub fn validate_currency_code(code: &str) -> Result<(), ValidationError> {
    if currency_code_regex().is_match(code) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_currency_code"))
    }
}

/// PINs are 4 to 6 digits
pub fn validate_pin(pin: &str) -> Result<(), ValidationError> {
    if pin_regex().is_match(pin) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_pin"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_non_negative() {
        assert!(validate_non_negative(&dec!(0)).is_ok());
        assert!(validate_non_negative(&dec!(-0.00)).is_ok());
        assert!(validate_non_negative(&dec!(12.5)).is_ok());
        assert!(validate_non_negative(&dec!(-0.01)).is_err());
    }

    #[test]
    fn test_positive() {
        assert!(validate_positive(&dec!(0.0001)).is_ok());
        assert!(validate_positive(&dec!(0)).is_err());
        assert!(validate_positive(&dec!(-3)).is_err());
    }

    #[test]
    fn test_percent_bounds() {
        assert!(validate_percent(&dec!(0)).is_ok());
        assert!(validate_percent(&dec!(100)).is_ok());
        assert!(validate_percent(&dec!(100.01)).is_err());
        assert!(validate_percent(&dec!(-1)).is_err());
    }

    #[test]
    fn test_bounds_follow_column_sizes() {
        assert_eq!(MAX_AMOUNT, dec!(99999999.9999));
        assert_eq!(MAX_QUANTITY, dec!(999999999.999));
        assert_eq!(MAX_STORED_PERCENT, dec!(999.9999));
        assert_eq!(MIN_EXCHANGE_RATE, dec!(0.0001));
    }

    #[test]
    fn test_amount_bounds() {
        assert!(validate_amount(&dec!(0)).is_ok());
        assert!(validate_amount(&dec!(99999999.9999)).is_ok());
        assert!(validate_amount(&dec!(100000000)).is_err());
        assert!(validate_amount(&dec!(100000000000000000000)).is_err());
        assert!(validate_amount(&dec!(-0.5)).is_err());
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(validate_quantity(&dec!(0.001)).is_ok());
        assert!(validate_quantity(&dec!(0)).is_err());
        assert!(validate_quantity(&dec!(10000000000000000000000000000)).is_err());
        assert!(validate_stock_quantity(&dec!(0)).is_ok());
        assert!(validate_stock_quantity(&dec!(1000000000)).is_err());
    }

    #[test]
    fn test_exchange_rate_bounds() {
        assert!(validate_exchange_rate(&dec!(9.8)).is_ok());
        assert!(validate_exchange_rate(&dec!(0.0001)).is_ok());
        assert!(validate_exchange_rate(&dec!(0.0000000001)).is_err());
        assert!(validate_exchange_rate(&dec!(0)).is_err());
        assert!(validate_exchange_rate(&dec!(-2)).is_err());
    }

    #[test]
    fn test_buffer_percent_bounds() {
        assert!(validate_buffer_percent(&dec!(150)).is_ok());
        assert!(validate_buffer_percent(&dec!(1000)).is_err());
    }

    #[test]
    fn test_currency_code() {
        assert!(validate_currency_code("HKD").is_ok());
        assert!(validate_currency_code("hkd").is_err());
        assert!(validate_currency_code("HKDX").is_err());
        assert!(validate_currency_code("").is_err());
    }

    #[test]
    fn test_pin() {
        assert!(validate_pin("1234").is_ok());
        assert!(validate_pin("123456").is_ok());
        assert!(validate_pin("123").is_err());
        assert!(validate_pin("1234567").is_err());
        assert!(validate_pin("12a4").is_err());
    }
}
