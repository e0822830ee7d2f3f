// Validation utilities module
// Custom validation functions for listing-specific rules

use rust_decimal::Decimal;
use validator::ValidationError;

/// Validates that a money amount is strictly positive
pub fn validate_positive_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price <= Decimal::ZERO {
        Err(ValidationError::new("price_must_be_positive"))
    } else {
        Ok(())
    }
}

/// Validates that a discount percentage is between 0 and 100 inclusive
pub fn validate_discount_percentage(discount: &Decimal) -> Result<(), ValidationError> {
    if *discount < Decimal::ZERO || *discount > Decimal::from(100) {
        Err(ValidationError::new("discount_out_of_range"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_positive_price() {
        assert!(validate_positive_price(&dec!(0.01)).is_ok());
        assert!(validate_positive_price(&dec!(0)).is_err());
        assert!(validate_positive_price(&dec!(-5)).is_err());
    }

    #[test]
    fn test_discount_percentage_bounds() {
        assert!(validate_discount_percentage(&dec!(0)).is_ok());
        assert!(validate_discount_percentage(&dec!(100)).is_ok());
        assert!(validate_discount_percentage(&dec!(100.01)).is_err());
        assert!(validate_discount_percentage(&dec!(-0.01)).is_err());
    }
}
