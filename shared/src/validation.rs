//! Validation utilities shared by the backend and the WASM client
//!
//! Field-level checks live on the input structs via `validator`; the
//! cross-field business rules live here so both sides agree on them.

use rust_decimal::Decimal;

// ============================================================================
// Money and Quantity Validations
// ============================================================================

/// Validate a monetary amount is positive.
pub fn validate_positive_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount <= Decimal::ZERO {
        return Err("Amount must be greater than zero");
    }
    Ok(())
}

/// Validate a price field. Zero is allowed while a product is being
/// set up; negative never is.
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    Ok(())
}

/// Validate a sale or order line quantity.
pub fn validate_line_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be greater than zero");
    }
    Ok(())
}

/// Validate a payment against the outstanding balance on its order.
pub fn validate_payment_amount(amount: Decimal, balance_due: Decimal) -> Result<(), &'static str> {
    validate_positive_amount(amount)?;
    if amount > balance_due {
        return Err("Payment amount exceeds balance due");
    }
    Ok(())
}

/// Validate a percentage rate (tax, discount) is between 0 and 100.
pub fn validate_rate_percent(rate: Decimal) -> Result<(), &'static str> {
    if rate < Decimal::ZERO || rate > Decimal::from(100) {
        return Err("Rate must be between 0 and 100");
    }
    Ok(())
}

// ============================================================================
// Catalog Validations
// ============================================================================

/// Validate a SKU: 3-20 characters, uppercase alphanumeric with dashes.
pub fn validate_sku(sku: &str) -> Result<(), &'static str> {
    if sku.len() < 3 {
        return Err("SKU must be at least 3 characters");
    }
    if sku.len() > 20 {
        return Err("SKU must be at most 20 characters");
    }
    if !sku
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("SKU must be uppercase alphanumeric with dashes only");
    }
    Ok(())
}

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate a phone number: 7-15 digits once separators are stripped.
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 7 || digits.len() > 15 {
        return Err("Invalid phone number");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    // ========================================================================
    // Money and Quantity Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_positive_amount() {
        assert!(validate_positive_amount(dec("0.01")).is_ok());
        assert!(validate_positive_amount(Decimal::ZERO).is_err());
        assert!(validate_positive_amount(dec("-5")).is_err());
    }

    #[test]
    fn test_validate_price_allows_zero() {
        assert!(validate_price(Decimal::ZERO).is_ok());
        assert!(validate_price(dec("19.99")).is_ok());
        assert!(validate_price(dec("-0.01")).is_err());
    }

    #[test]
    fn test_validate_line_quantity() {
        assert!(validate_line_quantity(dec("1")).is_ok());
        assert!(validate_line_quantity(dec("0.5")).is_ok());
        assert!(validate_line_quantity(Decimal::ZERO).is_err());
        assert!(validate_line_quantity(dec("-2")).is_err());
    }

    #[test]
    fn test_validate_payment_amount() {
        assert!(validate_payment_amount(dec("50"), dec("100")).is_ok());
        assert!(validate_payment_amount(dec("100"), dec("100")).is_ok());
        assert!(validate_payment_amount(dec("100.01"), dec("100")).is_err());
        assert!(validate_payment_amount(Decimal::ZERO, dec("100")).is_err());
    }

    #[test]
    fn test_validate_rate_percent() {
        assert!(validate_rate_percent(Decimal::ZERO).is_ok());
        assert!(validate_rate_percent(dec("7.5")).is_ok());
        assert!(validate_rate_percent(dec("100")).is_ok());
        assert!(validate_rate_percent(dec("100.1")).is_err());
        assert!(validate_rate_percent(dec("-1")).is_err());
    }

    // ========================================================================
    // Catalog Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_sku_valid() {
        assert!(validate_sku("ESP").is_ok());
        assert!(validate_sku("COF-250G").is_ok());
        assert!(validate_sku("A1B2C3D4E5F6G7H8I9J0").is_ok());
    }

    #[test]
    fn test_validate_sku_invalid() {
        assert!(validate_sku("AB").is_err()); // Too short
        assert!(validate_sku("A1B2C3D4E5F6G7H8I9J0X").is_err()); // Too long
        assert!(validate_sku("cof-250g").is_err()); // Lowercase
        assert!(validate_sku("COF 250").is_err()); // Space
    }

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name@domain.co").is_ok());
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("no@domain").is_err());
        assert!(validate_email("@.").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("0812345678").is_ok());
        assert!(validate_phone("+1 (555) 123-4567").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("1234567890123456").is_err());
    }
}
