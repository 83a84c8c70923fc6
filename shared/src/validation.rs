//! Validation utilities for the Product Tracker

use crate::{order_sequence, MAX_RECEIVE_DIGITS};

// ============================================================================
// Line Validations
// ============================================================================

/// Validate an ordered or received quantity
pub fn validate_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate a product number (non-blank, no surrounding whitespace)
pub fn validate_product_number(product_number: &str) -> Result<(), &'static str> {
    if product_number.trim().is_empty() {
        return Err("Product number is required");
    }
    if product_number.trim() != product_number {
        return Err("Product number must not start or end with whitespace");
    }
    Ok(())
}

/// Validate a color name
pub fn validate_color(color: &str) -> Result<(), &'static str> {
    if color.trim().is_empty() {
        return Err("Color is required");
    }
    Ok(())
}

// ============================================================================
// Identifier Validations
// ============================================================================

/// Validate an order number has a numeric suffix ("VVI-42")
pub fn validate_order_number(order_number: &str) -> Result<(), &'static str> {
    match order_sequence(order_number) {
        Some(n) if n > 0 => Ok(()),
        _ => Err("Order number must end in a positive sequence number"),
    }
}

/// Validate a receive number ("RCV-0001")
pub fn validate_receive_number(receive_number: &str) -> Result<(), &'static str> {
    let Some((prefix, digits)) = receive_number.rsplit_once('-') else {
        return Err("Receive number must look like PREFIX-0001");
    };
    if prefix.is_empty() || digits.len() < 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err("Receive number must look like PREFIX-0001");
    }
    if digits.len() > MAX_RECEIVE_DIGITS {
        return Err("Receive number suffix is too long");
    }
    Ok(())
}

/// Validate an ISO week id ("2024-07")
pub fn validate_week_id(week_id: &str) -> Result<(), &'static str> {
    let Some((year, week)) = week_id.split_once('-') else {
        return Err("Week id must be YYYY-WW");
    };
    if year.len() != 4 || week.len() != 2 {
        return Err("Week id must be YYYY-WW");
    }
    match (year.parse::<i32>(), week.parse::<u32>()) {
        (Ok(_), Ok(w)) if (1..=53).contains(&w) => Ok(()),
        _ => Err("Week id must be YYYY-WW"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-4).is_err());
    }

    #[test]
    fn test_validate_product_number() {
        assert!(validate_product_number("P-100").is_ok());
        assert!(validate_product_number("   ").is_err());
        assert!(validate_product_number(" P-100").is_err());
    }

    #[test]
    fn test_validate_color() {
        assert!(validate_color("Golden").is_ok());
        assert!(validate_color("").is_err());
    }

    #[test]
    fn test_validate_order_number() {
        assert!(validate_order_number("VVI-1").is_ok());
        assert!(validate_order_number("VVI-0").is_err());
        assert!(validate_order_number("VVI").is_err());
    }

    #[test]
    fn test_validate_receive_number() {
        assert!(validate_receive_number("RCV-0001").is_ok());
        assert!(validate_receive_number("RCV-12345").is_ok());
        assert!(validate_receive_number("RCV-12").is_err());
        assert!(validate_receive_number("-0001").is_err());
        assert!(validate_receive_number("RCV0001").is_err());
        assert!(validate_receive_number("RCV-999999999999999999").is_ok());
        assert!(validate_receive_number("RCV-4294967296").is_ok());
        assert!(validate_receive_number("RCV-1000000000000000000").is_err());
    }

    #[test]
    fn test_validate_week_id() {
        assert!(validate_week_id("2024-07").is_ok());
        assert!(validate_week_id("2020-53").is_ok());
        assert!(validate_week_id("2024-54").is_err());
        assert!(validate_week_id("2024-7").is_err());
        assert!(validate_week_id("24-07").is_err());
    }
}
