//! Validation utilities for ReStock
//!
//! Input checks shared between the HTTP surface and the core services.
//! Validation always runs before any mutation.

use rust_decimal::Decimal;

/// Validate that a product name is non-empty after trimming
pub fn validate_product_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Product name cannot be empty");
    }
    Ok(())
}

/// Validate that a price is non-negative
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    Ok(())
}

/// Validate that a quantity is at least 1
pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity < 1 {
        return Err("Quantity must be at least 1");
    }
    Ok(())
}

/// Validate batch code format: T-NNN (zero-padded sequence, at least 3 digits)
pub fn validate_batch_code(code: &str) -> Result<(), &'static str> {
    let Some(digits) = code.strip_prefix("T-") else {
        return Err("Batch code must start with 'T-'");
    };
    if digits.len() < 3 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err("Batch code sequence must be at least 3 digits");
    }
    Ok(())
}
