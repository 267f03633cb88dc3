//! Input validation utilities

use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate that both password fields of a registration match
pub fn validate_password_confirmation(password: &str, confirm: &str) -> Result<(), String> {
    if password != confirm {
        return Err("Passwords do not match".to_string());
    }

    Ok(())
}

/// Validate product name
pub fn validate_product_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Product name is required".to_string());
    }

    if name.len() > 255 {
        return Err("Product name must be at most 255 characters long".to_string());
    }

    Ok(())
}

/// Validate product price
pub fn validate_price(price: Decimal) -> Result<(), String> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative".to_string());
    }

    Ok(())
}

/// Validate product stock against a lower bound
///
/// Creation requires at least 1; updates allow 0 because purchases drive
/// stock down to 0.
pub fn validate_stock(stock: i32, minimum: i32) -> Result<(), String> {
    if stock < minimum {
        return Err(format!("Stock must be at least {minimum}"));
    }

    Ok(())
}
