//! Phone number validation.
//!
//! Accounts are keyed by a ten-digit phone number; the same rule applies at
//! registration and at login.

use std::sync::LazyLock;

use regex::Regex;

/// Ten digits, nothing else.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{10}$").expect("phone regex must compile"));

/// Validate that a phone number is exactly ten digits.
pub fn validate_phone_number(phone: &str) -> Result<(), String> {
    if PHONE_RE.is_match(phone) {
        Ok(())
    } else {
        Err(format!("'{phone}' is not a valid mobile number"))
    }
}
