//! Validation utilities for contact addresses
//!
//! Targets come from supplier records maintained by hand, so they are checked
//! before any transport call is made. Email syntax is checked by the email
//! provider itself; this module covers phone numbers and log masking.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Validation errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid phone number: {0}")]
    InvalidPhoneNumber(String),
}

pub type ValidationResult<T> = Result<T, ValidationError>;

fn phone_regex() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(r"^\+?[1-9][0-9]{6,14}$").expect("phone pattern is a valid regex"))
}

/// Validate a phone number and return it in compact international form.
///
/// Spaces, dashes, dots and parentheses are stripped; anything else that is
/// not a digit or a leading `+` makes the number invalid.
pub fn validate_phone_number(phone: &str) -> ValidationResult<String> {
    let cleaned: String = phone
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    if cleaned.is_empty() {
        return Err(ValidationError::InvalidPhoneNumber(
            "Phone number cannot be empty".to_string(),
        ));
    }

    if !phone_regex().is_match(&cleaned) {
        return Err(ValidationError::InvalidPhoneNumber(mask_contact(phone)));
    }

    if cleaned.starts_with('+') {
        Ok(cleaned)
    } else {
        Ok(format!("+{}", cleaned))
    }
}

/// Mask a contact address for logs and error messages.
///
/// Emails keep the first character of the local part and the domain
/// (`j***@example.com`); anything else keeps its last four characters.
pub fn mask_contact(address: &str) -> String {
    let address = address.trim();
    if let Some((local, domain)) = address.rsplit_once('@') {
        let first: String = local.chars().take(1).collect();
        return format!("{}***@{}", first, domain);
    }

    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 4 {
        return "***".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("***{}", tail)
}
