//! Contact identifier normalisation
//!
//! Email addresses and phone numbers are stored in one canonical form so that
//! uniqueness checks, OTP lookups and login all agree on the same key.

use crate::shared::error::SharedError;

/// Minimum digits accepted in a phone number
const MIN_PHONE_DIGITS: usize = 10;
/// Maximum digits accepted in a phone number (E.164)
const MAX_PHONE_DIGITS: usize = 15;

/// Normalise an email address: trimmed and lowercased
pub fn normalize_email(raw: &str) -> Result<String, SharedError> {
    let email = raw.trim().to_lowercase();

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| SharedError::validation("email", "Invalid email format"))?;

    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(SharedError::validation("email", "Invalid email format"));
    }

    Ok(email)
}

/// Normalise a phone number
///
/// Spaces, dashes, dots and parentheses are dropped. A leading `+` is kept.
pub fn normalize_phone(raw: &str) -> Result<String, SharedError> {
    let trimmed = raw.trim();
    let (plus, rest) = match trimmed.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", trimmed),
    };

    let mut digits = String::with_capacity(rest.len());
    for c in rest.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return Err(SharedError::validation("phone", "Invalid phone number")),
        }
    }

    if digits.len() < MIN_PHONE_DIGITS || digits.len() > MAX_PHONE_DIGITS {
        return Err(SharedError::validation(
            "phone",
            format!(
                "Phone number must have {}-{} digits",
                MIN_PHONE_DIGITS, MAX_PHONE_DIGITS
            ),
        ));
    }

    Ok(format!("{}{}", plus, digits))
}

/// A login identifier, either an email address or a phone number
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Email(String),
    Phone(String),
}

impl Identifier {
    /// Classify and normalise a raw login identifier
    pub fn parse(raw: &str) -> Result<Self, SharedError> {
        if raw.contains('@') {
            normalize_email(raw).map(Self::Email)
        } else {
            normalize_phone(raw).map(Self::Phone)
        }
    }
}
