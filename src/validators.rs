/// Input validators
///
/// Applied at the HTTP boundary before anything reaches the credential core:
/// 1. Email: length limits, simplified RFC 5322 format, a single `@`
/// 2. Password: bcrypt only reads the first 72 bytes, so longer input is refused
/// 3. Gobit body: length limit and profanity masking

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_BYTES: usize = 72;
pub const MAX_GOBIT_LENGTH: usize = 140;

const MASK: &str = "****";
const PROFANE_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Validates an email address and returns it trimmed
pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    let length = trimmed.chars().count();
    if length < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email".to_string(), MIN_EMAIL_LENGTH));
    }
    if length > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }

    if trimmed.contains('\0') {
        return Err(ValidationError::SuspiciousContent("email".to_string()));
    }

    if trimmed.matches('@').count() != 1 || !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates a password before hashing. The password itself is never trimmed or altered.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.trim().is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort("password".to_string(), MIN_PASSWORD_LENGTH));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::TooLong("password".to_string(), MAX_PASSWORD_BYTES));
    }
    Ok(())
}

/// Only the upper bound; /api/validate accepts an empty body.
pub fn check_body_length(body: &str) -> Result<(), ValidationError> {
    if body.chars().count() > MAX_GOBIT_LENGTH {
        return Err(ValidationError::TooLong("body".to_string(), MAX_GOBIT_LENGTH));
    }
    Ok(())
}

/// Replace profane words with `****`.
///
/// Words are whitespace-separated and compared case-insensitively; punctuation attached to
/// a word keeps it from matching. Runs of whitespace collapse to a single space.
pub fn clean_body(body: &str) -> String {
    body.split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            if PROFANE_WORDS.contains(&lower.as_str()) {
                MASK
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Validates a gobit body and returns the cleaned text to store
pub fn validate_gobit_body(body: &str) -> Result<String, ValidationError> {
    if body.trim().is_empty() {
        return Err(ValidationError::EmptyField("body".to_string()));
    }
    check_body_length(body)?;
    Ok(clean_body(body))
}
