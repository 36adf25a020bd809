//! Input validation for API requests.
//!
//! Validators return `Result<(), String>`; handlers collect failures into
//! a `ValidationErrorBuilder` from the `error` module.

use lazy_static::lazy_static;
use regex::Regex;

use crate::states;

lazy_static! {
    /// Loose email shape check: something@something.something
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email address".to_string());
    }

    Ok(())
}

/// Validate a password. Kept deliberately lax; this service is not an
/// identity provider.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() > 128 {
        return Err("Password is too long (max 128 characters)".to_string());
    }

    Ok(())
}

/// Validate a map title. Empty is allowed; a default is applied on save.
pub fn validate_title(title: &str) -> Result<(), String> {
    if title.len() > 100 {
        return Err("Title is too long (max 100 characters)".to_string());
    }

    Ok(())
}

/// Validate a list of visited state names
pub fn validate_states(names: &[String]) -> Result<(), String> {
    for name in names {
        if !states::is_state(name) {
            return Err(format!("Unknown state name: {name}"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("first.last@sub.example.org").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
        assert!(validate_email("spaces in@x.com").is_err());
    }

    #[test]
    fn test_validate_title() {
        assert!(validate_title("").is_ok());
        assert!(validate_title("Summer 2026").is_ok());
        assert!(validate_title(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_states() {
        assert!(validate_states(&["Texas".to_string(), "Maine".to_string()]).is_ok());
        assert!(validate_states(&[]).is_ok());
        assert!(validate_states(&["texas".to_string()]).is_err());
    }
}
