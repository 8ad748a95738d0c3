//! Request payload validation.
//!
//! Validators collect every violation instead of stopping at the first, so
//! the client can fix a whole form in one round trip. The HTTP layer turns
//! the collected list into a 400 whose `message` is the first violation and
//! whose `errors` array carries all of them.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Violations {
    errors: Vec<FieldError>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, format!("{field} is required"));
        }
    }

    pub fn require_positive(&mut self, field: &str, value: f64) {
        if !(value > 0.0) {
            self.add(field, format!("{field} must be greater than zero"));
        }
    }

    pub fn require_non_negative(&mut self, field: &str, value: f64) {
        if value < 0.0 {
            self.add(field, format!("{field} must not be negative"));
        }
    }

    pub fn check_email(&mut self, field: &str, value: Option<&str>) {
        if let Some(email) = value {
            if !email.is_empty() && !email_regex().is_match(email) {
                self.add(field, "invalid email address");
            }
        }
    }

    pub fn check_phone(&mut self, field: &str, value: Option<&str>) {
        if let Some(phone) = value {
            if !phone.is_empty() && !phone_regex().is_match(phone) {
                self.add(field, "invalid phone number");
            }
        }
    }

    /// `YYYY-MM` month stamp used by salary records.
    pub fn check_month(&mut self, field: &str, value: &str) {
        if !month_regex().is_match(value) {
            self.add(field, "expected YYYY-MM");
        }
    }

    pub fn into_result(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?[0-9][0-9 \-]{5,17}$").unwrap())
}

fn month_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").unwrap())
}
