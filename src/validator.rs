//! # Form Validation
//!
//! Reusable rule predicates plus an error accumulator that any form can embed.
//!
//! A form runs its checks after it has been decoded, then asks the
//! [`Validator`] whether everything passed. Nothing here touches the request
//! or the response: failed rules are collected and rendered back to the user
//! alongside the values they submitted.

use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Rough shape check for email addresses (the same pattern browsers use for
/// `<input type="email">`).
pub static EMAIL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern is valid")
});

/// Accumulated validation errors for one form submission
///
/// Serialized into the template data so pages can show errors inline:
/// `form.field_errors.title` and `form.non_field_errors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Validator {
    /// First error message recorded for each field
    pub field_errors: HashMap<String, String>,

    /// Errors that are not tied to a single field, in the order they were added
    pub non_field_errors: Vec<String>,
}

impl Validator {
    /// Returns true when no field or non-field errors were recorded.
    pub fn valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    /// Record `message` for `key` unless the field already has an error.
    pub fn add_field_error(&mut self, key: &str, message: &str) {
        self.field_errors
            .entry(key.to_string())
            .or_insert_with(|| message.to_string());
    }

    /// Record `message` for `key` only if the check did not pass.
    ///
    /// Checks for the same field are usually written from the most basic to
    /// the most specific, so keeping the first failure gives the user the
    /// most useful message.
    pub fn check_field(&mut self, ok: bool, key: &str, message: &str) {
        if !ok {
            self.add_field_error(key, message);
        }
    }

    pub fn add_non_field_error(&mut self, message: &str) {
        self.non_field_errors.push(message.to_string());
    }
}

/// True if the value contains something other than whitespace.
pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// True if the value has at most `n` characters (not bytes).
pub fn max_chars(value: &str, n: usize) -> bool {
    value.chars().count() <= n
}

/// True if the value has at least `n` characters (not bytes).
pub fn min_chars(value: &str, n: usize) -> bool {
    value.chars().count() >= n
}

/// True if the value is one of `permitted`.
pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}

pub fn matches(value: &str, rx: &Regex) -> bool {
    rx.is_match(value)
}
