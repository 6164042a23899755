// src/utils/ident.rs

use std::sync::LazyLock;

use regex::Regex;
use validator::ValidationError;

/// Opaque identifiers (user ids, stage keys, level keys).
static IDENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.:@-]{0,127}$").expect("identifier regex is valid")
});

pub fn is_identifier(value: &str) -> bool {
    IDENT_RE.is_match(value)
}

/// `validator` hook for identifier fields.
pub fn validate_identifier(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new("identifier_required"));
    }
    if !is_identifier(value) {
        return Err(ValidationError::new("identifier_malformed"));
    }
    Ok(())
}

/// `validator` hook for numeric fields that must be real numbers.
pub fn validate_finite(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::new("number_not_finite"));
    }
    Ok(())
}
