//! Domain model for owners, pets, and the addresses they share.
//!
//! # Responsibility
//! - Define canonical records used by the rules engine and coordinator.
//! - Own field validation and canonicalization for inbound values.
//! - Keep the owner/pet relationship as two id-sets mutated together.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Deletion is represented by the one-way `is_deceased` flag, never by
//!   removing rows.
//! - Entities reference each other by id only; no embedded object graphs.

pub mod address;
pub mod link;
pub mod owner;
pub mod pet;

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Field-level validation failure for inbound owner/pet/address values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty after trim.
    BlankField(&'static str),
    /// Age must be strictly positive.
    NonPositiveAge(&'static str),
    /// Gender value is not one of `MALE|FEMALE|OTHER`.
    UnknownGender(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "`{field}` must not be blank"),
            Self::NonPositiveAge(field) => write!(f, "`{field}` must be positive"),
            Self::UnknownGender(value) => write!(
                f,
                "unrecognized gender `{value}`; expected MALE|FEMALE|OTHER"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Trims `value` and rejects it when nothing remains.
pub fn require_text(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(trimmed.to_string())
}

/// Rejects zero ages.
pub fn require_positive_age(age: u32, field: &'static str) -> Result<u32, ValidationError> {
    if age == 0 {
        return Err(ValidationError::NonPositiveAge(field));
    }
    Ok(age)
}

/// Collapses internal whitespace runs to one space and trims the ends.
pub(crate) fn collapse_whitespace(value: &str) -> String {
    WHITESPACE_RE.replace_all(value.trim(), " ").into_owned()
}
