use std::{collections::HashMap, fmt};

/// Field-level validation errors for visitor-facing forms.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Required,
    InvalidFormat(String),
    Other(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Required => write!(f, "This field is required"),
            ValidationError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            ValidationError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

/// Field name -> error. Empty means the input is valid.
pub type ValidationErrors = HashMap<String, ValidationError>;

/// Loose `local@domain.tld` check: no whitespace, exactly one `@`, and a dot
/// inside the domain with text on both sides.
pub fn is_plausible_email(value: &str) -> bool {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Insert `Required` for `field` when `value` is blank after trimming.
pub(crate) fn require(errors: &mut ValidationErrors, field: &str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.insert(field.to_string(), ValidationError::Required);
        false
    } else {
        true
    }
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;
