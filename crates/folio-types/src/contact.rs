//! Visitor messages submitted through the public contact form.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{ValidationError, ValidationErrors, is_plausible_email, require};

/// A message as typed by a visitor, before it is stored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessageDraft {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactMessageDraft {
    pub fn new(name: impl Into<String>, email: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            message: message.into(),
        }
    }

    /// Copy with surrounding whitespace stripped from every field.
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            message: self.message.trim().to_string(),
        }
    }

    /// Validate the draft, returning a field->error map.
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        require(&mut errors, "name", &self.name);
        // The address is checked as typed; padding around it is rejected.
        if require(&mut errors, "email", &self.email) && !is_plausible_email(&self.email) {
            errors.insert(
                "email".to_string(),
                ValidationError::InvalidFormat("please enter a valid email address".to_string()),
            );
        }
        require(&mut errors, "message", &self.message);

        errors
    }
}

/// A stored visitor message as returned by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
