//! Contact form submissions.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ContactSubmissionId, Email, PhoneNumber};
use crate::wizard::FieldErrors;

/// Maximum accepted message length.
pub const MAX_MESSAGE_LENGTH: usize = 5000;

/// A stored contact request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub id: ContactSubmissionId,
    pub name: String,
    pub email: Email,
    pub phone: Option<PhoneNumber>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// A validated contact request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContactSubmission {
    pub name: String,
    pub email: Email,
    pub phone: Option<PhoneNumber>,
    pub message: String,
}

/// Raw contact form input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
}

impl ContactForm {
    /// Validate the form, returning per-field errors on failure.
    ///
    /// # Errors
    ///
    /// Returns a map of field name to message for every invalid field.
    pub fn validate(&self) -> Result<NewContactSubmission, FieldErrors> {
        let mut errors = BTreeMap::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.insert("name", "Please enter your name.".to_string());
        }

        let email = Email::parse(&self.email);
        if email.is_err() {
            errors.insert("email", "Please enter a valid email address.".to_string());
        }

        let phone = if self.phone.trim().is_empty() {
            Ok(None)
        } else {
            PhoneNumber::parse(&self.phone).map(Some)
        };
        if phone.is_err() {
            errors.insert("phone", "Please enter a valid phone number.".to_string());
        }

        let message = self.message.trim();
        if message.is_empty() {
            errors.insert("message", "Please write a message.".to_string());
        } else if message.chars().count() > MAX_MESSAGE_LENGTH {
            errors.insert(
                "message",
                format!("Messages are limited to {MAX_MESSAGE_LENGTH} characters."),
            );
        }

        match (email, phone) {
            (Ok(email), Ok(phone)) if errors.is_empty() => Ok(NewContactSubmission {
                name: name.to_string(),
                email,
                phone,
                message: message.to_string(),
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_form() {
        let form = ContactForm {
            name: " Giulia ".to_string(),
            email: "giulia@example.com".to_string(),
            phone: String::new(),
            message: "Is there a bus service?".to_string(),
        };
        let submission = form.validate().ok();
        assert_eq!(submission.as_ref().map(|s| s.name.as_str()), Some("Giulia"));
        assert_eq!(submission.and_then(|s| s.phone), None);
    }

    #[test]
    fn test_invalid_form_reports_every_field() {
        let form = ContactForm {
            name: String::new(),
            email: "nope".to_string(),
            phone: "abc".to_string(),
            message: " ".to_string(),
        };
        let errors = form.validate().err().unwrap_or_default();
        assert_eq!(
            errors.keys().copied().collect::<Vec<_>>(),
            vec!["email", "message", "name", "phone"]
        );
    }
}
