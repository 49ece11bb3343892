//! User record and input validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidateEmail;

/// Minimum name length (characters)
pub const NAME_MIN_LEN: usize = 2;
/// Maximum name length (characters)
pub const NAME_MAX_LEN: usize = 100;

/// Stored user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

/// Create/update request body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Input validation failure
///
/// Display strings are returned verbatim to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name is required")]
    NameRequired,
    #[error("name must be at least 2 characters")]
    NameTooShort,
    #[error("name must not exceed 100 characters")]
    NameTooLong,
    #[error("email is required")]
    EmailRequired,
    #[error("invalid email format")]
    InvalidEmail,
}

impl UserInput {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Trim the name, trim and lowercase the email
    pub fn sanitize(&mut self) {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
    }

    /// Check the input, reporting the first rule it breaks
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::NameRequired);
        }
        let name_len = self.name.chars().count();
        if name_len < NAME_MIN_LEN {
            return Err(ValidationError::NameTooShort);
        }
        if name_len > NAME_MAX_LEN {
            return Err(ValidationError::NameTooLong);
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::EmailRequired);
        }
        if !self.email.validate_email() || !has_dotted_domain(&self.email) {
            return Err(ValidationError::InvalidEmail);
        }
        Ok(())
    }

    /// Build the stored record
    pub fn into_user(self, id: u64) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
        }
    }
}

// The domain needs a dot and an alphabetic TLD of two or more letters.
fn has_dotted_domain(email: &str) -> bool {
    let Some((_, domain)) = email.rsplit_once('@') else {
        return false;
    };
    match domain.rsplit_once('.') {
        Some((host, tld)) => {
            !host.is_empty() && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checked(name: &str, email: &str) -> Result<(), ValidationError> {
        let mut input = UserInput::new(name, email);
        input.sanitize();
        input.validate()
    }

    #[test]
    fn test_valid_input() {
        assert_eq!(checked("Ada Lovelace", "ada@example.com"), Ok(()));
    }

    #[test]
    fn test_sanitize_trims_and_lowercases() {
        let mut input = UserInput::new("  Grace  ", "  Grace@Example.COM ");
        input.sanitize();
        assert_eq!(input.name, "Grace");
        assert_eq!(input.email, "grace@example.com");
    }

    #[test]
    fn test_name_rules_in_order() {
        assert_eq!(checked("   ", "a@b.co"), Err(ValidationError::NameRequired));
        assert_eq!(checked("A", "a@b.co"), Err(ValidationError::NameTooShort));
        let long = "x".repeat(NAME_MAX_LEN + 1);
        assert_eq!(checked(&long, "a@b.co"), Err(ValidationError::NameTooLong));
    }

    #[test]
    fn test_email_rules() {
        assert_eq!(checked("Ada", ""), Err(ValidationError::EmailRequired));
        assert_eq!(checked("Ada", "not-an-email"), Err(ValidationError::InvalidEmail));
        assert_eq!(checked("Ada", "ada@localhost"), Err(ValidationError::InvalidEmail));
        assert_eq!(checked("Ada", "ada@example.c"), Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ValidationError::NameTooShort.to_string(),
            "name must be at least 2 characters"
        );
        assert_eq!(
            ValidationError::NameTooLong.to_string(),
            "name must not exceed 100 characters"
        );
    }
}
