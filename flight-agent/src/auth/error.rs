//! Account and token errors.

use std::collections::BTreeMap;

/// Field name → validation messages, as returned to the client.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Errors from signup, login and token handling.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    /// Request fields failed validation
    #[error("invalid input")]
    Validation(FieldErrors),

    /// Signup with an email that already has an account
    #[error("an account with this email already exists")]
    EmailTaken,

    /// Unknown email or wrong password
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Credentials were right but the account is switched off
    #[error("user account is disabled")]
    AccountDisabled,

    /// Missing, malformed, expired or foreign token
    #[error("invalid or expired token")]
    InvalidToken,

    /// Password hashing failed
    #[error("password hashing failed: {0}")]
    Hashing(String),

    /// Token encoding failed
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

impl AuthError {
    /// A validation error on a single field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        AuthError::Validation(errors)
    }

    /// Field errors to echo back to the client, if any.
    pub fn field_errors(&self) -> FieldErrors {
        match self {
            AuthError::Validation(errors) => errors.clone(),
            AuthError::EmailTaken => {
                let mut errors = FieldErrors::new();
                errors.insert(
                    "email".to_string(),
                    vec!["Email already registered".to_string()],
                );
                errors
            }
            AuthError::InvalidCredentials => non_field("Invalid email or password"),
            AuthError::AccountDisabled => non_field("User account is disabled"),
            _ => FieldErrors::new(),
        }
    }
}

fn non_field(message: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.insert("non_field_errors".to_string(), vec![message.to_string()]);
    errors
}
