//! crates/support_portal_core/src/messages.rs
//!
//! Turns errors into the single human-readable line a view shows.

use crate::lifecycle::LifecycleError;
use crate::ports::{PortError, ValidationErrors};

pub const LOGIN_FAILED: &str = "Login failed! Invalid credentials.";
pub const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";
pub const EMAIL_ALREADY_REGISTERED: &str = "This email address is already registered.";
pub const RESOLUTION_LOAD_FAILED: &str = "Failed to load details.";
pub const RESOLUTION_COMMIT_FAILED: &str = "Failed to update status.";
pub const COMPLAINT_LOAD_FAILED: &str = "Failed to load complaint details.";
pub const COMPLAINT_NOT_FOUND: &str = "Complaint not found";
pub const NO_SUGGESTION: &str = "No suggestion available. Write a resolution below.";

/// Generic rendering: validation errors as `field: message`, everything else
/// through its display text.
pub fn user_message(error: &PortError) -> String {
    match error {
        PortError::Validation(errors) => errors.to_string(),
        PortError::AuthenticationFailed => LOGIN_FAILED.to_string(),
        PortError::NotFound(_) => COMPLAINT_NOT_FOUND.to_string(),
        other => other.to_string(),
    }
}

pub fn login_message(error: &PortError) -> String {
    match error {
        PortError::AuthenticationFailed | PortError::Validation(_) => LOGIN_FAILED.to_string(),
        other => user_message(other),
    }
}

/// Registration failures, with a duplicate email mapped to a fixed message
/// rather than whatever the service said.
pub fn registration_message(error: &PortError) -> String {
    match error {
        PortError::Validation(errors) if is_duplicate_email(errors) => {
            EMAIL_ALREADY_REGISTERED.to_string()
        }
        PortError::Validation(errors) if !errors.is_empty() => errors.to_string(),
        PortError::Validation(_) => REGISTRATION_FAILED.to_string(),
        other => user_message(other),
    }
}

pub fn lifecycle_message(error: &LifecycleError) -> String {
    match error {
        LifecycleError::LoadFailed { .. } => RESOLUTION_LOAD_FAILED.to_string(),
        LifecycleError::Validation(errors) => errors.to_string(),
        LifecycleError::InvalidTransition { .. } => error.to_string(),
        LifecycleError::Port(e) => user_message(e),
    }
}

fn is_duplicate_email(errors: &ValidationErrors) -> bool {
    if let Some(detail) = &errors.detail {
        return detail.to_lowercase().contains("already registered");
    }
    errors.first_field().is_some_and(|first| {
        let message = first.message.to_lowercase();
        first.field == "email" && (message.contains("exists") || message.contains("unique"))
    })
}
