//! crates/support_portal_core/src/ports.rs
//!
//! Defines the service contracts (traits) the portal core depends on.
//! These traits form the boundary of the hexagonal architecture: the core talks
//! to the remote complaint/auth service and to local session storage only
//! through them.

use async_trait::async_trait;
use std::fmt;

use crate::domain::{
    Complaint, ComplaintId, ComplaintPatch, Credentials, Identity, NewComplaint, Registration,
    UserId,
};

//=========================================================================================
// Port Error and Result Types
//=========================================================================================

/// A single field-attributed validation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validation failures as reported by the service: either a free-form
/// `detail` or a list of per-field messages, in the order the service sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub detail: Option<String>,
    pub fields: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn detail(message: impl Into<String>) -> Self {
        Self {
            detail: Some(message.into()),
            fields: Vec::new(),
        }
    }

    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            detail: None,
            fields: vec![FieldError::new(field, message)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.detail.is_none() && self.fields.is_empty()
    }

    pub fn first_field(&self) -> Option<&FieldError> {
        self.fields.first()
    }

    pub(crate) fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.detail, self.fields.first()) {
            (Some(detail), _) => f.write_str(detail),
            (None, Some(first)) => write!(f, "{}: {}", first.field, first.message),
            (None, None) => f.write_str("invalid request"),
        }
    }
}

/// The error taxonomy shared by every port.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PortError {
    /// Network failure or a 5xx response. Retryable by the user.
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    /// Wrong credentials. Deliberately does not say which field was wrong.
    #[error("Invalid email or password")]
    AuthenticationFailed,
    /// The suggestion engine produced nothing for this complaint.
    #[error("No suggested resolution available for complaint {0}")]
    SuggestionUnavailable(ComplaintId),
    /// The service answered with a payload we could not interpret.
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Session storage error: {0}")]
    Storage(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Typed access to the remote complaint service. One request per call; no
/// caching and no retries.
#[async_trait]
pub trait ComplaintService: Send + Sync {
    /// Lists complaints in the order the service returns them. `None` lists
    /// every complaint and is reserved for admin views.
    async fn list_complaints(&self, owner: Option<&UserId>) -> PortResult<Vec<Complaint>>;

    async fn get_complaint(&self, id: ComplaintId) -> PortResult<Complaint>;

    async fn create_complaint(&self, complaint: &NewComplaint) -> PortResult<Complaint>;

    /// Applies a sparse patch and returns the full updated complaint.
    async fn update_complaint(&self, id: ComplaintId, patch: &ComplaintPatch)
        -> PortResult<Complaint>;

    /// Asks the suggestion engine for a draft resolution. This runs inference
    /// remotely and is typically much slower than the other calls.
    async fn fetch_suggested_resolution(&self, id: ComplaintId) -> PortResult<String>;
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn register_account(&self, registration: &Registration) -> PortResult<Identity>;

    async fn authenticate(&self, credentials: &Credentials) -> PortResult<Identity>;
}

/// Local storage for the single persisted identity record.
pub trait SessionPersistence: Send + Sync {
    /// `Ok(None)` when nothing is stored; an error when the record is unreadable.
    fn load(&self) -> PortResult<Option<Identity>>;

    fn save(&self, identity: &Identity) -> PortResult<()>;

    /// Removing an absent record is not an error.
    fn clear(&self) -> PortResult<()>;
}
