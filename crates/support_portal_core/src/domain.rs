//! crates/support_portal_core/src/domain.rs
//!
//! Defines the pure, core data structures for the support portal.
//! These structs are independent of any wire or storage format; adapters map
//! their own records onto them.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use crate::ports::{FieldError, ValidationErrors};

//=========================================================================================
// Identity
//=========================================================================================

/// Server-assigned account id. The auth service hands it out as a number,
/// the console and persisted session carry it as text, so it is kept opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }

    /// Maps a role string from the auth service. Anything other than `admin`
    /// gets the least privileged role.
    pub fn from_wire(value: &str) -> Self {
        if value.eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::Customer
        }
    }
}

/// The signed-in user. Immutable for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Login form contents. Never logged.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Sign-up form contents.
#[derive(Clone)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

impl Registration {
    /// Checks performed before the request leaves the client.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        if self.password != self.password_confirmation {
            return Err(ValidationErrors::detail("Passwords do not match!"));
        }
        let mut errors = ValidationErrors::default();
        require_non_blank(&mut errors, "full_name", &self.full_name);
        require_non_blank(&mut errors, "email", &self.email);
        require_non_blank(&mut errors, "password", &self.password);
        errors.into_result()
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

//=========================================================================================
// Complaint
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComplaintId(pub i64);

impl fmt::Display for ComplaintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ComplaintId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().trim_start_matches('#').parse().map(ComplaintId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComplaintStatus {
    Pending,
    InProgress,
    Resolved,
}

impl ComplaintStatus {
    pub const ALL: [ComplaintStatus; 3] = [
        ComplaintStatus::Pending,
        ComplaintStatus::InProgress,
        ComplaintStatus::Resolved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "Pending",
            ComplaintStatus::InProgress => "In Progress",
            ComplaintStatus::Resolved => "Resolved",
        }
    }

    /// Admin-driven transitions. Resolving again is allowed and overwrites the
    /// customer-visible resolution; nothing leads back out of `Resolved`.
    pub fn can_transition_to(&self, next: ComplaintStatus) -> bool {
        use ComplaintStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress) | (Pending, Resolved) | (InProgress, Resolved) | (Resolved, Resolved)
        )
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown complaint status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for ComplaintStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "pending" => Ok(ComplaintStatus::Pending),
            "in progress" => Ok(ComplaintStatus::InProgress),
            "resolved" => Ok(ComplaintStatus::Resolved),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// Advisory priority assigned by the severity engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

/// AI severity on a 0..=10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SeverityScore(u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityBand {
    Low,
    Medium,
    High,
}

impl SeverityBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityBand::Low => "low",
            SeverityBand::Medium => "medium",
            SeverityBand::High => "high",
        }
    }
}

impl SeverityScore {
    pub const MAX: u8 = 10;

    pub fn new(value: i64) -> Option<Self> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .map(SeverityScore)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn band(&self) -> SeverityBand {
        match self.0 {
            8.. => SeverityBand::High,
            5..=7 => SeverityBand::Medium,
            _ => SeverityBand::Low,
        }
    }
}

impl fmt::Display for SeverityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}

/// Categories offered on the new-complaint form. The service accepts any
/// non-empty category string.
pub const COMPLAINT_CATEGORIES: [&str; 4] = ["Billing", "Technical", "General", "Product"];
pub const DEFAULT_CATEGORY: &str = "General";

/// A customer-filed support ticket as last fetched from the service.
#[derive(Debug, Clone, PartialEq)]
pub struct Complaint {
    pub id: ComplaintId,
    /// `None` once the filing account no longer exists.
    pub owner_id: Option<UserId>,
    pub owner_name: Option<String>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: ComplaintStatus,
    pub priority: Option<Priority>,
    pub ai_severity_score: Option<SeverityScore>,
    pub ai_predicted_resolution_time: Option<String>,
    pub resolution: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Complaint {
    /// The customer-visible resolution, if any text has been delivered.
    pub fn resolution_text(&self) -> Option<&str> {
        self.resolution.as_deref().filter(|r| !r.trim().is_empty())
    }

    /// True while the customer is still waiting for an answer.
    pub fn awaiting_resolution(&self) -> bool {
        self.resolution_text().is_none() && self.status != ComplaintStatus::Resolved
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.owner_id.as_ref() == Some(user)
    }
}

/// Fields a customer supplies when filing a complaint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComplaint {
    pub title: String,
    pub category: String,
    pub description: String,
    pub owner_id: UserId,
}

impl NewComplaint {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        require_non_blank(&mut errors, "title", &self.title);
        require_non_blank(&mut errors, "category", &self.category);
        require_non_blank(&mut errors, "description", &self.description);
        errors.into_result()
    }
}

/// A sparse update. Only the fields set here are sent; title, description
/// and category have no edit path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplaintPatch {
    pub status: Option<ComplaintStatus>,
    pub resolution: Option<String>,
}

impl ComplaintPatch {
    pub fn status(status: ComplaintStatus) -> Self {
        Self {
            status: Some(status),
            resolution: None,
        }
    }

    /// The commit payload of the resolve workflow.
    pub fn resolve(resolution: impl Into<String>) -> Self {
        Self {
            status: Some(ComplaintStatus::Resolved),
            resolution: Some(resolution.into()),
        }
    }
}

//=========================================================================================
// Dashboards
//=========================================================================================

/// Status filter offered on the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ComplaintStatus),
}

impl StatusFilter {
    pub fn matches(&self, complaint: &Complaint) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(status) => complaint.status == *status,
        }
    }

    /// Keeps the service's ordering.
    pub fn apply(&self, complaints: Vec<Complaint>) -> Vec<Complaint> {
        complaints.into_iter().filter(|c| self.matches(c)).collect()
    }
}

impl FromStr for StatusFilter {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            s.parse().map(StatusFilter::Only)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComplaintStats {
    pub total: usize,
    /// Everything not yet resolved, `In Progress` included.
    pub pending: usize,
    pub resolved: usize,
}

impl ComplaintStats {
    pub fn from_complaints(complaints: &[Complaint]) -> Self {
        let total = complaints.len();
        let resolved = complaints
            .iter()
            .filter(|c| c.status == ComplaintStatus::Resolved)
            .count();
        Self {
            total,
            pending: total - resolved,
            resolved,
        }
    }
}

fn require_non_blank(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.fields.push(FieldError::new(field, "This field may not be blank."));
    }
}
