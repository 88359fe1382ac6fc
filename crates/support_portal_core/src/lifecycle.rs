//! crates/support_portal_core/src/lifecycle.rs
//!
//! The complaint lifecycle controller. It orchestrates the multi-call
//! workflows (listing, filing, starting work and the AI-assisted resolve) and
//! enforces the invariants that span more than one `ComplaintService` call.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::{
    Complaint, ComplaintId, ComplaintPatch, ComplaintStatus, NewComplaint, UserId,
};
use crate::ports::{ComplaintService, PortError, ValidationErrors};

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// Either half of the resolve screen's context could not be loaded.
    #[error("Failed to load complaint {id} for resolution: {source}")]
    LoadFailed {
        id: ComplaintId,
        #[source]
        source: PortError,
    },
    #[error("Complaint {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: ComplaintId,
        from: ComplaintStatus,
        to: ComplaintStatus,
    },
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error(transparent)]
    Port(#[from] PortError),
}

/// Which complaints a list query may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    /// Only complaints filed by this user.
    Owner(UserId),
    /// Every complaint. Admin views only.
    All,
}

impl ListScope {
    fn owner(&self) -> Option<&UserId> {
        match self {
            ListScope::Owner(id) => Some(id),
            ListScope::All => None,
        }
    }
}

//=========================================================================================
// Resolution Draft
//=========================================================================================

/// Everything the resolve screen needs: the complaint as currently stored,
/// the engine's suggestion and the admin's editable draft.
///
/// The draft is local until committed; editing it never touches the service.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionDraft {
    complaint: Complaint,
    suggestion: Option<String>,
    text: String,
}

impl ResolutionDraft {
    fn new(complaint: Complaint, suggestion: Option<String>) -> Self {
        let text = suggestion.clone().unwrap_or_default();
        Self {
            complaint,
            suggestion,
            text,
        }
    }

    pub fn id(&self) -> ComplaintId {
        self.complaint.id
    }

    pub fn complaint(&self) -> &Complaint {
        &self.complaint
    }

    /// The resolution the customer currently sees, if any.
    pub fn prior_resolution(&self) -> Option<&str> {
        self.complaint.resolution_text()
    }

    /// `None` when the engine declined to produce a draft.
    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn edit(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn field_label(&self) -> &'static str {
        if self.prior_resolution().is_some() {
            "Add New Update / Solution"
        } else {
            "Proposed Solution"
        }
    }
}

//=========================================================================================
// Controller
//=========================================================================================

pub struct ComplaintLifecycle {
    complaints: Arc<dyn ComplaintService>,
}

impl ComplaintLifecycle {
    pub fn new(complaints: Arc<dyn ComplaintService>) -> Self {
        Self { complaints }
    }

    /// Lists complaints in service order.
    ///
    /// An owner-scoped list is also filtered here, so a customer never sees
    /// another user's complaint even if the service ignores the filter.
    pub async fn list(&self, scope: &ListScope) -> Result<Vec<Complaint>, LifecycleError> {
        let complaints = self.complaints.list_complaints(scope.owner()).await?;
        let Some(owner) = scope.owner() else {
            return Ok(complaints);
        };

        let fetched = complaints.len();
        let owned: Vec<Complaint> = complaints
            .into_iter()
            .filter(|c| c.is_owned_by(owner))
            .collect();
        if owned.len() != fetched {
            warn!(
                "Dropped {} complaints not owned by user {} from a scoped list",
                fetched - owned.len(),
                owner
            );
        }
        Ok(owned)
    }

    pub async fn load(&self, id: ComplaintId) -> Result<Complaint, LifecycleError> {
        Ok(self.complaints.get_complaint(id).await?)
    }

    /// Files a new complaint. Blank fields are rejected before any request.
    pub async fn create(&self, complaint: &NewComplaint) -> Result<Complaint, LifecycleError> {
        complaint.validate().map_err(LifecycleError::Validation)?;
        let created = self.complaints.create_complaint(complaint).await?;
        if created.status != ComplaintStatus::Pending {
            warn!(
                "Complaint {} was created with status {} instead of Pending",
                created.id, created.status
            );
        }
        info!("Complaint {} filed by user {}", created.id, complaint.owner_id);
        Ok(created)
    }

    /// Marks a complaint as being worked on.
    pub async fn begin_work(&self, id: ComplaintId) -> Result<Complaint, LifecycleError> {
        let current = self.complaints.get_complaint(id).await?;
        let next = ComplaintStatus::InProgress;
        if current.status == next {
            return Ok(current);
        }
        if !current.status.can_transition_to(next) {
            return Err(LifecycleError::InvalidTransition {
                id,
                from: current.status,
                to: next,
            });
        }
        let updated = self
            .complaints
            .update_complaint(id, &ComplaintPatch::status(next))
            .await?;
        info!("Complaint {} moved to {}", id, updated.status);
        Ok(updated)
    }

    /// Loads the resolve screen's context.
    ///
    /// The complaint and the suggestion are requested concurrently and both
    /// must arrive; a failure of either fails the whole load. An engine that
    /// declines to suggest anything is not a failure: the draft starts empty.
    /// Loading has no side effects on the service.
    pub async fn open_resolution(&self, id: ComplaintId) -> Result<ResolutionDraft, LifecycleError> {
        let suggestion = async {
            match self.complaints.fetch_suggested_resolution(id).await {
                Ok(text) if !text.trim().is_empty() => Ok(Some(text)),
                Ok(_) | Err(PortError::SuggestionUnavailable(_)) => {
                    debug!("No suggestion available for complaint {}", id);
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        };

        let (complaint, suggestion) =
            futures::try_join!(self.complaints.get_complaint(id), suggestion)
                .map_err(|source| LifecycleError::LoadFailed { id, source })?;

        Ok(ResolutionDraft::new(complaint, suggestion))
    }

    /// Delivers the draft to the customer and marks the complaint resolved.
    ///
    /// The draft is only borrowed, so a failed commit leaves it intact for a
    /// retry. An empty draft is committed as-is.
    pub async fn commit_resolution(
        &self,
        draft: &ResolutionDraft,
    ) -> Result<Complaint, LifecycleError> {
        let id = draft.id();
        if draft.text().trim().is_empty() {
            warn!("Resolving complaint {} with an empty resolution", id);
        }
        let updated = self
            .complaints
            .update_complaint(id, &ComplaintPatch::resolve(draft.text()))
            .await?;
        info!("Complaint {} resolved", id);
        Ok(updated)
    }
}
