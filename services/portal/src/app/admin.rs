//! services/portal/src/app/admin.rs
//!
//! The admin's screens: the unscoped dashboard and the AI-assisted resolve
//! screen.

use std::sync::Arc;
use support_portal_core::domain::{
    Complaint, ComplaintId, ComplaintStats, Identity, Role, StatusFilter,
};
use support_portal_core::lifecycle::{ComplaintLifecycle, ListScope, ResolutionDraft};
use support_portal_core::messages;
use tracing::{error, info};

use crate::app::{require_role, AppState, Dashboard, Mount, ViewError};

pub struct AdminView {
    lifecycle: Arc<ComplaintLifecycle>,
    identity: Arc<Identity>,
    mount: Mount,
}

impl AdminView {
    pub fn open(state: &AppState) -> Result<Self, ViewError> {
        let identity = require_role(state, Role::Admin)?;
        Ok(Self {
            lifecycle: state.lifecycle.clone(),
            identity,
            mount: Mount::new(),
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Also tears down any resolve screen opened from this view.
    pub fn unmount(&self) {
        self.mount.unmount();
    }

    /// All complaints matching `filter`, in service order. Stats always cover
    /// every complaint.
    pub async fn dashboard(&self, filter: StatusFilter) -> Result<Dashboard, ViewError> {
        let all = self.mount.run(self.lifecycle.list(&ListScope::All)).await??;
        let stats = ComplaintStats::from_complaints(&all);
        Ok(Dashboard {
            complaints: filter.apply(all),
            stats,
        })
    }

    /// Any complaint by id, unscoped.
    pub async fn complaint(&self, id: ComplaintId) -> Result<Complaint, ViewError> {
        Ok(self.mount.run(self.lifecycle.load(id)).await??)
    }

    pub async fn begin_work(&self, id: ComplaintId) -> Result<Complaint, ViewError> {
        Ok(self.mount.run(self.lifecycle.begin_work(id)).await??)
    }

    /// A resolve screen for `id`, not yet loaded.
    pub fn resolve_screen(&self, id: ComplaintId) -> ResolveScreen {
        ResolveScreen {
            id,
            lifecycle: self.lifecycle.clone(),
            mount: self.mount.child(),
            state: ResolveState::Loading,
        }
    }
}

//=========================================================================================
// Resolve Screen
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ResolveState {
    Loading,
    /// Both the complaint and the suggestion arrived. `error` holds the
    /// message of the last failed commit, if any.
    Ready {
        draft: ResolutionDraft,
        error: Option<String>,
    },
    LoadFailed(String),
    /// Terminal: the resolution reached the customer.
    Committed(Complaint),
}

pub struct ResolveScreen {
    id: ComplaintId,
    lifecycle: Arc<ComplaintLifecycle>,
    mount: Mount,
    state: ResolveState,
}

impl ResolveScreen {
    pub fn id(&self) -> ComplaintId {
        self.id
    }

    pub fn state(&self) -> &ResolveState {
        &self.state
    }

    pub fn draft(&self) -> Option<&ResolutionDraft> {
        match &self.state {
            ResolveState::Ready { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// Shown instead of an error when the engine had nothing to offer.
    pub fn placeholder(&self) -> Option<&'static str> {
        self.draft()
            .filter(|d| d.suggestion().is_none())
            .map(|_| messages::NO_SUGGESTION)
    }

    pub fn can_commit(&self) -> bool {
        matches!(self.state, ResolveState::Ready { .. })
    }

    pub fn unmount(&self) {
        self.mount.unmount();
    }

    /// Fetches the complaint and the suggestion. Any failure leaves the
    /// screen in `LoadFailed` with commit disabled.
    pub async fn load(&mut self) -> Result<&ResolveState, ViewError> {
        self.state = ResolveState::Loading;
        let loaded = self.mount.run(self.lifecycle.open_resolution(self.id)).await?;
        self.state = match loaded {
            Ok(draft) => ResolveState::Ready { draft, error: None },
            Err(e) => {
                error!("Failed to load resolve screen for complaint {}: {}", self.id, e);
                ResolveState::LoadFailed(messages::lifecycle_message(&e))
            }
        };
        Ok(&self.state)
    }

    /// Replaces the draft text. Returns false when there is no draft to edit.
    pub fn edit(&mut self, text: impl Into<String>) -> bool {
        match &mut self.state {
            ResolveState::Ready { draft, .. } => {
                draft.edit(text);
                true
            }
            _ => false,
        }
    }

    /// Sends the draft. On failure the screen stays `Ready` with the draft
    /// untouched and the error recorded, so the admin can retry.
    pub async fn commit(&mut self) -> Result<Complaint, ViewError> {
        let ResolveState::Ready { draft, .. } = &self.state else {
            return Err(ViewError::NotReady);
        };
        let outcome = self.mount.run(self.lifecycle.commit_resolution(draft)).await?;

        match outcome {
            Ok(complaint) => {
                info!("Resolve screen for complaint {} committed", self.id);
                self.state = ResolveState::Committed(complaint.clone());
                Ok(complaint)
            }
            Err(e) => {
                error!("Failed to resolve complaint {}: {}", self.id, e);
                if let ResolveState::Ready { error, .. } = &mut self.state {
                    *error = Some(messages::RESOLUTION_COMMIT_FAILED.to_string());
                }
                Err(e.into())
            }
        }
    }
}
