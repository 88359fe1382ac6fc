//! services/portal/src/app/customer.rs
//!
//! The customer's screens. Every query is scoped to the signed-in customer.

use std::sync::Arc;
use support_portal_core::domain::{Complaint, ComplaintId, ComplaintStats, Identity, NewComplaint, Role};
use support_portal_core::lifecycle::{ComplaintLifecycle, ListScope};
use support_portal_core::ports::PortError;
use tracing::warn;

use crate::app::{require_role, AppState, Dashboard, Mount, ViewError};

pub struct CustomerView {
    lifecycle: Arc<ComplaintLifecycle>,
    identity: Arc<Identity>,
    mount: Mount,
}

impl CustomerView {
    /// Opens the view for the signed-in customer.
    pub fn open(state: &AppState) -> Result<Self, ViewError> {
        let identity = require_role(state, Role::Customer)?;
        Ok(Self {
            lifecycle: state.lifecycle.clone(),
            identity,
            mount: Mount::new(),
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn unmount(&self) {
        self.mount.unmount();
    }


    // Never `ListScope::All` from here.
    fn scope(&self) -> ListScope {
        ListScope::Owner(self.identity.id.clone())
    }

    pub async fn dashboard(&self) -> Result<Dashboard, ViewError> {
        let complaints = self.mount.run(self.lifecycle.list(&self.scope())).await??;
        let stats = ComplaintStats::from_complaints(&complaints);
        Ok(Dashboard { complaints, stats })
    }

    /// One of the customer's own complaints. Someone else's complaint is
    /// reported exactly like a missing one.
    pub async fn complaint(&self, id: ComplaintId) -> Result<Complaint, ViewError> {
        let complaint = self.mount.run(self.lifecycle.load(id)).await??;
        if !complaint.is_owned_by(&self.identity.id) {
            warn!("User {} asked for complaint {} owned by someone else", self.identity.id, id);
            return Err(PortError::NotFound(format!("Complaint {} not found", id)).into());
        }
        Ok(complaint)
    }

    pub async fn file_complaint(
        &self,
        title: &str,
        category: &str,
        description: &str,
    ) -> Result<Complaint, ViewError> {
        let complaint = NewComplaint {
            title: title.trim().to_string(),
            category: category.trim().to_string(),
            description: description.trim().to_string(),
            owner_id: self.identity.id.clone(),
        };
        Ok(self.mount.run(self.lifecycle.create(&complaint)).await??)
    }
}
