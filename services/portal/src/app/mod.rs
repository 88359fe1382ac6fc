pub mod admin;
pub mod customer;
pub mod mount;
pub mod navigation;
pub mod state;

use std::sync::Arc;
use support_portal_core::domain::{Complaint, ComplaintStats, Identity, Role};
use support_portal_core::lifecycle::LifecycleError;
use support_portal_core::messages;
use support_portal_core::ports::PortError;

pub use admin::{AdminView, ResolveScreen, ResolveState};
pub use customer::CustomerView;
pub use mount::Mount;
pub use navigation::{gate, landing_route, Route};
pub use state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("Not signed in")]
    Unauthenticated,
    #[error("This screen requires the {} role", .0.as_str())]
    Forbidden(Role),
    #[error("The screen was closed before the request completed")]
    Unmounted,
    #[error("Nothing to submit yet")]
    NotReady,
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Port(#[from] PortError),
}

impl ViewError {
    /// The one line a screen shows for this error.
    pub fn user_message(&self) -> String {
        match self {
            ViewError::Lifecycle(e) => messages::lifecycle_message(e),
            ViewError::Port(e) => messages::user_message(e),
            other => other.to_string(),
        }
    }
}

/// A list screen's data: complaints in service order plus summary counts.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub complaints: Vec<Complaint>,
    pub stats: ComplaintStats,
}

/// The signed-in identity, provided it has `role`.
fn require_role(state: &AppState, role: Role) -> Result<Arc<Identity>, ViewError> {
    let identity = state
        .session
        .current_identity()
        .ok_or(ViewError::Unauthenticated)?;
    if identity.role != role {
        return Err(ViewError::Forbidden(role));
    }
    Ok(identity)
}
