//! services/portal/src/app/state.rs
//!
//! Defines the application's shared state, created once at startup and handed
//! to every view explicitly.

use crate::adapters::{FileSessionStore, HttpPortalClient};
use crate::config::Config;
use crate::error::PortalError;
use std::sync::Arc;
use support_portal_core::lifecycle::ComplaintLifecycle;
use support_portal_core::ports::{AuthService, ComplaintService, SessionPersistence};
use support_portal_core::session::SessionStore;
use tracing::info;

/// The shared application state. The session store is the only piece every
/// view reads; complaints fetched by a view stay owned by that view.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub session: Arc<SessionStore>,
    pub lifecycle: Arc<ComplaintLifecycle>,
}

impl AppState {
    /// Wires the state from already-built adapters and restores any persisted session.
    pub fn new(
        config: Arc<Config>,
        complaints: Arc<dyn ComplaintService>,
        auth: Arc<dyn AuthService>,
        persistence: Arc<dyn SessionPersistence>,
    ) -> Self {
        Self {
            config,
            session: Arc::new(SessionStore::restore(auth, persistence)),
            lifecycle: Arc::new(ComplaintLifecycle::new(complaints)),
        }
    }

    /// Builds the HTTP and session-file adapters described by `config`.
    pub fn from_config(config: Config) -> Result<Self, PortalError> {
        let config = Arc::new(config);
        let client = Arc::new(HttpPortalClient::new(
            config.api_base_url.clone(),
            config.request_timeout,
        )?);
        let persistence = Arc::new(FileSessionStore::new(config.session_file.clone()));
        info!(
            "Using API at {} with session file {}",
            config.api_base_url,
            config.session_file.display()
        );
        Ok(Self::new(config, client.clone(), client, persistence))
    }
}
