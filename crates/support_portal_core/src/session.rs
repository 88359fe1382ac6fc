//! crates/support_portal_core/src/session.rs
//!
//! The session store: the single source of truth for who is signed in.
//!
//! The identity is kept in memory and mirrored to a `SessionPersistence` so a
//! restart does not sign the user out. Role checks made from it are advisory;
//! the service has to enforce access on its own.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

use crate::domain::{Credentials, Identity, Registration};
use crate::ports::{AuthService, PortError, PortResult, SessionPersistence};

pub struct SessionStore {
    auth: Arc<dyn AuthService>,
    persistence: Arc<dyn SessionPersistence>,
    current: RwLock<Option<Arc<Identity>>>,
}

impl SessionStore {
    /// Builds the store from whatever identity was persisted by a previous run.
    ///
    /// A missing record means no identity. An unreadable record is discarded
    /// and also means no identity; this never fails.
    pub fn restore(auth: Arc<dyn AuthService>, persistence: Arc<dyn SessionPersistence>) -> Self {
        let restored = match persistence.load() {
            Ok(Some(identity)) => {
                info!("Restored session for user {}", identity.id);
                Some(Arc::new(identity))
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Discarding unreadable persisted session: {}", e);
                if let Err(e) = persistence.clear() {
                    warn!("Failed to remove unreadable session record: {}", e);
                }
                None
            }
        };

        Self {
            auth,
            persistence,
            current: RwLock::new(restored),
        }
    }

    pub fn current_identity(&self) -> Option<Arc<Identity>> {
        self.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    /// Verifies credentials with the auth service and makes the returned
    /// identity current.
    ///
    /// On any failure the previous identity stays in place. Wrong credentials
    /// surface as `PortError::AuthenticationFailed`, network trouble as
    /// `PortError::Transport`.
    pub async fn sign_in(&self, credentials: &Credentials) -> PortResult<Arc<Identity>> {
        let identity = Arc::new(self.auth.authenticate(credentials).await?);

        *self.write() = Some(identity.clone());
        let persistence = self.persistence.clone();
        let record = identity.clone();
        let saved = tokio::task::spawn_blocking(move || persistence.save(&record))
            .await
            .unwrap_or_else(|e| Err(PortError::Storage(format!("session save task failed: {}", e))));
        if let Err(e) = saved {
            // The session still works for this run; it just won't survive a restart.
            warn!("Failed to persist session for user {}: {}", identity.id, e);
        }

        info!("User {} signed in as {}", identity.id, identity.role.as_str());
        Ok(identity)
    }

    /// Clears the in-memory identity and the persisted copy. Never fails.
    pub fn sign_out(&self) {
        let previous = self.write().take();
        if let Err(e) = self.persistence.clear() {
            warn!("Failed to remove persisted session: {}", e);
        }
        if let Some(identity) = previous {
            info!("User {} signed out", identity.id);
        }
    }

    /// Creates an account. Does not sign the new user in.
    pub async fn register(&self, registration: &Registration) -> PortResult<Identity> {
        registration.validate().map_err(PortError::Validation)?;
        let identity = self.auth.register_account(registration).await?;
        info!("Registered account {}", identity.id);
        Ok(identity)
    }

    // The guarded value is replaced wholesale, so a poisoned lock never holds a
    // half-written identity.
    fn read(&self) -> RwLockReadGuard<'_, Option<Arc<Identity>>> {
        self.current.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Arc<Identity>>> {
        self.current.write().unwrap_or_else(|e| e.into_inner())
    }
}
