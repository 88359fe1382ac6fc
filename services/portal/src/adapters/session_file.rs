//! services/portal/src/adapters/session_file.rs
//!
//! File-backed implementation of the `SessionPersistence` port. The signed-in
//! identity is stored as one small JSON record at a well-known path.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use support_portal_core::domain::{Identity, Role, UserId};
use support_portal_core::ports::{PortError, PortResult, SessionPersistence};
use tempfile::NamedTempFile;
use tracing::debug;

/// A session store that keeps the identity record in a single JSON file.
#[derive(Clone, Debug)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Serialize, Deserialize)]
struct StoredIdentity {
    id: String,
    name: String,
    email: String,
    role: String,
}

impl StoredIdentity {
    fn from_domain(identity: &Identity) -> Self {
        Self {
            id: identity.id.to_string(),
            name: identity.display_name.clone(),
            email: identity.email.clone(),
            role: identity.role.as_str().to_string(),
        }
    }

    fn to_domain(self) -> PortResult<Identity> {
        let role = match self.role.as_str() {
            "admin" => Role::Admin,
            "customer" => Role::Customer,
            other => {
                return Err(PortError::Storage(format!("unknown stored role '{}'", other)));
            }
        };
        if self.id.trim().is_empty() {
            return Err(PortError::Storage("stored identity has no id".to_string()));
        }
        Ok(Identity {
            id: UserId::new(self.id),
            display_name: self.name,
            email: self.email,
            role,
        })
    }
}

fn storage_error(action: &str, path: &Path, e: impl std::fmt::Display) -> PortError {
    PortError::Storage(format!("Failed to {} {}: {}", action, path.display(), e))
}

impl SessionPersistence for FileSessionStore {
    fn load(&self) -> PortResult<Option<Identity>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error("read", &self.path, e)),
        };
        let stored: StoredIdentity =
            serde_json::from_str(&raw).map_err(|e| storage_error("parse", &self.path, e))?;
        stored.to_domain().map(Some)
    }

    /// Writes a temp file next to the record and persists it over the record,
    /// so a crash never leaves a half-written identity behind.
    fn save(&self, identity: &Identity) -> PortResult<()> {
        let parent = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent,
            None => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| storage_error("create", parent, e))?;
        let json = serde_json::to_vec_pretty(&StoredIdentity::from_domain(identity))
            .map_err(|e| storage_error("serialize", &self.path, e))?;

        let mut temp =
            NamedTempFile::new_in(parent).map_err(|e| storage_error("create temp file in", parent, e))?;
        temp.write_all(&json)
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| storage_error("write", temp.path(), e))?;
        temp.persist(&self.path)
            .map_err(|e| storage_error("replace", &self.path, e.error))?;
        debug!("Persisted session to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> PortResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("remove", &self.path, e)),
        }
    }
}
