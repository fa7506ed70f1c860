//! # Session Store
//!
//! The single source of truth for "who is signed in and with which token".
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Session Lifecycle                               │
//! │                                                                         │
//! │   startup                                                               │
//! │      │  restore(storage)                                                │
//! │      ▼                                                                  │
//! │   ┌──────────────────┐  both keys valid   ┌──────────────────────────┐ │
//! │   │ read auth_token  │───────────────────►│ signed in (identity set) │ │
//! │   │ read auth_user   │                    └────────────┬─────────────┘ │
//! │   └────────┬─────────┘                                 │ clear()       │
//! │            │ one key missing / corrupt JSON            │               │
//! │            ▼                                           ▼               │
//! │   ┌──────────────────┐                    ┌──────────────────────────┐ │
//! │   │ remove both keys │───────────────────►│ signed out               │ │
//! │   └──────────────────┘                    └────────────┬─────────────┘ │
//! │                                                        │ establish()   │
//! │                                           back to "signed in" ◄────────┘
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Token reads
//! The gateway calls [`SessionStore::token`] at the start of every request,
//! so a login or logout takes effect for the next call. Calls already in
//! flight keep the token they started with.

use std::sync::Arc;

use gadget_core::Identity;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::ClientResult;
use crate::storage::{SessionStorage, IDENTITY_KEY, TOKEN_KEY};

/// Shared handle to the session store.
pub type SessionHandle = Arc<SessionStore>;

pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    current: RwLock<Option<Identity>>,
}

impl SessionStore {
    /// Creates a signed-out store without reading storage.
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        SessionStore {
            storage,
            current: RwLock::new(None),
        }
    }

    /// Restores the persisted session, if there is a consistent one.
    ///
    /// A half-present pair (token without identity or the reverse), an
    /// unreadable document, or an identity that isn't valid JSON all clear
    /// both keys so the next start is cleanly signed out.
    pub fn restore(storage: Arc<dyn SessionStorage>) -> Self {
        let restored = Self::read_persisted(storage.as_ref());
        if restored.is_none() {
            if let Err(e) = storage.remove_many(&[TOKEN_KEY, IDENTITY_KEY]) {
                warn!(error = %e, "Failed to clear inconsistent session");
            }
        }

        if let Some(identity) = &restored {
            info!(user_id = %identity.id, role = %identity.role, "Session restored");
        }

        SessionStore {
            storage,
            current: RwLock::new(restored),
        }
    }

    fn read_persisted(storage: &dyn SessionStorage) -> Option<Identity> {
        let token = match storage.get(TOKEN_KEY) {
            Ok(t) => t.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                warn!(error = %e, "Unreadable session token");
                return None;
            }
        };
        let profile = match storage.get(IDENTITY_KEY) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Unreadable session identity");
                return None;
            }
        };

        match (token, profile) {
            (Some(token), Some(profile)) => match serde_json::from_str::<Identity>(&profile) {
                Ok(mut identity) => {
                    identity.token = token;
                    Some(identity)
                }
                Err(e) => {
                    warn!(error = %e, "Persisted identity is corrupt, clearing session");
                    None
                }
            },
            (None, None) => {
                debug!("No persisted session");
                None
            }
            _ => {
                warn!("Persisted session is half-present, clearing both keys");
                None
            }
        }
    }

    /// Persists `identity` (token and profile in one write) and makes it current.
    pub async fn establish(&self, identity: Identity) -> ClientResult<()> {
        let profile = serde_json::to_string(&identity)?;
        self.storage
            .set_many(&[(TOKEN_KEY, identity.token.as_str()), (IDENTITY_KEY, profile.as_str())])?;

        info!(user_id = %identity.id, role = %identity.role, "Session established");
        *self.current.write().await = Some(identity);
        Ok(())
    }

    /// Removes both keys in one write and forgets the identity.
    ///
    /// Memory is cleared even if storage fails; the error is still returned.
    pub async fn clear(&self) -> ClientResult<()> {
        let result = self.storage.remove_many(&[TOKEN_KEY, IDENTITY_KEY]);
        *self.current.write().await = None;
        info!("Session cleared");
        result
    }

    /// The bearer token for the next call.
    pub async fn token(&self) -> Option<String> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|i| i.token.clone())
            .filter(|t| !t.is_empty())
    }

    pub async fn identity(&self) -> Option<Identity> {
        self.current.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token().await.is_some()
    }
}
