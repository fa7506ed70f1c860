//! # Application Shell
//!
//! [`PosApp`] wires the pieces together and owns the auth state machine.
//!
//! ## Wiring
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ClientConfig ──► SessionStorage ──► SessionStore ──┐                   │
//! │       │            (file/memory)      (restore)     │                   │
//! │       │                                             ▼                   │
//! │       └────────────────────────────────────────► HttpGateway            │
//! │                                                     │                   │
//! │                                                     ▼                   │
//! │  Navigator (auth state + section) ◄── PosApp ──► DataContext            │
//! │                                         │                               │
//! │                                         └──────► Mutations              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Auth Flow
//! ```text
//!   start():   persisted session? ── yes ──► authenticated(dashboard) + load
//!                                  └─ no ───► unauthenticated (empty snapshot)
//!
//!   login():   unauthenticated ──► authenticating ──► POST /login
//!                                                        │
//!                      ┌─────────────── ok ──────────────┼──── err ─────┐
//!                      ▼                                                ▼
//!              persist token+identity               unauthenticated(error)
//!              authenticated(dashboard)
//!              load()
//!
//!   logout():  clear storage (one write) ──► clear context ──► unauthenticated
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use gadget_core::{
    AuthState, DashboardSummary, Identity, Navigator, Section, Snapshot, ValidationError,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::aggregate::{DataContext, LoadOutcome};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult, GENERIC_LOGIN_FAILURE};
use crate::gateway::{Backend, HttpGateway};
use crate::mutations::Mutations;
use crate::session::{SessionHandle, SessionStore};
use crate::storage::{FileStorage, MemoryStorage, SessionStorage};

pub struct PosApp {
    config: ClientConfig,
    session: SessionHandle,
    backend: Arc<dyn Backend>,
    context: Arc<DataContext>,
    mutations: Mutations,
    navigator: Mutex<Navigator>,
}

impl PosApp {
    /// Builds the app over an already constructed session and backend.
    pub fn with_backend(
        config: ClientConfig,
        session: SessionHandle,
        backend: Arc<dyn Backend>,
    ) -> Self {
        let context = Arc::new(DataContext::new(backend.clone(), session.clone()));
        let mutations = Mutations::new(backend.clone(), session.clone(), context.clone());
        PosApp {
            config,
            session,
            backend,
            context,
            mutations,
            navigator: Mutex::new(Navigator::new()),
        }
    }

    /// Builds the production stack: file-backed session and HTTP gateway.
    ///
    /// The persisted session is restored here; call [`start`](Self::start)
    /// to reflect it in navigation and load data.
    pub fn from_config(config: ClientConfig) -> ClientResult<Self> {
        let storage: Arc<dyn SessionStorage> = match config.session_path() {
            Some(path) => {
                info!(?path, "Using file session storage");
                Arc::new(FileStorage::new(path))
            }
            None => {
                warn!("No data directory available, session will not survive restarts");
                Arc::new(MemoryStorage::new())
            }
        };

        let session = Arc::new(SessionStore::restore(storage));
        let gateway = HttpGateway::new(&config, session.clone())?;
        Ok(Self::with_backend(config, session, Arc::new(gateway)))
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Reflects the restored session in navigation, then runs the first load.
    pub async fn start(&self) -> LoadOutcome {
        if let Some(identity) = self.session.identity().await {
            info!(user_id = %identity.id, "Resuming session");
            self.navigator.lock().await.restore(identity);
        }
        self.context.load().await
    }

    /// Signs in and loads the snapshot.
    ///
    /// On failure the navigator returns to unauthenticated with the backend's
    /// message (or a generic one) as the form error. A result that arrives
    /// after a logout, or after a newer attempt started, is discarded without
    /// touching the session.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Identity> {
        let attempt = self.navigator.lock().await.begin_login().ok_or_else(|| {
            ClientError::InvalidState("A login is already in progress or a user is signed in".into())
        })?;

        let result = self.authenticate(email, password).await;

        // Held until the session is written, so a logout can't interleave.
        let mut navigator = self.navigator.lock().await;
        if !navigator.is_current(attempt) {
            debug!("Login result arrived after it was superseded");
            return Err(ClientError::InvalidState("Login was cancelled".into()));
        }

        let established = match result {
            Ok(identity) => self
                .session
                .establish(identity.clone())
                .await
                .map(|()| identity),
            Err(e) => Err(e),
        };

        match established {
            Ok(identity) => {
                navigator.login_succeeded(attempt, identity.clone());
                drop(navigator);
                info!(user_id = %identity.id, role = %identity.role, "Logged in");
                self.context.load().await;
                Ok(identity)
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                navigator.login_failed(attempt, login_failure_message(&e));
                Err(e)
            }
        }
    }

    async fn authenticate(&self, email: &str, password: &str) -> ClientResult<Identity> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ValidationError::Required {
                field: "email".to_string(),
            }
            .into());
        }
        if password.is_empty() {
            return Err(ValidationError::Required {
                field: "password".to_string(),
            }
            .into());
        }

        self.backend.login(email, password).await
    }

    /// Clears the persisted session, the snapshot and navigation.
    ///
    /// In-memory state is reset even if storage fails; the storage error is
    /// returned afterwards.
    pub async fn logout(&self) -> ClientResult<()> {
        let mut navigator = self.navigator.lock().await;
        let result = self.session.clear().await;
        self.context.clear();
        navigator.logout();
        info!("Logged out");
        result
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub async fn auth_state(&self) -> AuthState {
        self.navigator.lock().await.state().clone()
    }

    pub async fn visible_sections(&self) -> Vec<Section> {
        self.navigator.lock().await.visible_sections()
    }

    pub async fn active_section(&self) -> Section {
        self.navigator.lock().await.active_section()
    }

    /// Switches section if the signed-in role may see it. Returns whether it did.
    pub async fn set_active_section(&self, section: Section) -> bool {
        let switched = self.navigator.lock().await.set_active_section(section);
        if !switched {
            debug!(%section, "Section not visible, ignoring");
        }
        switched
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn context(&self) -> &Arc<DataContext> {
        &self.context
    }

    pub fn mutations(&self) -> &Mutations {
        &self.mutations
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.context.snapshot()
    }

    pub fn dashboard(&self, today: NaiveDate) -> DashboardSummary {
        DashboardSummary::compute(&self.snapshot(), today)
    }
}

fn login_failure_message(error: &ClientError) -> String {
    if let Some(message) = error.backend_message() {
        return message.to_string();
    }
    match error {
        ClientError::Validation(e) => e.to_string(),
        _ => GENERIC_LOGIN_FAILURE.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
