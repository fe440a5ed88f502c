//! The session owner.
//!
//! `AuthService` is a cheap-to-clone handle; every clone sees the same
//! session. State is only changed through `login`, `auto_auth_user`,
//! `logout` and the expiry timer, and each of those finishes all of its
//! memory, timer, storage and notification side effects before returning.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{debug, info, warn};

use crate::api::{ApiError, AuthBackend};
use crate::models::{AuthData, LoginResponse};
use crate::navigation::Navigator;

use super::session::SessionData;
use super::status::{AuthStatusBroadcaster, AuthStatusSubscription};
use super::storage::{AuthStorage, KeyValueStore};
use super::timer::{ExpiryTimer, TimerState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    Login,
    Signup,
}

/// Why the most recent login or signup did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailure {
    pub action: AuthAction,
    pub message: String,
}

impl AuthFailure {
    fn from_error(action: AuthAction, error: &anyhow::Error) -> Self {
        let message = match error.downcast_ref::<ApiError>() {
            Some(api_error) => api_error.user_message(),
            None => match action {
                AuthAction::Login => format!("Login failed: {}", error),
                AuthAction::Signup => format!("Signup failed: {}", error),
            },
        };
        Self { action, message }
    }
}

#[derive(Default)]
struct AuthState {
    session: Option<SessionData>,
    is_authenticated: bool,
    timer: ExpiryTimer,
    last_failure: Option<AuthFailure>,
}

struct Inner {
    backend: Arc<dyn AuthBackend>,
    storage: AuthStorage,
    navigator: Arc<dyn Navigator>,
    status: AuthStatusBroadcaster,
    state: Mutex<AuthState>,
}

#[derive(Clone)]
pub struct AuthService {
    inner: Arc<Inner>,
}

impl AuthService {
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        store: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                storage: AuthStorage::new(store),
                navigator,
                status: AuthStatusBroadcaster::new(),
                state: Mutex::new(AuthState::default()),
            }),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, AuthState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // =========================================================================
    // Remote operations
    // =========================================================================

    /// Register a new account. Does not log in.
    /// Returns true on success, after handing off navigation.
    pub async fn create_user(&self, email: &str, password: &str) -> bool {
        let auth = AuthData::new(email, password);
        match self.inner.backend.signup(&auth).await {
            Ok(()) => {
                info!(email = email, "Account created");
                self.lock_state().last_failure = None;
                self.inner.navigator.navigate_home();
                true
            }
            Err(e) => {
                warn!(error = %e, "Signup failed");
                self.lock_state().last_failure = Some(AuthFailure::from_error(AuthAction::Signup, &e));
                self.inner.status.emit(false);
                false
            }
        }
    }

    /// Log in and start a session. Returns whether a session was established.
    pub async fn login(&self, email: &str, password: &str) -> bool {
        let auth = AuthData::new(email, password);
        match self.inner.backend.login(&auth).await {
            Ok(response) => self.start_session(response),
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.lock_state().last_failure = Some(AuthFailure::from_error(AuthAction::Login, &e));
                self.inner.status.emit(false);
                false
            }
        }
    }

    fn start_session(&self, response: LoginResponse) -> bool {
        if response.token.is_empty() {
            warn!("Login response did not include a token");
            return false;
        }

        let lifetime = response.lifetime();
        let Some(session) = SessionData::starting_at(
            response.token,
            response.user_id,
            Utc::now().trunc_subsecs(3),
            lifetime,
        ) else {
            warn!(expires_in = response.expires_in, "Login response has an unusable token lifetime");
            self.lock_state().last_failure = Some(AuthFailure {
                action: AuthAction::Login,
                message: "Login failed: invalid token lifetime".to_string(),
            });
            self.inner.status.emit(false);
            return false;
        };
        let expires_at = session.expires_at;

        {
            let mut state = self.lock_state();
            state.session = Some(session.clone());
            self.arm_timer(&mut state, lifetime.to_std().unwrap_or_default());
            state.is_authenticated = true;
            state.last_failure = None;
        }
        info!(user_id = %session.user_id, %expires_at, "Logged in");

        if let Err(e) = self
            .inner
            .storage
            .save(&session.token, expires_at, &session.user_id)
        {
            warn!(error = %e, "Failed to persist session");
        }

        self.inner.status.emit(true);
        self.inner.navigator.navigate_home();
        true
    }

    // =========================================================================
    // Local operations
    // =========================================================================

    /// Restore a persisted, unexpired session. Returns whether one was restored.
    /// An expired one is left in storage untouched.
    /// Must be called from within a Tokio runtime.
    pub fn auto_auth_user(&self) -> bool {
        let Some(persisted) = self.inner.storage.load() else {
            debug!("No persisted session");
            return false;
        };

        let now = Utc::now();
        let session = SessionData {
            token: persisted.token,
            user_id: persisted.user_id,
            expires_at: persisted.expiration,
        };
        if session.is_expired_at(now) {
            debug!(expiration = %session.expires_at, "Persisted session already expired");
            return false;
        }
        let remaining = (session.expires_at - now).to_std().unwrap_or_default();

        {
            let mut state = self.lock_state();
            state.session = Some(session);
            self.arm_timer(&mut state, remaining);
            state.is_authenticated = true;
        }
        info!(remaining_secs = remaining.as_secs(), "Session restored");

        self.inner.status.emit(true);
        true
    }

    /// End the session. Safe to call when already logged out.
    pub fn logout(&self) {
        {
            let mut state = self.lock_state();
            state.session = None;
            state.is_authenticated = false;
            state.timer.cancel();
        }
        self.inner.status.emit(false);

        if let Err(e) = self.inner.storage.clear() {
            warn!(error = %e, "Failed to clear persisted session");
        }
        info!("Logged out");
        self.inner.navigator.navigate_home();
    }

    fn arm_timer(&self, state: &mut AuthState, duration: Duration) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        state.timer.arm(duration, move |generation| {
            if let Some(inner) = weak.upgrade() {
                AuthService { inner }.expire(generation);
            }
        });
    }

    fn expire(&self, generation: u64) {
        let claimed = self.lock_state().timer.fire(generation);
        if claimed {
            info!("Session expired");
            self.logout();
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn user_id(&self) -> Option<String> {
        self.lock_state().session.as_ref().map(|s| s.user_id.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.lock_state().session.as_ref().map(|s| s.token.clone())
    }

    pub fn is_auth(&self) -> bool {
        self.lock_state().is_authenticated
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.lock_state().session.as_ref().map(|s| s.expires_at)
    }

    pub fn session(&self) -> Option<SessionData> {
        self.lock_state().session.clone()
    }

    pub fn timer_state(&self) -> TimerState {
        self.lock_state().timer.state()
    }

    pub fn timer_remaining(&self) -> Option<Duration> {
        self.lock_state().timer.remaining()
    }

    pub fn last_failure(&self) -> Option<AuthFailure> {
        self.lock_state().last_failure.clone()
    }

    pub fn auth_status_listener(&self) -> AuthStatusSubscription {
        self.inner.status.subscribe()
    }

    pub fn storage(&self) -> &AuthStorage {
        &self.inner.storage
    }
}

// ============================================================================
// Tests
// ============================================================================
