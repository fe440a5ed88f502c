//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `AuthService`: login/signup/logout and auto-login from persisted state
//! - `AuthStorage`: the token, expiration and user id entries in a
//!   `KeyValueStore` that survives restarts
//! - `ExpiryTimer`: logs the user out when the token lifetime elapses
//! - `AuthStatusBroadcaster`: notifies subscribers of login/logout transitions

pub mod service;
pub mod session;
pub mod status;
pub mod storage;
pub mod timer;

pub use service::{AuthAction, AuthFailure, AuthService};
pub use session::SessionData;
pub use status::{AuthStatusBroadcaster, AuthStatusSubscription};
pub use storage::{AuthStorage, FileStore, KeyValueStore, MemoryStore, PersistedAuth};
pub use timer::{ExpiryTimer, TimerState};
