//! Login/logout notifications.
//!
//! `true` is emitted after a login or auto-login, `false` after logout,
//! expiry, or a failed login/signup. Nothing is replayed: read
//! `AuthService::is_auth` for the current state, then subscribe.

use crate::events::{Broadcaster, Subscription};

pub type AuthStatusBroadcaster = Broadcaster<bool>;

pub type AuthStatusSubscription = Subscription<bool>;
