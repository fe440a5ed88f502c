use chrono::{DateTime, Duration, Utc};

/// The live login: bearer token, owning user, and when the token stops working.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionData {
    pub token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionData {
    /// Build a session that expires `lifetime` after `now`.
    ///
    /// Returns `None` when the deadline is past the representable range.
    pub fn starting_at(token: String, user_id: String, now: DateTime<Utc>, lifetime: Duration) -> Option<Self> {
        let expires_at = now.checked_add_signed(lifetime)?;
        Some(Self {
            token,
            user_id,
            expires_at,
        })
    }

    /// Expired once `expires_at` is reached; a deadline exactly at `now` counts.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Time left before the token stops working; negative once expired.
    pub fn time_until_expiry(&self) -> Duration {
        self.expires_at - Utc::now()
    }
}
