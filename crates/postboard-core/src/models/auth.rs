use serde::{Deserialize, Serialize};

/// Credentials sent to both the signup and the login endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct AuthData {
    pub email: String,
    pub password: String,
}

impl AuthData {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: String,
    /// Token lifetime in seconds
    #[serde(rename = "expiresIn")]
    pub expires_in: f64,
    #[serde(rename = "userID", default)]
    pub user_id: String,
}

impl LoginResponse {
    /// Token lifetime as a duration, clamped at zero.
    pub fn lifetime(&self) -> chrono::Duration {
        if !self.expires_in.is_finite() || self.expires_in <= 0.0 {
            return chrono::Duration::zero();
        }
        chrono::Duration::milliseconds((self.expires_in * 1000.0) as i64)
    }
}
