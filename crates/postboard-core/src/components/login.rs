use crate::auth::{AuthAction, AuthService};
use crate::utils::{can_add_email_char, can_add_password_char, validate_credentials};

/// Login form state.
pub struct LoginForm {
    auth: AuthService,
    email: String,
    password: String,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl LoginForm {
    pub fn new(auth: AuthService) -> Self {
        Self {
            auth,
            email: String::new(),
            password: String::new(),
            is_loading: false,
            error: None,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn has_password(&self) -> bool {
        !self.password.is_empty()
    }

    /// Replace the email, keeping only the characters the field accepts.
    pub fn set_email(&mut self, email: &str) {
        self.email.clear();
        for c in email.chars() {
            self.push_email_char(c);
        }
    }

    pub fn set_password(&mut self, password: &str) {
        self.password.clear();
        for c in password.chars() {
            self.push_password_char(c);
        }
    }

    pub fn push_email_char(&mut self, c: char) -> bool {
        if can_add_email_char(self.email.chars().count(), c) {
            self.email.push(c);
            true
        } else {
            false
        }
    }

    pub fn push_password_char(&mut self, c: char) -> bool {
        if can_add_password_char(self.password.chars().count(), c) {
            self.password.push(c);
            true
        } else {
            false
        }
    }

    pub fn validation_error(&self) -> Option<&'static str> {
        validate_credentials(&self.email, &self.password).err()
    }

    pub fn is_valid(&self) -> bool {
        self.validation_error().is_none()
    }

    /// Submit the form. An invalid form is not sent.
    pub async fn on_login(&mut self) -> bool {
        if !self.is_valid() {
            return false;
        }

        self.is_loading = true;
        self.error = None;
        let logged_in = self.auth.login(self.email.trim(), &self.password).await;
        self.is_loading = false;

        if logged_in {
            self.password.clear();
        } else {
            self.error = Some(
                self.auth
                    .last_failure()
                    .filter(|f| f.action == AuthAction::Login)
                    .map(|f| f.message)
                    .unwrap_or_else(|| "Login failed".to_string()),
            );
        }
        logged_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::auth::service::tests::{login_reply, FakeAuthBackend};
    use crate::auth::MemoryStore;
    use crate::navigation::NoopNavigator;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn form(backend: FakeAuthBackend) -> (LoginForm, Arc<FakeAuthBackend>, AuthService) {
        let backend = Arc::new(backend);
        let auth = AuthService::new(backend.clone(), Arc::new(MemoryStore::new()), Arc::new(NoopNavigator));
        (LoginForm::new(auth.clone()), backend, auth)
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_form_does_not_submit() {
        let (mut form, backend, _) = form(FakeAuthBackend::default());

        assert!(!form.on_login().await);
        form.set_email("not-an-email");
        form.set_password("pw");
        assert!(!form.on_login().await);

        assert_eq!(backend.login_calls.load(Ordering::SeqCst), 0);
        assert!(!form.is_loading);
        assert!(form.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_login() {
        let (mut form, _, auth) = form(
            FakeAuthBackend::default().with_login(Ok(login_reply("abc", 3600.0, "u1"))),
        );
        form.set_email("a@b.c");
        form.set_password("secret");

        assert!(form.on_login().await);
        assert!(auth.is_auth());
        assert!(!form.is_loading);
        assert!(form.error.is_none());
        assert!(!form.has_password());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_login_sets_error() {
        let (mut form, _, auth) = form(FakeAuthBackend::default().with_login(Err(ApiError::Unauthorized)));
        form.set_email("a@b.c");
        form.set_password("wrong");

        assert!(!form.on_login().await);
        assert!(!auth.is_auth());
        assert!(!form.is_loading);
        assert_eq!(form.error.as_deref(), Some("Invalid email or password"));
        assert!(form.has_password());
    }

    #[test]
    fn test_set_email_filters_characters() {
        let (mut form, _, _) = form(FakeAuthBackend::default());
        form.set_email("a b@c.d\n");
        assert_eq!(form.email(), "ab@c.d");
    }
}
