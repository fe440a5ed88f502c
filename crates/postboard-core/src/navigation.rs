//! Navigation hand-off from the auth service to whatever hosts it.

/// Receives "go home" requests after signup, login and logout.
pub trait Navigator: Send + Sync {
    fn navigate_home(&self);
}

/// Navigator that ignores every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate_home(&self) {}
}
