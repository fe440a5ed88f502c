//! Postboard core library.
//!
//! Authentication session lifecycle, the HTTP API client, the posts service
//! and the headless login / post list components that consume them.

pub mod api;
pub mod auth;
pub mod components;
pub mod config;
pub mod events;
pub mod models;
pub mod navigation;
pub mod posts;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthService, AuthStatusSubscription};
pub use config::Config;
pub use navigation::{Navigator, NoopNavigator};
pub use posts::PostsService;
