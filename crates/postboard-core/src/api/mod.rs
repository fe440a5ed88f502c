//! REST API client module for the postboard backend.
//!
//! This module provides the `ApiClient` for communicating with the backend
//! to register users, log in, and list or delete posts.
//!
//! Login returns a JWT bearer token which authenticates the mutating post
//! endpoints. The `AuthBackend` and `PostsBackend` traits are the seams the
//! services talk through, so tests can swap the HTTP client for a fake.

pub mod backend;
pub mod client;
pub mod error;

pub use backend::{AuthBackend, PostsBackend};
pub use client::ApiClient;
pub use error::ApiError;
