//! Data models for the postboard backend.
//!
//! - `AuthData`, `LoginResponse`: signup/login request and response bodies
//! - `Post`, `PostsPage`: blog posts and the paginated list response

pub mod auth;
pub mod post;

pub use auth::{AuthData, LoginResponse};
pub use post::{Post, PostsPage};
