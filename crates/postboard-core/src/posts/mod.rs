//! Posts module: fetching pages of posts and deleting them.

pub mod service;

pub use service::{PostsService, PostsUpdate};
