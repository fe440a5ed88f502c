use anyhow::Result;
use async_trait::async_trait;

use crate::models::{AuthData, LoginResponse, PostsPage};

/// Remote user endpoints used by the auth service.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn signup(&self, auth: &AuthData) -> Result<()>;

    async fn login(&self, auth: &AuthData) -> Result<LoginResponse>;
}

/// Remote post endpoints used by the posts service.
#[async_trait]
pub trait PostsBackend: Send + Sync {
    async fn fetch_posts(&self, posts_per_page: u32, page: u32) -> Result<PostsPage>;

    async fn delete_post(&self, token: Option<&str>, post_id: &str) -> Result<()>;
}
