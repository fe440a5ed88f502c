use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::api::PostsBackend;
use crate::auth::AuthService;
use crate::events::{Broadcaster, Subscription};
use crate::models::Post;

/// A freshly fetched page and the server-side total.
#[derive(Debug, Clone, PartialEq)]
pub struct PostsUpdate {
    pub posts: Vec<Post>,
    pub post_count: u64,
}

struct Inner {
    backend: Arc<dyn PostsBackend>,
    auth: AuthService,
    updates: Broadcaster<PostsUpdate>,
}

/// Shared handle over the post endpoints; clones publish to the same listeners.
#[derive(Clone)]
pub struct PostsService {
    inner: Arc<Inner>,
}

impl PostsService {
    pub fn new(backend: Arc<dyn PostsBackend>, auth: AuthService) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                auth,
                updates: Broadcaster::new(),
            }),
        }
    }

    /// Fetch one page (1-based) and publish it to update listeners.
    pub async fn get_posts(&self, posts_per_page: u32, current_page: u32) -> Result<()> {
        let page = self
            .inner
            .backend
            .fetch_posts(posts_per_page, current_page)
            .await
            .with_context(|| format!("Failed to fetch posts page {}", current_page))?;
        debug!(
            count = page.posts.len(),
            total = page.max_posts,
            page = current_page,
            "Posts fetched"
        );

        self.inner.updates.emit(PostsUpdate {
            posts: page.posts,
            post_count: page.max_posts,
        });
        Ok(())
    }

    /// Delete a post with the current bearer token.
    pub async fn delete_post(&self, post_id: &str) -> Result<()> {
        let token = self.inner.auth.token();
        if token.is_none() {
            warn!(post_id = post_id, "Deleting post without a session");
        }
        self.inner
            .backend
            .delete_post(token.as_deref(), post_id)
            .await
            .with_context(|| format!("Failed to delete post {}", post_id))
    }

    pub fn post_update_listener(&self) -> Subscription<PostsUpdate> {
        self.inner.updates.subscribe()
    }
}
