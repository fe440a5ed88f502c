use tracing::warn;

use crate::auth::{AuthService, AuthStatusSubscription};
use crate::config::DEFAULT_POSTS_PER_PAGE;
use crate::events::Subscription;
use crate::models::Post;
use crate::posts::{PostsService, PostsUpdate};

/// Page sizes offered by the paginator.
pub const PAGE_SIZE_OPTIONS: [u32; 4] = [1, 2, 5, 10];

/// Paginator change; `page_index` is zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageEvent {
    pub page_index: u32,
    pub page_size: u32,
}

/// Paginated post list that tracks who is logged in.
pub struct PostList {
    posts_service: PostsService,
    auth: AuthService,

    pub posts: Vec<Post>,
    pub user_is_authenticated: bool,
    pub user_id: Option<String>,
    pub is_loading: bool,
    pub total_posts: u64,
    pub posts_per_page: u32,
    pub current_page: u32,

    posts_sub: Option<Subscription<PostsUpdate>>,
    auth_status_sub: Option<AuthStatusSubscription>,
}

impl PostList {
    pub fn new(posts_service: PostsService, auth: AuthService) -> Self {
        Self {
            posts_service,
            auth,
            posts: Vec::new(),
            user_is_authenticated: false,
            user_id: None,
            is_loading: false,
            total_posts: 0,
            posts_per_page: DEFAULT_POSTS_PER_PAGE,
            current_page: 1,
            posts_sub: None,
            auth_status_sub: None,
        }
    }

    pub fn with_posts_per_page(mut self, posts_per_page: u32) -> Self {
        self.posts_per_page = posts_per_page.max(1);
        self
    }

    pub fn is_subscribed(&self) -> bool {
        self.posts_sub.is_some() || self.auth_status_sub.is_some()
    }

    pub async fn on_init(&mut self) {
        self.is_loading = true;
        self.posts_sub = Some(self.posts_service.post_update_listener());
        self.request_posts().await;

        self.user_id = self.auth.user_id();
        self.user_is_authenticated = self.auth.is_auth();
        self.auth_status_sub = Some(self.auth.auth_status_listener());
        self.poll();
    }

    /// Apply every queued posts update and auth transition.
    pub fn poll(&mut self) {
        if let Some(sub) = self.posts_sub.as_mut() {
            for update in sub.drain() {
                self.is_loading = false;
                self.posts = update.posts;
                self.total_posts = update.post_count;
            }
        }

        let auth_events = self
            .auth_status_sub
            .as_mut()
            .map(|sub| sub.drain())
            .unwrap_or_default();
        if let Some(&is_authenticated) = auth_events.last() {
            self.user_is_authenticated = is_authenticated;
            self.user_id = self.auth.user_id();
        }
    }

    pub async fn on_delete(&mut self, post_id: &str) {
        self.is_loading = true;
        match self.posts_service.delete_post(post_id).await {
            Ok(()) => self.request_posts().await,
            Err(e) => {
                warn!(error = %e, post_id = post_id, "Delete failed");
                self.is_loading = false;
            }
        }
    }

    pub async fn on_changed_page(&mut self, page: PageEvent) {
        self.is_loading = true;
        self.current_page = page.page_index.saturating_add(1);
        self.posts_per_page = page.page_size.max(1);
        self.request_posts().await;
    }

    /// Only the author of a post may edit or delete it.
    pub fn can_edit(&self, post: &Post) -> bool {
        self.user_is_authenticated
            && self
                .user_id
                .as_deref()
                .is_some_and(|user_id| post.is_created_by(user_id))
    }

    pub fn total_pages(&self) -> u64 {
        let per_page = u64::from(self.posts_per_page.max(1));
        self.total_posts.div_ceil(per_page)
    }

    pub fn on_destroy(&mut self) {
        if let Some(sub) = self.posts_sub.take() {
            sub.unsubscribe();
        }
        if let Some(sub) = self.auth_status_sub.take() {
            sub.unsubscribe();
        }
    }

    async fn request_posts(&mut self) {
        if let Err(e) = self
            .posts_service
            .get_posts(self.posts_per_page, self.current_page)
            .await
        {
            warn!(error = %e, "Failed to load posts");
            self.is_loading = false;
        }
        self.poll();
    }
}

impl Drop for PostList {
    fn drop(&mut self) {
        self.on_destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::service::tests::{login_reply, FakeAuthBackend};
    use crate::auth::MemoryStore;
    use crate::navigation::NoopNavigator;
    use crate::posts::service::tests::FakePostsBackend;
    use std::sync::Arc;

    fn setup(posts: FakePostsBackend, auth_backend: FakeAuthBackend) -> (PostList, AuthService, Arc<FakePostsBackend>) {
        let auth = AuthService::new(
            Arc::new(auth_backend),
            Arc::new(MemoryStore::new()),
            Arc::new(NoopNavigator),
        );
        let posts = Arc::new(posts);
        let service = PostsService::new(posts.clone(), auth.clone());
        (PostList::new(service, auth.clone()), auth, posts)
    }

    #[tokio::test(start_paused = true)]
    async fn test_init_loads_first_page_and_auth_snapshot() {
        let (mut list, _, _) = setup(FakePostsBackend::with_posts(5, "u1"), FakeAuthBackend::default());

        list.on_init().await;

        assert!(!list.is_loading);
        assert_eq!(list.posts.len(), 2);
        assert_eq!(list.total_posts, 5);
        assert_eq!(list.total_pages(), 3);
        assert!(!list.user_is_authenticated);
        assert!(list.user_id.is_none());
        assert!(list.is_subscribed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tracks_login_and_logout() {
        let (mut list, auth, _) = setup(
            FakePostsBackend::with_posts(3, "u1"),
            FakeAuthBackend::default().with_login(Ok(login_reply("abc", 3600.0, "u1"))),
        );
        list.on_init().await;

        auth.login("a@b.c", "pw").await;
        list.poll();
        assert!(list.user_is_authenticated);
        assert_eq!(list.user_id.as_deref(), Some("u1"));
        assert!(list.can_edit(&list.posts[0].clone()));

        auth.logout();
        list.poll();
        assert!(!list.user_is_authenticated);
        assert!(list.user_id.is_none());
        assert!(!list.can_edit(&list.posts[0].clone()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_init_after_login_reads_snapshot() {
        let (mut list, auth, _) = setup(
            FakePostsBackend::with_posts(1, "u2"),
            FakeAuthBackend::default().with_login(Ok(login_reply("abc", 3600.0, "u1"))),
        );
        auth.login("a@b.c", "pw").await;

        list.on_init().await;
        assert!(list.user_is_authenticated);
        assert_eq!(list.user_id.as_deref(), Some("u1"));
        // Someone else's post
        assert!(!list.can_edit(&list.posts[0].clone()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_changed_page_is_one_based() {
        let (mut list, _, _) = setup(FakePostsBackend::with_posts(10, "u1"), FakeAuthBackend::default());
        list.on_init().await;

        list.on_changed_page(PageEvent {
            page_index: 1,
            page_size: 5,
        })
        .await;

        assert_eq!(list.current_page, 2);
        assert_eq!(list.posts_per_page, 5);
        let ids: Vec<_> = list.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p6", "p7", "p8", "p9", "p10"]);
        assert!(!list.is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_changed_page_last_index_saturates() {
        let (mut list, _, _) = setup(FakePostsBackend::with_posts(3, "u1"), FakeAuthBackend::default());
        list.on_init().await;

        list.on_changed_page(PageEvent {
            page_index: u32::MAX,
            page_size: 2,
        })
        .await;

        assert_eq!(list.current_page, u32::MAX);
        assert!(list.posts.is_empty());
        assert_eq!(list.total_posts, 3);
        assert!(!list.is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_refreshes_current_page() {
        let (mut list, auth, backend) = setup(
            FakePostsBackend::with_posts(3, "u1"),
            FakeAuthBackend::default().with_login(Ok(login_reply("abc", 3600.0, "u1"))),
        );
        auth.login("a@b.c", "pw").await;
        list.on_init().await;

        list.on_delete("p1").await;

        assert!(!list.is_loading);
        assert_eq!(list.total_posts, 2);
        assert_eq!(list.posts[0].id, "p2");
        let deletes = backend.deletes.lock().unwrap();
        assert_eq!(deletes.as_slice(), &[(Some("abc".to_string()), "p1".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_delete_clears_loading() {
        let (mut list, _, backend) = setup(FakePostsBackend::with_posts(3, "u1"), FakeAuthBackend::default());
        list.on_init().await;

        list.on_delete("p1").await;

        assert!(!list.is_loading);
        assert_eq!(backend.posts.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_clears_loading() {
        let backend = FakePostsBackend {
            fail_fetch: true,
            ..Default::default()
        };
        let (mut list, _, _) = setup(backend, FakeAuthBackend::default());
        list.on_init().await;
        assert!(!list.is_loading);
        assert!(list.posts.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_unsubscribes() {
        let (mut list, auth, _) = setup(
            FakePostsBackend::with_posts(1, "u1"),
            FakeAuthBackend::default().with_login(Ok(login_reply("abc", 3600.0, "u1"))),
        );
        list.on_init().await;
        list.on_destroy();
        assert!(!list.is_subscribed());

        auth.login("a@b.c", "pw").await;
        list.poll();
        assert!(!list.user_is_authenticated);
    }
}
