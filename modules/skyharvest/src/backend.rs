use async_trait::async_trait;
use bluesky_client::{BlueskyClient, SearchPostsPage, SearchPostsRequest};

// --- SearchBackend trait ---

/// The two authenticated reads the pipeline needs. Implemented by
/// [`BlueskyClient`] and by [`crate::testing::MockBackend`].
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn resolve_handle(&self, token: &str, handle: &str) -> bluesky_client::Result<String>;

    async fn search_page(
        &self,
        token: &str,
        request: &SearchPostsRequest,
    ) -> bluesky_client::Result<SearchPostsPage>;
}

#[async_trait]
impl SearchBackend for BlueskyClient {
    async fn resolve_handle(&self, token: &str, handle: &str) -> bluesky_client::Result<String> {
        BlueskyClient::resolve_handle(self, token, handle).await
    }

    async fn search_page(
        &self,
        token: &str,
        request: &SearchPostsRequest,
    ) -> bluesky_client::Result<SearchPostsPage> {
        self.search_posts(token, request).await
    }
}
