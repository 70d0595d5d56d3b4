pub mod error;
pub mod types;

use std::time::Duration;

pub use error::{BlueskyError, Result};
pub use types::{SearchPostsPage, SearchPostsRequest, Session};

use serde::de::DeserializeOwned;
use types::{CreateSessionInput, ResolveHandleResponse};

/// Default PDS entry point; createSession and authenticated reads go here.
pub const DEFAULT_SERVICE_URL: &str = "https://bsky.social";

pub struct BlueskyClient {
    client: reqwest::Client,
    service_url: String,
}

impl BlueskyClient {
    /// Build a client against `service_url`. Every request is bounded by `timeout`.
    pub fn new(service_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("bluesky-client/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            service_url: service_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn xrpc(&self, method: &str) -> String {
        format!("{}/xrpc/{}", self.service_url, method)
    }

    /// Exchange a handle and app password for a session.
    pub async fn create_session(&self, identifier: &str, password: &str) -> Result<Session> {
        tracing::debug!(identifier, "Creating Bluesky session");
        let resp = self
            .client
            .post(self.xrpc("com.atproto.server.createSession"))
            .json(&CreateSessionInput {
                identifier,
                password,
            })
            .send()
            .await?;

        read_json(resp).await
    }

    /// Resolve a handle (e.g. `alice.bsky.social`) to its DID.
    pub async fn resolve_handle(&self, token: &str, handle: &str) -> Result<String> {
        let resp = self
            .client
            .get(self.xrpc("com.atproto.identity.resolveHandle"))
            .bearer_auth(token)
            .query(&[("handle", handle)])
            .send()
            .await?;

        let resolved: ResolveHandleResponse = read_json(resp).await?;
        tracing::debug!(handle, did = %resolved.did, "Resolved handle");
        Ok(resolved.did)
    }

    /// Fetch a single page of `app.bsky.feed.searchPosts`.
    pub async fn search_posts(
        &self,
        token: &str,
        request: &SearchPostsRequest,
    ) -> Result<SearchPostsPage> {
        let resp = self
            .client
            .get(self.xrpc("app.bsky.feed.searchPosts"))
            .bearer_auth(token)
            .query(&request.query_pairs())
            .send()
            .await?;

        let page: SearchPostsPage = read_json(resp).await?;
        tracing::debug!(
            count = page.posts.len(),
            has_cursor = page.cursor.is_some(),
            "Fetched search page"
        );
        Ok(page)
    }
}

/// Turn a non-2xx response into `BlueskyError::Api` carrying the body,
/// otherwise decode the JSON payload.
async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(BlueskyError::Api {
            status: status.as_u16(),
            message: body,
        });
    }

    let body = resp.text().await?;
    Ok(serde_json::from_str(&body)?)
}
