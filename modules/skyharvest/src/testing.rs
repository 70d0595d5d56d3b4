// Test doubles for the harvest pipeline.
//
// - MockBackend (SearchBackend) — scripted pages and handle lookups, records calls
// - RecordingSink (EventSink) — collects events for assertions
//
// Plus helpers for building raw posts and store records.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use bluesky_client::{BlueskyError, SearchPostsPage, SearchPostsRequest};
use serde_json::json;

use crate::backend::SearchBackend;
use crate::events::{EventSink, HarvestEvent};
use crate::types::{PostRecord, RawPost};

// ---------------------------------------------------------------------------
// MockBackend
// ---------------------------------------------------------------------------

/// Serves scripted search pages in order and resolves registered handles.
/// Unregistered handles fail with a 400; running out of pages is a
/// network error.
/// Builder pattern: `.on_handle()`, `.on_page()`, `.on_failure()`.
pub struct MockBackend {
    handles: HashMap<String, String>,
    pages: Mutex<VecDeque<bluesky_client::Result<SearchPostsPage>>>,
    requests: Mutex<Vec<SearchPostsRequest>>,
    lookups: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            handles: HashMap::new(),
            pages: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            lookups: Mutex::new(Vec::new()),
        }
    }

    pub fn on_handle(mut self, handle: &str, did: &str) -> Self {
        self.handles.insert(handle.to_string(), did.to_string());
        self
    }

    pub fn on_page(self, posts: Vec<RawPost>, cursor: Option<&str>) -> Self {
        self.pages.lock().unwrap().push_back(Ok(SearchPostsPage {
            posts,
            cursor: cursor.map(str::to_string),
            hits_total: None,
        }));
        self
    }

    pub fn on_failure(self, status: u16, body: &str) -> Self {
        self.pages.lock().unwrap().push_back(Err(BlueskyError::Api {
            status,
            message: body.to_string(),
        }));
        self
    }

    /// Every search request issued, in order.
    pub fn requests(&self) -> Vec<SearchPostsRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn search_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every handle passed to `resolve_handle`, in order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchBackend for MockBackend {
    async fn resolve_handle(&self, _token: &str, handle: &str) -> bluesky_client::Result<String> {
        self.lookups.lock().unwrap().push(handle.to_string());
        self.handles
            .get(handle)
            .cloned()
            .ok_or_else(|| BlueskyError::Api {
                status: 400,
                message: r#"{"error":"InvalidRequest","message":"Unable to resolve handle"}"#
                    .to_string(),
            })
    }

    async fn search_page(
        &self,
        _token: &str,
        request: &SearchPostsRequest,
    ) -> bluesky_client::Result<SearchPostsPage> {
        self.requests.lock().unwrap().push(request.clone());
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BlueskyError::Network("no scripted page left".to_string())))
    }
}

// ---------------------------------------------------------------------------
// RecordingSink
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<HarvestEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HarvestEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: HarvestEvent) {
        self.events.lock().unwrap().push(event);
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A well-formed `searchPosts` post view.
pub fn raw_post(handle: &str, short_id: &str, text: &str) -> RawPost {
    json!({
        "uri": format!("at://did:plc:{handle}/app.bsky.feed.post/{short_id}"),
        "cid": "bafyreib2rxk3rh6kzwq",
        "author": {
            "did": format!("did:plc:{handle}"),
            "handle": handle,
        },
        "record": {
            "$type": "app.bsky.feed.post",
            "text": text,
            "createdAt": "2024-07-28T09:00:00.000Z",
        },
        "indexedAt": "2024-07-28T09:00:01.000Z",
    })
}

/// `count` distinct posts by `handle`, with short ids `{handle}0..{handle}{count-1}`.
pub fn raw_posts(handle: &str, count: usize) -> Vec<RawPost> {
    (0..count)
        .map(|i| raw_post(handle, &format!("{handle}{i}"), &format!("post {i}")))
        .collect()
}

pub fn record(author: &str, content: &str, post_link: &str) -> PostRecord {
    PostRecord {
        author: author.to_string(),
        content: content.to_string(),
        created_at: "2024-01-01T00:00:00Z".to_string(),
        post_link: post_link.to_string(),
    }
}
