//! Cursor-driven pagination over `searchPosts`.
//!
//! After each page, in order: stop at the posts cap (truncating to it),
//! stop when no cursor comes back, otherwise advance. Empty pages are
//! followed like any other; only a cursor identical to the one just sent
//! ends the run early. A failed request ends the run with whatever was
//! already accumulated.

use crate::backend::SearchBackend;
use crate::error::{HarvestError, Result};
use crate::events::{EventSink, HarvestEvent};
use crate::query::QuerySpec;
use crate::types::RawPost;

pub struct PageFetcher<'a> {
    backend: &'a dyn SearchBackend,
    events: &'a dyn EventSink,
}

impl<'a> PageFetcher<'a> {
    pub fn new(backend: &'a dyn SearchBackend, events: &'a dyn EventSink) -> Self {
        Self { backend, events }
    }

    /// Fetch up to `spec.posts_limit()` posts in page-arrival order.
    ///
    /// Errors only on a blank query or token; transport failures yield the
    /// partial result.
    pub async fn fetch(&self, spec: &QuerySpec, token: &str) -> Result<Vec<RawPost>> {
        if spec.query().trim().is_empty() {
            return Err(HarvestError::MissingQuery);
        }
        if token.trim().is_empty() {
            return Err(HarvestError::MissingToken);
        }

        let cap = spec.posts_limit();
        let mut posts: Vec<RawPost> = Vec::new();
        let mut cursor: Option<String> = spec.start_cursor().map(str::to_string);
        let mut page: u32 = 0;

        loop {
            page += 1;
            let request = spec.page_request(cursor.as_deref());

            let response = match self.backend.search_page(token, &request).await {
                Ok(response) => response,
                Err(err) => {
                    self.events.emit(HarvestEvent::PageFailed {
                        page,
                        total: posts.len(),
                        status: err.status(),
                        error: err.to_string(),
                        body: err.body().map(str::to_string),
                    });
                    return Ok(posts);
                }
            };

            let returned = response.posts.len();
            posts.extend(response.posts);
            self.events.emit(HarvestEvent::PageFetched {
                page,
                returned,
                total: posts.len(),
            });

            if posts.len() >= cap {
                posts.truncate(cap);
                self.events.emit(HarvestEvent::CapReached { cap });
                return Ok(posts);
            }

            match response.cursor.filter(|c| !c.is_empty()) {
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                _ => {
                    self.events.emit(HarvestEvent::Exhausted { total: posts.len() });
                    return Ok(posts);
                }
            }
        }
    }
}
