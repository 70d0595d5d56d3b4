//! Query building: user filters in, an immutable [`QuerySpec`] out.
//!
//! A `QuerySpec` never carries pagination state. The fetcher owns the cursor
//! for the duration of a run and asks the `QuerySpec` for one
//! [`SearchPostsRequest`] per page.

use bluesky_client::SearchPostsRequest;

use crate::backend::SearchBackend;
use crate::error::{HarvestError, Result};
use crate::events::{EventSink, HarvestEvent};

pub const DEFAULT_PAGE_LIMIT: u32 = 25;
pub const MAX_PAGE_LIMIT: u32 = 100;
pub const DEFAULT_POSTS_LIMIT: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortOrder {
    Top,
    Latest,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Top => "top",
            SortOrder::Latest => "latest",
        }
    }
}

/// Filters as the operator supplied them, before handle resolution.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub query: String,
    pub sort: Option<SortOrder>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub mentions: Option<String>,
    pub author: Option<String>,
    pub lang: Option<String>,
    pub domain: Option<String>,
    pub url: Option<String>,
    pub tags: Vec<String>,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
    pub posts_limit: Option<u32>,
}

impl SearchFilters {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    query: String,
    sort: Option<SortOrder>,
    since: Option<String>,
    until: Option<String>,
    mentions: Option<String>,
    author: Option<String>,
    lang: Option<String>,
    domain: Option<String>,
    url: Option<String>,
    tags: Vec<String>,
    page_limit: u8,
    start_cursor: Option<String>,
    posts_limit: u32,
}

impl QuerySpec {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn mentions(&self) -> Option<&str> {
        self.mentions.as_deref()
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn page_limit(&self) -> u8 {
        self.page_limit
    }

    pub fn posts_limit(&self) -> usize {
        self.posts_limit as usize
    }

    /// Cursor to resume from, if the run was started mid-stream.
    pub fn start_cursor(&self) -> Option<&str> {
        self.start_cursor.as_deref()
    }

    /// Request for one page at `cursor`. `None` asks for the first page.
    pub fn page_request(&self, cursor: Option<&str>) -> SearchPostsRequest {
        SearchPostsRequest {
            q: self.query.clone(),
            sort: self.sort.map(|s| s.as_str().to_string()),
            since: self.since.clone(),
            until: self.until.clone(),
            mentions: self.mentions.clone(),
            author: self.author.clone(),
            lang: self.lang.clone(),
            domain: self.domain.clone(),
            url: self.url.clone(),
            tags: self.tags.clone(),
            limit: self.page_limit,
            cursor: cursor.map(str::to_string),
        }
    }
}

/// Validate `filters` and resolve mentions/author handles to DIDs.
///
/// A failed lookup keeps the handle as given and emits
/// [`HarvestEvent::HandleUnresolved`]; only a blank query or an out-of-range
/// limit is an error.
pub async fn build(
    backend: &dyn SearchBackend,
    events: &dyn EventSink,
    token: &str,
    filters: SearchFilters,
) -> Result<QuerySpec> {
    let query = filters.query.trim().to_string();
    if query.is_empty() {
        return Err(HarvestError::MissingQuery);
    }

    let page_limit = filters.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    if !(1..=MAX_PAGE_LIMIT).contains(&page_limit) {
        return Err(HarvestError::InvalidPageLimit(page_limit));
    }

    let posts_limit = filters.posts_limit.unwrap_or(DEFAULT_POSTS_LIMIT);
    if posts_limit < 1 {
        return Err(HarvestError::InvalidPostsLimit(posts_limit));
    }

    let mentions = match filters.mentions.as_deref() {
        Some(handle) => resolve_actor(backend, events, token, "mentions", handle).await,
        None => None,
    };
    let author = match filters.author.as_deref() {
        Some(handle) => resolve_actor(backend, events, token, "author", handle).await,
        None => None,
    };

    Ok(QuerySpec {
        query,
        sort: filters.sort,
        since: filters.since,
        until: filters.until,
        mentions,
        author,
        lang: filters.lang,
        domain: filters.domain,
        url: filters.url,
        tags: filters.tags,
        page_limit: page_limit as u8,
        start_cursor: filters.cursor.filter(|c| !c.is_empty()),
        posts_limit,
    })
}

async fn resolve_actor(
    backend: &dyn SearchBackend,
    events: &dyn EventSink,
    token: &str,
    filter: &'static str,
    raw: &str,
) -> Option<String> {
    let handle = raw.trim().trim_start_matches('@');
    if handle.is_empty() {
        return None;
    }
    if handle.starts_with("did:") {
        return Some(handle.to_string());
    }

    match backend.resolve_handle(token, handle).await {
        Ok(did) => Some(did),
        Err(err) => {
            events.emit(HarvestEvent::HandleUnresolved {
                filter,
                handle: handle.to_string(),
                error: err.to_string(),
            });
            Some(handle.to_string())
        }
    }
}
