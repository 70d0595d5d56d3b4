use serde::{Deserialize, Serialize};

// --- com.atproto.server.createSession ---

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateSessionInput<'a> {
    pub identifier: &'a str,
    pub password: &'a str,
}

/// An authenticated session. Only `access_jwt` is needed for reads.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    #[serde(rename = "accessJwt")]
    pub access_jwt: String,
    #[serde(rename = "refreshJwt")]
    pub refresh_jwt: Option<String>,
    pub handle: Option<String>,
    pub did: Option<String>,
}

// --- com.atproto.identity.resolveHandle ---

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ResolveHandleResponse {
    pub did: String,
}

// --- app.bsky.feed.searchPosts ---

/// Query parameters for one `searchPosts` page.
///
/// `tags` is sent as a repeated `tag` parameter, which is why this type
/// renders its own query pairs instead of going through `serde_urlencoded`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPostsRequest {
    pub q: String,
    pub sort: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub mentions: Option<String>,
    pub author: Option<String>,
    pub lang: Option<String>,
    pub domain: Option<String>,
    pub url: Option<String>,
    pub tags: Vec<String>,
    pub limit: u8,
    pub cursor: Option<String>,
}

impl SearchPostsRequest {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("q", self.q.clone())];
        let optional = [
            ("sort", &self.sort),
            ("since", &self.since),
            ("until", &self.until),
            ("mentions", &self.mentions),
            ("author", &self.author),
            ("lang", &self.lang),
            ("domain", &self.domain),
            ("url", &self.url),
        ];
        for (key, value) in optional {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                pairs.push((key, value.to_string()));
            }
        }
        pairs.extend(self.tags.iter().map(|tag| ("tag", tag.clone())));
        pairs.push(("limit", self.limit.to_string()));
        if let Some(cursor) = self.cursor.as_deref().filter(|c| !c.is_empty()) {
            pairs.push(("cursor", cursor.to_string()));
        }
        pairs
    }
}

/// One page of search results. Posts are kept as raw JSON; callers decide
/// which fields they need and how to treat malformed entries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPostsPage {
    #[serde(default)]
    pub posts: Vec<serde_json::Value>,
    pub cursor: Option<String>,
    #[serde(rename = "hitsTotal")]
    pub hits_total: Option<u64>,
}
