use serde::{Deserialize, Serialize};

/// A post exactly as the search endpoint returned it.
pub type RawPost = serde_json::Value;

/// Column order of the CSV store; matches the field order of [`PostRecord`].
pub const STORE_COLUMNS: [&str; 4] = ["author", "content", "created_at", "post_link"];

/// The flat record persisted per post. `post_link` is the store key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub author: String,
    #[serde(default)]
    pub content: String,
    pub created_at: String,
    pub post_link: String,
}

/// A field a raw post must carry to become a [`PostRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    AuthorHandle,
    Uri,
    IndexedAt,
}

impl MissingField {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingField::AuthorHandle => "author.handle",
            MissingField::Uri => "uri",
            MissingField::IndexedAt => "indexedAt",
        }
    }
}

impl std::fmt::Display for MissingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
