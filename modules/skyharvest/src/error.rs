//! Typed errors for the harvest pipeline.
//!
//! Only conditions that should end the run live here. Degraded outcomes
//! (an unresolved handle, a failed page, a malformed post or store row)
//! are reported through [`crate::events::EventSink`] instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("a search query term is required")]
    MissingQuery,

    #[error("an access token is required")]
    MissingToken,

    #[error("page size must be between 1 and 100, got {0}")]
    InvalidPageLimit(u32),

    #[error("posts limit must be at least 1, got {0}")]
    InvalidPostsLimit(u32),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("authentication failed: {0}")]
    Auth(#[source] bluesky_client::BlueskyError),

    #[error("store {path} is missing required column(s): {missing}")]
    StoreHeader { path: PathBuf, missing: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, HarvestError>;
