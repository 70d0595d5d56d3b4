pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod fetcher;
pub mod lang;
pub mod normalize;
pub mod query;
pub mod store;
pub mod testing;
pub mod types;

use std::path::Path;

use tracing::info;

pub use backend::SearchBackend;
pub use config::HarvestConfig;
pub use error::{HarvestError, Result};
pub use events::{EventSink, HarvestEvent, ProgressSink, TracingSink};
pub use fetcher::PageFetcher;
pub use query::{QuerySpec, SearchFilters, SortOrder};
pub use store::SaveOutcome;
pub use types::{MissingField, PostRecord, RawPost};

/// Counts from one end-to-end run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSummary {
    pub fetched: usize,
    pub normalized: usize,
    pub outcome: SaveOutcome,
}

impl std::fmt::Display for HarvestSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fetched={} normalized={}", self.fetched, self.normalized)?;
        match &self.outcome {
            SaveOutcome::NothingToSave => write!(f, " saved=none"),
            SaveOutcome::Saved { path, written, .. } => {
                write!(f, " stored={} path={}", written, path.display())
            }
        }
    }
}

/// Fetch every page for `spec`, normalize the posts, and merge them into the
/// store at `store_path`.
pub async fn harvest(
    backend: &dyn SearchBackend,
    events: &dyn EventSink,
    token: &str,
    spec: &QuerySpec,
    store_path: &Path,
) -> Result<HarvestSummary> {
    info!(query = spec.query(), posts_limit = spec.posts_limit(), "Fetching posts");
    let raw = PageFetcher::new(backend, events).fetch(spec, token).await?;

    info!(count = raw.len(), "Extracting post data");
    let records = normalize::normalize(&raw, events);
    let normalized = records.len();

    info!(path = %store_path.display(), "Saving posts");
    let outcome = store::persist(records, store_path, events)?;

    Ok(HarvestSummary {
        fetched: raw.len(),
        normalized,
        outcome,
    })
}
