//! Harvest events — everything the pipeline has to tell the operator.
//!
//! Core components never print. They emit a [`HarvestEvent`] into an
//! injected [`EventSink`]; the binary decides whether that becomes a log
//! line, a progress bar tick, or both. Tests use
//! [`crate::testing::RecordingSink`] to assert on the stream directly.

use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use crate::types::MissingField;

#[derive(Debug, Clone, PartialEq)]
pub enum HarvestEvent {
    /// A mentions/author handle could not be resolved; the raw handle is used.
    HandleUnresolved {
        filter: &'static str,
        handle: String,
        error: String,
    },
    PageFetched {
        page: u32,
        returned: usize,
        total: usize,
    },
    /// The posts cap was hit; results were truncated to `cap`.
    CapReached { cap: usize },
    /// Pagination ended: no continuation cursor, or the same one again.
    Exhausted { total: usize },
    /// A page request failed; pagination stopped with `total` posts kept.
    PageFailed {
        page: u32,
        total: usize,
        status: Option<u16>,
        error: String,
        body: Option<String>,
    },
    PostDropped { index: usize, missing: MissingField },
    StoreRowSkipped { line: Option<u64>, error: String },
    NothingToSave,
    Saved {
        path: PathBuf,
        written: usize,
        new: usize,
        existing: usize,
    },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: HarvestEvent);
}

/// Writes every event as a structured `tracing` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: HarvestEvent) {
        match event {
            HarvestEvent::HandleUnresolved {
                filter,
                handle,
                error,
            } => {
                warn!(filter, %handle, %error, "Could not resolve handle, using it as given");
            }
            HarvestEvent::PageFetched {
                page,
                returned,
                total,
            } => {
                info!(page, returned, total, "Fetched page");
            }
            HarvestEvent::CapReached { cap } => {
                info!(cap, "Reached posts limit");
            }
            HarvestEvent::Exhausted { total } => {
                info!(total, "All posts fetched");
            }
            HarvestEvent::PageFailed {
                page,
                total,
                status,
                error,
                body,
            } => {
                error!(
                    page,
                    total,
                    ?status,
                    %error,
                    response = body.as_deref().unwrap_or("No response"),
                    "Error fetching posts, keeping partial results"
                );
            }
            HarvestEvent::PostDropped { index, missing } => {
                warn!(index, missing = %missing, "Missing data in post, skipping");
            }
            HarvestEvent::StoreRowSkipped { line, error } => {
                warn!(?line, %error, "Skipping unreadable row in existing store");
            }
            HarvestEvent::NothingToSave => {
                info!("No posts to save");
            }
            HarvestEvent::Saved {
                path,
                written,
                new,
                existing,
            } => {
                info!(path = %path.display(), written, new, existing, "Data saved");
            }
        }
    }
}

/// A progress bar sized to the posts cap, advanced by each page's size.
/// Every event is also forwarded to [`TracingSink`] with the bar suspended
/// so log lines do not tear it.
pub struct ProgressSink {
    bar: ProgressBar,
    inner: TracingSink,
}

impl ProgressSink {
    pub fn new(posts_limit: u32) -> Self {
        let bar = ProgressBar::new(u64::from(posts_limit));
        let style = ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] {wide_bar} {pos}/{len} posts",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self {
            bar,
            inner: TracingSink,
        }
    }
}

impl EventSink for ProgressSink {
    fn emit(&self, event: HarvestEvent) {
        match &event {
            HarvestEvent::PageFetched { returned, .. } => self.bar.inc(*returned as u64),
            HarvestEvent::CapReached { .. } | HarvestEvent::Exhausted { .. } => self.bar.finish(),
            HarvestEvent::PageFailed { .. } => self.bar.abandon(),
            _ => {}
        }
        self.bar.suspend(|| self.inner.emit(event));
    }
}
