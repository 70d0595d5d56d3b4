use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{HarvestError, Result};

pub const DEFAULT_OUTPUT_DIR: &str = "scraped_posts";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Runtime configuration loaded from the environment (and `.env`, if present).
/// Credentials are required; everything else has a default.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub bluesky_handle: String,
    pub bluesky_app_password: String,
    pub service_url: String,
    pub output_dir: PathBuf,
    pub request_timeout: Duration,
}

impl HarvestConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` passes `std::env::var`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| HarvestError::Config(format!("{key} can not be empty")))
        };

        let request_timeout = match lookup("HARVEST_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                HarvestError::Config(format!("HARVEST_TIMEOUT_SECS must be a number, got {raw:?}"))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let config = Self {
            bluesky_handle: required("BLUESKY_HANDLE")?,
            bluesky_app_password: required("BLUESKY_APP_PASSWORD")?,
            service_url: lookup("BLUESKY_SERVICE_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| bluesky_client::DEFAULT_SERVICE_URL.to_string()),
            output_dir: lookup("HARVEST_OUTPUT_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            request_timeout: Duration::from_secs(request_timeout),
        };
        Ok(config)
    }

    pub fn log_redacted(&self) {
        fn preview(val: &str) -> String {
            let n = val.chars().count().min(3);
            let head: String = val.chars().take(n).collect();
            format!("{}...({} chars)", head, val.chars().count())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  BLUESKY_HANDLE: {}", self.bluesky_handle);
        tracing::info!("  BLUESKY_APP_PASSWORD: {}", preview(&self.bluesky_app_password));
        tracing::info!("  BLUESKY_SERVICE_URL: {}", self.service_url);
        tracing::info!("  HARVEST_OUTPUT_DIR: {}", self.output_dir.display());
        tracing::info!("  HARVEST_TIMEOUT_SECS: {}", self.request_timeout.as_secs());
    }
}
