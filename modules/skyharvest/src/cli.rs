use std::path::PathBuf;

use chrono::{DateTime, NaiveDate};
use clap::Parser;

use skyharvest::query::{DEFAULT_PAGE_LIMIT, DEFAULT_POSTS_LIMIT};
use skyharvest::{lang, SearchFilters, SortOrder};

/// Search Bluesky posts and merge the results into a per-query CSV file.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Opts {
    /// Search query string
    #[arg(short, long)]
    pub query: String,

    /// Rank results by "top" or "latest"
    #[arg(short, long, value_enum, ignore_case = true)]
    pub sort: Option<SortOrder>,

    /// Only posts at or after this time ("YYYY-MM-DD" or RFC 3339)
    #[arg(long, value_parser = parse_timestamp)]
    pub since: Option<String>,

    /// Only posts before this time ("YYYY-MM-DD" or RFC 3339)
    #[arg(long, value_parser = parse_timestamp)]
    pub until: Option<String>,

    /// Only posts mentioning this account (handle or DID, omit the @)
    #[arg(short, long)]
    pub mentions: Option<String>,

    /// Only posts by this account (handle or DID, omit the @)
    #[arg(short, long)]
    pub author: Option<String>,

    /// Language name or ISO 639-1 code, e.g. "English" or "en"
    #[arg(short, long, value_parser = parse_lang)]
    pub lang: Option<String>,

    /// Only posts linking to this domain
    #[arg(short, long)]
    pub domain: Option<String>,

    /// Only posts linking to this URL
    #[arg(short, long)]
    pub url: Option<String>,

    /// Hashtag filter (omit the #). Repeat the flag or separate with commas
    #[arg(short, long)]
    pub tags: Vec<String>,

    /// Posts per page
    #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub limit: u32,

    /// Maximum posts to retrieve across all pages
    #[arg(long, default_value_t = DEFAULT_POSTS_LIMIT, value_parser = clap::value_parser!(u32).range(1..))]
    pub posts_limit: u32,

    /// Resume from a pagination cursor
    #[arg(long)]
    pub cursor: Option<String>,

    /// Directory for the CSV store (overrides HARVEST_OUTPUT_DIR)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

impl Opts {
    pub fn filters(&self) -> SearchFilters {
        SearchFilters {
            query: self.query.clone(),
            sort: self.sort,
            since: self.since.clone(),
            until: self.until.clone(),
            mentions: self.mentions.clone(),
            author: self.author.clone(),
            lang: self.lang.clone(),
            domain: self.domain.clone(),
            url: self.url.clone(),
            tags: split_tags(&self.tags),
            limit: Some(self.limit),
            cursor: self.cursor.clone(),
            posts_limit: Some(self.posts_limit),
        }
    }
}

/// Accept RFC 3339 as given; expand a bare date to midnight UTC.
fn parse_timestamp(raw: &str) -> Result<String, String> {
    let raw = raw.trim();
    if DateTime::parse_from_rfc3339(raw).is_ok() {
        return Ok(raw.to_string());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| format!("{}T00:00:00Z", date.format("%Y-%m-%d")))
        .map_err(|_| format!("expected YYYY-MM-DD or an RFC 3339 datetime, got {raw:?}"))
}

fn parse_lang(raw: &str) -> Result<String, String> {
    lang::resolve(raw)
        .map(str::to_string)
        .ok_or_else(|| format!("unknown language {raw:?}"))
}

/// `-t a -t "b, #c"` → `["a", "b", "c"]`
fn split_tags(raw: &[String]) -> Vec<String> {
    raw.iter()
        .flat_map(|t| t.split(','))
        .map(|t| t.trim().trim_start_matches('#').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
