mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bluesky_client::BlueskyClient;
use skyharvest::{harvest, query, store, HarvestConfig, HarvestError, ProgressSink};

use crate::cli::Opts;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("skyharvest=info".parse()?)
                .add_directive("bluesky_client=info".parse()?),
        )
        .init();

    let opts = Opts::parse();

    let config = HarvestConfig::from_env()?;
    config.log_redacted();

    let client = BlueskyClient::new(&config.service_url, config.request_timeout)
        .context("Failed to build HTTP client")?;

    info!("Authenticating...");
    let session = match client
        .create_session(&config.bluesky_handle, &config.bluesky_app_password)
        .await
    {
        Ok(session) => session,
        Err(err) => {
            error!(
                error = %err,
                response = err.body().unwrap_or("No response"),
                "Error during authentication"
            );
            return Err(HarvestError::Auth(err).into());
        }
    };
    info!("Authentication successful");

    let events = ProgressSink::new(opts.posts_limit);
    let spec = query::build(&client, &events, &session.access_jwt, opts.filters()).await?;

    let output_dir = opts.output_dir.clone().unwrap_or(config.output_dir.clone());
    let store_path = store::store_path(&output_dir, spec.query());

    let summary = harvest(&client, &events, &session.access_jwt, &spec, &store_path).await?;
    info!("Harvest complete. {summary}");

    Ok(())
}
