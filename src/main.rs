//! newsfetch - Fetch news articles from NewsAPI
//!
//! A command-line tool that queries NewsAPI's top-headlines, everything, and
//! sources endpoints, caching responses locally between runs.

use std::io;
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use newsfetch::cache::{CacheManager, ResponseStore};
use newsfetch::cli::{Action, Cli, RunConfig};
use newsfetch::config::{api_key_from_env, ApiConfig};
use newsfetch::output;
use newsfetch::NewsClient;

/// Installs a stderr log subscriber; `RUST_LOG` overrides the default level
fn setup_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Builds the client configuration from validated arguments
fn api_config(run: &RunConfig) -> ApiConfig {
    let mut config = ApiConfig::default();
    if let Some(base_url) = &run.base_url {
        config = config.with_base_url(base_url.as_str());
    }
    if let Some(dir) = &run.cache_dir {
        config = config.with_cache_dir(dir.clone());
    }
    config
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let run = RunConfig::from_cli(&cli, Local::now().date_naive())?;
    let config = api_config(&run);

    if run.action == Action::ClearCache {
        let cache = CacheManager::new(config.resolved_cache_dir(), config.cache_ttl);
        let removed = cache.clear();
        println!(
            "Removed {} cached responses from {}",
            removed,
            cache.cache_dir().display()
        );
        return Ok(());
    }

    let api_key = api_key_from_env()?;
    let client = NewsClient::new(api_key, &config, run.use_cache)?;

    if client.caching_enabled() {
        let swept = client.clear_expired();
        debug!(swept, "removed expired cache entries");
    }

    let payload = match &run.action {
        Action::Articles(endpoint) => client.fetch_news(*endpoint, &run.query).await?,
        _ => {
            client
                .get_sources(
                    run.query.category.as_deref(),
                    run.query.language.as_deref(),
                    run.query.country.as_deref(),
                )
                .await?
        }
    };

    output::render(&mut io::stdout().lock(), &payload, run.output)?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
