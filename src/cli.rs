//! Command-line interface parsing for newsfetch
//!
//! This module handles parsing of CLI arguments using clap, and validates them
//! into a `RunConfig` before any network or cache activity happens.

use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use clap::{ArgGroup, Parser, ValueEnum};
use thiserror::Error;

use crate::request::{Endpoint, NewsQuery};

/// Categories accepted by the API
pub const CATEGORIES: [&str; 7] = [
    "business",
    "entertainment",
    "general",
    "health",
    "science",
    "sports",
    "technology",
];

/// Sort orders accepted by the `everything` endpoint
pub const SORT_OPTIONS: [&str; 3] = ["relevancy", "popularity", "publishedAt"];

/// Country codes supported by the API
pub const COUNTRY_CODES: [&str; 54] = [
    "ae", "ar", "at", "au", "be", "bg", "br", "ca", "ch", "cn", "co", "cu", "cz", "de", "eg", "fr",
    "gb", "gr", "hk", "hu", "id", "ie", "il", "in", "it", "jp", "kr", "lt", "lv", "ma", "mx", "my",
    "ng", "nl", "no", "nz", "ph", "pl", "pt", "ro", "rs", "ru", "sa", "se", "sg", "si", "sk", "th",
    "tr", "tw", "ua", "us", "ve", "za",
];

/// Language codes supported by the API
pub const LANGUAGE_CODES: [&str; 14] = [
    "ar", "de", "en", "es", "fr", "he", "it", "nl", "no", "pt", "ru", "sv", "ud", "zh",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Error types for CLI argument validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("Invalid country code: {0}")]
    InvalidCountry(String),

    #[error("Invalid language code: {0}")]
    InvalidLanguage(String),

    #[error("Invalid {field}: Date must be in YYYY-MM-DD format, got: {value}")]
    InvalidDate { field: &'static str, value: String },

    #[error("From date must be before to date")]
    InvertedDateRange,
}

/// Output format for fetched results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Console,
    Json,
}

/// newsfetch - Fetch and filter news articles from NewsAPI
///
/// Examples:
///   newsfetch --query "artificial intelligence" --country us
///   newsfetch --category technology --language en --from-date 2025-08-01
///   newsfetch --sources "bbc-news,cnn" --output json
///   newsfetch --everything --query "climate change" --sort-by popularity
#[derive(Parser, Debug)]
#[command(name = "newsfetch")]
#[command(about = "Fetch and filter news articles from NewsAPI")]
#[command(version)]
#[command(group(ArgGroup::new("endpoint").args(["headlines", "everything", "list_sources"])))]
pub struct Cli {
    /// Fetch top headlines (default)
    #[arg(long)]
    pub headlines: bool,

    /// Search through all indexed articles
    #[arg(long)]
    pub everything: bool,

    /// List available news sources
    #[arg(long)]
    pub list_sources: bool,

    /// Keywords or phrases to search for
    #[arg(short, long)]
    pub query: Option<String>,

    /// Category of news to fetch
    #[arg(short, long, value_parser = CATEGORIES)]
    pub category: Option<String>,

    /// Country code (e.g., us, gb, de, fr)
    #[arg(long)]
    pub country: Option<String>,

    /// Language code
    #[arg(long, default_value = "en")]
    pub language: String,

    /// Comma-separated list of news sources (e.g., bbc-news,cnn)
    #[arg(long)]
    pub sources: Option<String>,

    /// Oldest article date (YYYY-MM-DD)
    #[arg(long)]
    pub from_date: Option<String>,

    /// Newest article date (YYYY-MM-DD)
    #[arg(long)]
    pub to_date: Option<String>,

    /// Fetch articles from the last N days (overrides --from-date)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub last_days: Option<u32>,

    /// Sort articles by
    #[arg(long, value_parser = SORT_OPTIONS, default_value = "publishedAt")]
    pub sort_by: String,

    /// Number of articles to fetch (max 100)
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub page_size: u32,

    /// Page number to fetch
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Console)]
    pub output: OutputFormat,

    /// Disable caching of API responses
    #[arg(long)]
    pub no_cache: bool,

    /// Remove all cached responses and exit
    #[arg(long)]
    pub clear_cache: bool,

    /// Directory for cached responses
    #[arg(long, env = "NEWSFETCH_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// API base URL
    #[arg(long, env = "NEWSFETCH_BASE_URL", hide = true)]
    pub base_url: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// What the binary should do once arguments are validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Fetch articles from an article endpoint
    Articles(Endpoint),
    /// List sources
    Sources,
    /// Empty the cache
    ClearCache,
}

/// Validated settings derived from CLI arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub action: Action,
    pub query: NewsQuery,
    pub output: OutputFormat,
    pub use_cache: bool,
    pub cache_dir: Option<PathBuf>,
    pub base_url: Option<String>,
}

impl RunConfig {
    /// Validates parsed arguments
    ///
    /// `today` anchors `--last-days`.
    pub fn from_cli(cli: &Cli, today: NaiveDate) -> Result<Self, CliError> {
        let country = cli
            .country
            .as_deref()
            .map(validate_country_code)
            .transpose()?;
        let language = validate_language_code(&cli.language)?;

        let mut from = cli
            .from_date
            .as_deref()
            .map(|value| validate_date("from-date", value))
            .transpose()?;
        let to = cli
            .to_date
            .as_deref()
            .map(|value| validate_date("to-date", value))
            .transpose()?;

        if let Some(days) = cli.last_days {
            from = Some(today - Duration::days(i64::from(days)));
        }

        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(CliError::InvertedDateRange);
            }
        }

        let action = if cli.clear_cache {
            Action::ClearCache
        } else if cli.list_sources {
            Action::Sources
        } else if cli.everything {
            Action::Articles(Endpoint::Everything)
        } else {
            Action::Articles(Endpoint::TopHeadlines)
        };

        let query = NewsQuery {
            query: cli.query.clone(),
            language: Some(language),
            country,
            category: cli.category.clone(),
            sources: cli.sources.as_deref().and_then(parse_sources_list),
            from: from.map(|d| d.format(DATE_FORMAT).to_string()),
            to: to.map(|d| d.format(DATE_FORMAT).to_string()),
            sort_by: Some(cli.sort_by.clone()),
            page_size: Some(cli.page_size),
            page: Some(cli.page),
        };

        Ok(RunConfig {
            action,
            query,
            output: cli.output,
            use_cache: !cli.no_cache,
            cache_dir: cli.cache_dir.clone(),
            base_url: cli.base_url.clone(),
        })
    }
}

/// Parses a `YYYY-MM-DD` date
pub fn validate_date(field: &'static str, value: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| CliError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

/// Lowercases and checks a country code against the supported set
pub fn validate_country_code(code: &str) -> Result<String, CliError> {
    let code = code.to_lowercase();
    if COUNTRY_CODES.contains(&code.as_str()) {
        Ok(code)
    } else {
        Err(CliError::InvalidCountry(code))
    }
}

/// Lowercases and checks a language code against the supported set
pub fn validate_language_code(code: &str) -> Result<String, CliError> {
    let code = code.to_lowercase();
    if LANGUAGE_CODES.contains(&code.as_str()) {
        Ok(code)
    } else {
        Err(CliError::InvalidLanguage(code))
    }
}

/// Trims a comma-separated source list, dropping blank entries
///
/// Returns `None` when nothing is left.
pub fn parse_sources_list(sources: &str) -> Option<String> {
    let cleaned: Vec<&str> = sources
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.join(","))
    }
}
