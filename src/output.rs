//! Plain-text and JSON rendering of API payloads

use std::io::{self, Write};

use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;

use crate::cli::OutputFormat;

const MAX_TITLE_LENGTH: usize = 80;
const DISPLAY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes `payload` to `out` in the requested format
pub fn render<W: Write>(out: &mut W, payload: &Value, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(payload)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            writeln!(out, "{}", json)
        }
        OutputFormat::Console => render_console(out, payload),
    }
}

/// Article listing returned by `top-headlines` and `everything`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ArticlesResponse {
    total_results: Option<u64>,
    articles: Vec<Article>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Article {
    title: Option<String>,
    source: SourceRef,
    published_at: Option<String>,
    url: Option<String>,
}

/// The `{id, name}` pair embedded in each article, and listed by `sources`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SourceRef {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SourcesResponse {
    sources: Vec<SourceRef>,
}

fn render_console<W: Write>(out: &mut W, payload: &Value) -> io::Result<()> {
    let invalid = |e: serde_json::Error| io::Error::new(io::ErrorKind::InvalidData, e);

    if payload.get("sources").is_some() {
        let listing = SourcesResponse::deserialize(payload).map_err(invalid)?;
        writeln!(out, "{} sources", listing.sources.len())?;
        for source in &listing.sources {
            writeln!(
                out,
                "  {:<24} {}",
                source.id.as_deref().unwrap_or(""),
                source.name.as_deref().unwrap_or("")
            )?;
        }
        return Ok(());
    }

    let listing = ArticlesResponse::deserialize(payload).map_err(invalid)?;
    let shown = listing.articles.len();
    let total = listing.total_results.unwrap_or(shown as u64);
    writeln!(out, "Found {} articles, showing {}", total, shown)?;

    for (index, article) in listing.articles.iter().enumerate() {
        writeln!(out)?;
        writeln!(
            out,
            "{}. {}",
            index + 1,
            truncate(article.title.as_deref().unwrap_or(""), MAX_TITLE_LENGTH)
        )?;
        writeln!(
            out,
            "   {} | {}",
            article.source.name.as_deref().unwrap_or(""),
            format_date(article.published_at.as_deref().unwrap_or(""))
        )?;
        if let Some(url) = &article.url {
            writeln!(out, "   {}", url)?;
        }
    }

    Ok(())
}

/// Shortens `text` to at most `max` characters, ending in "..."
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Reformats an RFC 3339 timestamp; anything else is shown as-is
fn format_date(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format(DISPLAY_DATE_FORMAT).to_string())
        .unwrap_or_else(|_| raw.to_string())
}
