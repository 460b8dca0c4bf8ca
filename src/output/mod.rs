use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::summarize::SummaryResult;

/// Summary document as written by the JSON formatter
#[derive(Debug, Serialize)]
pub struct SummaryReport<'a> {
    /// Video URL, or "text" for caller supplied transcripts
    pub source: &'a str,
    pub summary: &'a str,
    pub generated_at: DateTime<Utc>,
}

/// Render a summary in the requested format
pub fn format_summary(
    summary: &SummaryResult,
    source: &str,
    format: &OutputFormat,
    generated_at: DateTime<Utc>,
) -> Result<String> {
    let content = match format {
        OutputFormat::Text => summary.text.clone(),
        OutputFormat::Markdown => format!("# YT Insights\n\n## Insights\n\n{}\n", summary.text.trim()),
        OutputFormat::Json => serde_json::to_string_pretty(&SummaryReport {
            source,
            summary: &summary.text,
            generated_at,
        })
        .context("Failed to serialize summary")?,
    };

    Ok(content)
}

/// Save content to file
pub fn save_to_file(content: &str, path: &Path) -> Result<()> {
    fs_err::write(path, content)?;
    Ok(())
}

/// Print content to console
pub fn print_to_console(content: &str) {
    println!("{}", content);
}
