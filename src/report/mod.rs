//! Report rendering: self-contained HTML page and JSON dump.
//!
//! Consumes an [`Analysis`] and never feeds anything back into the core.

mod charts;
mod html;

use std::path::Path;

use tracing::info;

use crate::error::AnalysisError;
use crate::pipeline::Analysis;

pub use html::render_html;

/// Serialize the full analysis as pretty-printed JSON.
pub fn render_json(analysis: &Analysis) -> Result<String, AnalysisError> {
    serde_json::to_string_pretty(analysis)
        .map_err(|e| AnalysisError::Io(std::io::Error::other(e)))
}

/// Write the HTML report to `path`.
pub fn write_html(analysis: &Analysis, path: &Path) -> Result<(), AnalysisError> {
    let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    std::fs::write(path, render_html(analysis, &generated_at)?)?;
    info!(path = %path.display(), "HTML report written");
    Ok(())
}

/// Write the JSON dump to `path`.
pub fn write_json(analysis: &Analysis, path: &Path) -> Result<(), AnalysisError> {
    std::fs::write(path, render_json(analysis)?)?;
    info!(path = %path.display(), "JSON statistics written");
    Ok(())
}
