//! Report files for scan and discovery results.
//!
//! Scan reports are written as JSON, Markdown or HTML depending on the file
//! extension, with a JSON copy (`report_visual.json`) beside them for the
//! viewer. Discovery results are always JSON.

mod discovery;
mod render;

pub use discovery::DiscoveryReport;

use crate::banner::BannerMap;
use crate::error::{ReportError, ReportResult};
use crate::summary::Explanations;
use crate::types::ReportId;
use crate::vuln::CveMap;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name of the JSON copy written next to every scan report.
pub const VISUAL_COPY: &str = "report_visual.json";

/// Everything learned about one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub id: ReportId,
    pub target: String,
    /// UTC time the report was assembled, RFC 3339 with a `Z` suffix.
    pub timestamp: String,
    pub open_ports: Vec<u16>,
    pub banners: BannerMap,
    pub cves: CveMap,
    pub explanations: Explanations,
}

/// Output format, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Markdown,
    Html,
}

impl ReportFormat {
    /// `.md` and `.html` select those formats; anything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("md") => Self::Markdown,
            Some("html") => Self::Html,
            _ => Self::Json,
        }
    }
}

impl ScanReport {
    pub fn new(
        target: impl Into<String>,
        open_ports: Vec<u16>,
        banners: BannerMap,
        cves: CveMap,
        explanations: Explanations,
    ) -> Self {
        Self {
            id: ReportId::new(),
            target: target.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            open_ports,
            banners,
            cves,
            explanations,
        }
    }

    /// Render the report in `format`.
    pub fn render(&self, format: ReportFormat) -> ReportResult<String> {
        match format {
            ReportFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            ReportFormat::Markdown => Ok(render::markdown(self)),
            ReportFormat::Html => Ok(render::html(self)),
        }
    }

    /// Write the report to `path` and the JSON copy beside it.
    ///
    /// Returns the path of the copy when it was written.
    pub fn save(&self, path: &Path) -> ReportResult<Option<PathBuf>> {
        let format = ReportFormat::from_path(path);
        write_file(path, &self.render(format)?)?;
        debug!(path = %path.display(), ?format, "report written");

        let copy = visual_copy_path(path);
        let written = self
            .render(ReportFormat::Json)
            .and_then(|json| write_file(&copy, &json));
        match written {
            Ok(()) => Ok(Some(copy)),
            Err(e) => {
                warn!(path = %copy.display(), error = %e, "could not write viewer copy");
                Ok(None)
            }
        }
    }
}

fn visual_copy_path(report: &Path) -> PathBuf {
    match report.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(VISUAL_COPY),
        _ => PathBuf::from(VISUAL_COPY),
    }
}

pub(crate) fn write_file(path: &Path, content: &str) -> ReportResult<()> {
    fs::write(path, content).map_err(|source| ReportError::WriteFailed {
        path: path.to_path_buf(),
        source,
    })
}
