use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One open port observed in a scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortInfo {
    pub port: u16,
    pub protocol: String,
    pub service: Option<String>,
    pub product: Option<String>,
    pub banner: Option<String>,
}

/// A stored screenshot taken during a scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreenshotRef {
    pub scan_id: String,
    pub target: String,
    /// Service the screenshot was taken of, e.g. `HTTP`, `HTTPS`, `VNC`.
    pub service: String,
    pub port: u16,
    /// Media-relative path of the full image.
    pub path: String,
    pub thumb_path: Option<String>,
    pub ctime: DateTime<Utc>,
}

/// A scan result for one host. Immutable once indexed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostResult {
    pub scan_id: String,
    pub ip: String,
    pub hostname: Option<String>,
    pub ctime: DateTime<Utc>,
    pub agent_version: Option<String>,
    #[serde(default)]
    pub port_count: usize,
    #[serde(default)]
    pub ports: Vec<PortInfo>,
    pub nmap_data: Option<String>,
    pub xml_data: Option<String>,
    pub gnmap_data: Option<String>,
    #[serde(default)]
    pub screenshots: Vec<ScreenshotRef>,
}

impl HostResult {
    /// Render this result in one of the raw export formats. Text formats
    /// return `None` when the scan did not produce that output.
    pub fn export(&self, format: ExportFormat) -> Option<String> {
        match format {
            ExportFormat::Json => serde_json::to_string(self).ok(),
            ExportFormat::Xml => self.xml_data.clone(),
            ExportFormat::Nmap => self.nmap_data.clone(),
            ExportFormat::Gnmap => self.gnmap_data.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xml,
    Nmap,
    Gnmap,
    Json,
}

impl ExportFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "xml" => Some(Self::Xml),
            "nmap" => Some(Self::Nmap),
            "gnmap" => Some(Self::Gnmap),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml | Self::Nmap | Self::Gnmap => "text/plain",
        }
    }
}

/// Latest screenshots of one host, used when browsing screenshots across hosts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostScreenshots {
    pub ip: String,
    pub scan_id: String,
    pub ctime: DateTime<Utc>,
    pub screenshots: Vec<ScreenshotRef>,
}

/// Newline-separated host list, optionally as `ip,scan_id` pairs.
pub fn hostlist(results: &[HostResult], include_scan_ids: bool) -> String {
    results.iter()
        .map(|r| if include_scan_ids {
            format!("{},{}", r.ip, r.scan_id)
        } else {
            r.ip.clone()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 1-based page arithmetic for paginated reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    pub fn new(page: Option<usize>, per_page: usize) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.max(1),
        }
    }

    /// Saturates for absurd page numbers; the store then returns an empty page.
    pub fn offset(&self) -> usize {
        self.per_page.saturating_mul(self.page - 1)
    }

    pub fn has_next(&self, total: u64) -> bool {
        total > self.page.saturating_mul(self.per_page) as u64
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}
