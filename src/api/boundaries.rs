use anyhow::{Context, Result, bail};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::FetchConfig;
use crate::document::BoundaryDocument;

const USER_AGENT: &str = "boundmap/0.1.0";

/// Where a boundary document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundarySource {
    Path(PathBuf),
    Url(String),
}

impl BoundarySource {
    /// `http://` and `https://` inputs are URLs, anything else is a file path
    pub fn parse(input: &str) -> Self {
        let lower = input.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            BoundarySource::Url(input.to_string())
        } else {
            BoundarySource::Path(PathBuf::from(input))
        }
    }

    /// `{stem}.wgs84.geojson` in the working directory
    ///
    /// The stem is the file stem for paths and the last URL segment up to its
    /// first `.` for URLs, falling back to `boundaries`.
    pub fn default_output_path(&self) -> PathBuf {
        let stem = match self {
            BoundarySource::Path(path) => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned()),
            BoundarySource::Url(url) => url
                .rsplit('/')
                .next()
                .and_then(|name| name.split('.').next())
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        };
        let stem = stem.unwrap_or_else(|| "boundaries".to_string());
        PathBuf::from(format!("{}.wgs84.geojson", stem))
    }
}

impl fmt::Display for BoundarySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundarySource::Path(path) => write!(f, "{}", path.display()),
            BoundarySource::Url(url) => f.write_str(url),
        }
    }
}

/// Load and decode a boundary document.
///
/// A single attempt is made; network and decode failures are returned as-is.
///
/// # Arguments
/// * `source` - Local file or http(s) URL
/// * `config` - Request timeout for URL sources
///
/// # Returns
/// * `Ok(BoundaryDocument)` - Decoded, not yet normalized
/// * `Err` - If the source cannot be read or is not a polygon FeatureCollection
pub fn fetch_boundaries(
    source: &BoundarySource,
    config: &FetchConfig,
) -> Result<BoundaryDocument> {
    let document = match source {
        BoundarySource::Path(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open boundary file: {}", path.display()))?;
            BoundaryDocument::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to decode boundary file: {}", path.display()))?
        }
        BoundarySource::Url(url) => fetch_url(url, config)?,
    };

    info!(
        source = %source,
        features = document.features.len(),
        "Loaded boundary document"
    );
    Ok(document)
}

fn fetch_url(url: &str, config: &FetchConfig) -> Result<BoundaryDocument> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to create HTTP client")?;

    debug!(url, timeout_secs = config.timeout_secs, "Requesting boundaries");
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("Failed to send request to {}", url))?;

    if !response.status().is_success() {
        bail!("Boundary request returned error status: {}", response.status());
    }

    let body = response
        .text()
        .context("Failed to read boundary response body")?;

    BoundaryDocument::from_json(&body)
        .with_context(|| format!("Failed to decode boundary response from {}", url))
}
