//! Release check against GitHub and static app metadata.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Duration;
use thiserror::Error;

pub const APP_NAME: &str = "Lexia";
pub const APP_DESCRIPTION: &str = "Intelligent Text Rewriting Assistant";
pub const APP_AUTHOR: &str = "Muhammad Jawad Bashir";
pub const APP_BUILD: &str = "20250125";
pub const GITHUB_URL: &str = "https://github.com/stardust-96/lexia";
pub const RELEASE_API_URL: &str = "https://api.github.com/repos/stardust-96/lexia/releases/latest";
pub const UPDATE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("Could not check for updates: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Release server returned {0}")]
    Status(u16),

    #[error("Latest release has no version tag")]
    MissingTag,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub build: &'static str,
    pub author: &'static str,
    pub description: &'static str,
    pub homepage: &'static str,
}

impl AppInfo {
    pub fn current() -> Self {
        Self {
            name: APP_NAME,
            version: env!("CARGO_PKG_VERSION"),
            build: APP_BUILD,
            author: APP_AUTHOR,
            description: APP_DESCRIPTION,
            homepage: GITHUB_URL,
        }
    }

    /// "v1.1.0 (Build 20250125)"
    pub fn version_string(&self) -> String {
        format!("v{} (Build {})", self.version, self.build)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpdateStatus {
    UpToDate { current: String },
    UpdateAvailable { current: String, latest: String, url: String },
}

#[derive(Debug, Deserialize)]
struct LatestRelease {
    #[serde(default)]
    tag_name: String,
    #[serde(default)]
    html_url: Option<String>,
}

pub fn http_client() -> Result<reqwest::Client, UpdateError> {
    Ok(reqwest::Client::builder()
        .timeout(UPDATE_CHECK_TIMEOUT)
        .user_agent(concat!("Lexia/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Fetch the latest release from `url` and compare it with `current`
pub async fn check_for_updates(
    client: &reqwest::Client,
    url: &str,
    current: &str,
) -> Result<UpdateStatus, UpdateError> {
    log::info!("Checking for updates at {}", url);

    let response = client
        .get(url)
        .header("Accept", "application/vnd.github+json")
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(UpdateError::Status(response.status().as_u16()));
    }

    let release: LatestRelease = response.json().await?;
    let latest = release.tag_name.trim().trim_start_matches('v').to_string();
    if latest.is_empty() {
        return Err(UpdateError::MissingTag);
    }

    if is_newer(&latest, current) {
        log::info!("Update available: {} -> {}", current, latest);
        Ok(UpdateStatus::UpdateAvailable {
            current: current.to_string(),
            latest,
            url: release
                .html_url
                .unwrap_or_else(|| format!("{}/releases/latest", GITHUB_URL)),
        })
    } else {
        log::info!("Up to date ({})", current);
        Ok(UpdateStatus::UpToDate {
            current: current.to_string(),
        })
    }
}

fn parse_version(v: &str) -> Option<Vec<u64>> {
    v.trim()
        .trim_start_matches('v')
        .split('.')
        .map(|part| part.parse::<u64>().ok())
        .collect()
}

/// Numeric dotted comparison; tags that don't parse count as newer when
/// they differ from `current`
pub fn is_newer(latest: &str, current: &str) -> bool {
    match (parse_version(latest), parse_version(current)) {
        (Some(mut l), Some(mut c)) => {
            let len = l.len().max(c.len());
            l.resize(len, 0);
            c.resize(len, 0);
            l.cmp(&c) == Ordering::Greater
        }
        _ => latest.trim_start_matches('v') != current.trim_start_matches('v'),
    }
}
