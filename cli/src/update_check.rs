//! Checks GitHub for a newer release of busctl.

use crate::config::UpdateCheckConfig;
use crate::error::{AppError, AppResult};
use semver::{BuildMetadata, Version};
use serde::Deserialize;
use std::time::Duration;

/// The version of this binary
pub fn current_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Release information from the GitHub API
#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    html_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    UpToDate { current: String },
    Available {
        current: String,
        latest: String,
        url: Option<String>,
    },
    Disabled,
}

pub async fn check_for_update(config: &UpdateCheckConfig) -> AppResult<UpdateStatus> {
    if !config.enabled() {
        log::info!("Update check disabled by configuration");
        return Ok(UpdateStatus::Disabled);
    }

    let release = fetch_latest_release(config.releases_url()).await?;
    Ok(compare_release(current_version(), release))
}

async fn fetch_latest_release(url: &str) -> AppResult<Release> {
    let client = reqwest::Client::builder()
        .user_agent(format!("busctl/{}", current_version()))
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| AppError::UpdateCheck(format!("Failed to create HTTP client: {e}")))?;

    log::debug!("Fetching latest release from {url}");
    let response = client.get(url).send().await.map_err(|e| {
        AppError::UpdateCheck(format!("Failed to fetch release information: {e}"))
    })?;

    if !response.status().is_success() {
        return Err(AppError::UpdateCheck(format!(
            "GitHub API returned status: {}",
            response.status()
        )));
    }

    response
        .json::<Release>()
        .await
        .map_err(|e| AppError::UpdateCheck(format!("Failed to parse release information: {e}")))
}

fn compare_release(current: &str, release: Release) -> UpdateStatus {
    let latest = release.tag_name.trim_start_matches('v');
    if is_newer(latest, current) {
        UpdateStatus::Available {
            current: current.to_string(),
            latest: latest.to_string(),
            url: release.html_url,
        }
    } else {
        UpdateStatus::UpToDate {
            current: current.to_string(),
        }
    }
}

/// Whether `latest` is a newer release than `current`, ignoring build metadata.
///
/// A tag that is not a semantic version counts as newer whenever it differs.
fn is_newer(latest: &str, current: &str) -> bool {
    match (parse_version(latest), parse_version(current)) {
        (Some(latest), Some(current)) => latest > current,
        _ => {
            log::warn!("Cannot compare versions '{latest}' and '{current}'");
            latest != current
        }
    }
}

fn parse_version(version: &str) -> Option<Version> {
    let mut version = Version::parse(version).ok()?;
    version.build = BuildMetadata::EMPTY;
    Some(version)
}
