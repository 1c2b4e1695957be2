// youtube-dl provisioning - keeps a managed copy at the latest GitHub release

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use super::config::ParserConfig;
use super::errors::ParserError;
use super::utils;

/// Name of the release asset and of the managed executable
pub fn executable_name() -> &'static str {
    if cfg!(windows) {
        "youtube-dl.exe"
    } else {
        "youtube-dl"
    }
}

pub fn managed_executable_path(tool_dir: &Path) -> PathBuf {
    tool_dir.join(executable_name())
}

/// Subset of the GitHub release API response
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseInfo {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

impl ReleaseInfo {
    /// Download URL of the asset called `name`
    pub fn asset_url(&self, name: &str) -> Option<&str> {
        self.assets
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.browser_download_url.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ToolState {
    ytdl_version: Option<String>,
}

/// Installed youtube-dl version, persisted as `state.json` in the tool directory
pub struct VersionStore {
    path: PathBuf,
}

impl VersionStore {
    pub fn new(tool_dir: &Path) -> Self {
        Self {
            path: tool_dir.join("state.json"),
        }
    }

    /// Stored version; unreadable state counts as none
    pub fn load(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        serde_json::from_str::<ToolState>(&content)
            .ok()
            .and_then(|s| s.ytdl_version)
    }

    pub fn save(&self, version: &str) -> Result<(), ParserError> {
        let state = ToolState {
            ytdl_version: Some(version.to_string()),
        };
        let json = serde_json::to_string_pretty(&state)
            .map_err(|e| ParserError::UpdateLib(format!("Failed to encode state: {}", e)))?;
        std::fs::write(&self.path, json).map_err(|e| {
            ParserError::UpdateLib(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }
}

/// Tool status for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub managed_path: String,
    pub managed_present: bool,
    pub stored_version: Option<String>,
    /// Executable the resolver would run
    pub resolved_path: Option<String>,
    /// Output of `--version` for the resolved executable
    pub reported_version: Option<String>,
}

pub struct ToolManager {
    config: ParserConfig,
    client: reqwest::Client,
    store: VersionStore,
}

impl ToolManager {
    pub fn new(config: ParserConfig) -> Result<Self, ParserError> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            // GitHub rejects API calls without a user agent
            .user_agent(concat!("ytdl-player/", env!("CARGO_PKG_VERSION")));

        if let Some(proxy_url) = config.proxy.as_deref() {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| ParserError::FetchRelease(format!("Invalid proxy {}: {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ParserError::FetchRelease(format!("Failed to build HTTP client: {}", e)))?;
        let store = VersionStore::new(&config.tool_dir);

        Ok(Self {
            config,
            client,
            store,
        })
    }

    pub fn managed_path(&self) -> PathBuf {
        managed_executable_path(&self.config.tool_dir)
    }

    pub async fn fetch_latest_release(&self) -> Result<ReleaseInfo, ParserError> {
        debug!(target: "ytdl_tools", "Fetching {}", self.config.release_api);

        self.client
            .get(&self.config.release_api)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ParserError::FetchRelease(e.to_string()))?
            .json::<ReleaseInfo>()
            .await
            .map_err(|e| ParserError::FetchRelease(format!("Invalid release info: {}", e)))
    }

    /// Install the latest release when the managed copy is missing or outdated.
    ///
    /// Returns the new version when an install happened.
    pub async fn ensure_latest(&self) -> Result<Option<String>, ParserError> {
        let release = self.fetch_latest_release().await?;
        let current = self.store.load();
        let path = self.managed_path();

        if current.as_deref() == Some(release.tag_name.as_str()) && path.exists() {
            debug!(target: "ytdl_tools", "youtube-dl {} is up to date", release.tag_name);
            return Ok(None);
        }

        let download_url = release.asset_url(executable_name()).ok_or_else(|| {
            ParserError::FetchRelease(format!(
                "Release {} has no asset named {}",
                release.tag_name,
                executable_name()
            ))
        })?;

        let bytes = self
            .client
            .get(download_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ParserError::FetchRelease(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| ParserError::FetchRelease(format!("Download interrupted: {}", e)))?;

        self.install(&bytes).await?;
        self.store.save(&release.tag_name)?;

        info!(target: "ytdl_tools", "Updated youtube-dl to {}", release.tag_name);
        Ok(Some(release.tag_name))
    }

    async fn install(&self, bytes: &[u8]) -> Result<(), ParserError> {
        let path = self.managed_path();

        tokio::fs::create_dir_all(&self.config.tool_dir)
            .await
            .map_err(|e| {
                ParserError::UpdateLib(format!(
                    "Failed to create {}: {}",
                    self.config.tool_dir.display(),
                    e
                ))
            })?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ParserError::UpdateLib(format!("Failed to write {}: {}", path.display(), e)))?;

        grant_permission(&path).await
    }

    /// Status of the managed copy and of the executable `resolved_path` points at
    pub fn tool_status(&self, resolved_path: Option<String>) -> ToolInfo {
        let managed = self.managed_path();
        let reported_version = resolved_path.as_deref().and_then(utils::tool_version);

        ToolInfo {
            managed_path: managed.to_string_lossy().to_string(),
            managed_present: managed.exists(),
            stored_version: self.store.load(),
            resolved_path,
            reported_version,
        }
    }
}

#[cfg(unix)]
async fn grant_permission(path: &Path) -> Result<(), ParserError> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|e| ParserError::GrantPermission(format!("{}: {}", path.display(), e)))
}

#[cfg(not(unix))]
async fn grant_permission(_path: &Path) -> Result<(), ParserError> {
    Ok(())
}
