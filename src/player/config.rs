// Parser configuration shared by the resolver, updater and parser

use std::path::PathBuf;

/// Latest youtube-dl release on GitHub
pub const YTDL_LATEST_RELEASE_API: &str =
    "https://api.github.com/repos/ytdl-org/youtube-dl/releases/latest";

/// Configuration for resolving media URLs
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Explicit youtube-dl executable; skips managed and system lookup
    pub ytdl_path: Option<PathBuf>,
    /// Directory holding the managed youtube-dl copy and its version state
    pub tool_dir: PathBuf,
    /// Release API queried by the updater
    pub release_api: String,
    /// Custom youtube-dl options; `None` uses the default video options
    pub options: Option<String>,
    /// HTTP/SOCKS proxy passed to youtube-dl and the updater
    pub proxy: Option<String>,
    /// youtube-dl run timeout in seconds
    pub timeout_seconds: u64,
    /// Fetch the latest youtube-dl before the first parse
    pub auto_update: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            ytdl_path: None,
            tool_dir: default_tool_dir(),
            release_api: YTDL_LATEST_RELEASE_API.to_string(),
            options: None,
            proxy: None,
            timeout_seconds: 60,
            auto_update: true,
        }
    }
}

impl ParserConfig {
    pub fn with_ytdl_path(mut self, path: Option<PathBuf>) -> Self {
        self.ytdl_path = path;
        self
    }

    pub fn with_tool_dir(mut self, dir: PathBuf) -> Self {
        self.tool_dir = dir;
        self
    }

    pub fn with_release_api(mut self, url: impl Into<String>) -> Self {
        self.release_api = url.into();
        self
    }

    pub fn with_options(mut self, options: Option<String>) -> Self {
        self.options = options;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_auto_update(mut self, enabled: bool) -> Self {
        self.auto_update = enabled;
        self
    }
}

/// `<data dir>/ytdl-player/youtube-dl`, falling back to the working directory
pub fn default_tool_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytdl-player")
        .join("youtube-dl")
}
