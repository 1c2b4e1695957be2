// CLI resolver - runs the youtube-dl binary with `--dump-json`
//
// Executable lookup order:
// - Explicitly configured path
// - Managed copy installed by the updater
// - System install (youtube-dl, then yt-dlp)

use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info, warn};

use super::traits::MediaResolver;
use crate::player::config::ParserConfig;
use crate::player::errors::ParserError;
use crate::player::models::{MediaFormat, MediaInfo, MediaThumbnail, NO_CODEC};
use crate::player::tools;
use crate::player::utils::{find_system_binary, run_output_with_timeout};

/// CLI-based resolver using the youtube-dl binary
pub struct YoutubeDlResolver {
    config: ParserConfig,
}

impl YoutubeDlResolver {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Find the executable to run; re-evaluated per call so a fresh install is picked up
    pub fn locate(&self) -> Option<String> {
        if let Some(path) = &self.config.ytdl_path {
            return Some(path.to_string_lossy().to_string());
        }

        let managed = tools::managed_executable_path(&self.config.tool_dir);
        if managed.exists() {
            return Some(managed.to_string_lossy().to_string());
        }

        find_system_binary(&["youtube-dl", "yt-dlp"])
    }

    /// Build command arguments: `<options> [--proxy P] --dump-json <url>`
    fn build_args(&self, url: &str, options: &str) -> Vec<String> {
        let mut args: Vec<String> = options.split_whitespace().map(str::to_string).collect();

        if let Some(proxy) = &self.config.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }

        args.push("--dump-json".to_string());
        args.push(url.to_string());
        args
    }

    /// Parse `--dump-json` output
    pub fn parse_json(stdout: &[u8]) -> Result<MediaInfo, ParserError> {
        // Playlists print one document per entry; the first one wins
        let json: serde_json::Value = serde_json::Deserializer::from_slice(stdout)
            .into_iter::<serde_json::Value>()
            .next()
            .ok_or_else(|| ParserError::ParseException("youtube-dl printed no output".to_string()))?
            .map_err(|e| ParserError::ParseException(format!("Invalid JSON: {}", e)))?;

        Ok(MediaInfo {
            id: json["id"].as_str().unwrap_or("").to_string(),
            title: json["title"].as_str().unwrap_or("").to_string(),
            extractor: json["extractor"].as_str().unwrap_or("").to_lowercase(),
            url: json["url"].as_str().unwrap_or("").to_string(),
            duration: json["duration"].as_f64().unwrap_or(0.0).max(0.0) as u64,
            thumbnail: json["thumbnail"].as_str().unwrap_or("").to_string(),
            thumbnails: Self::parse_thumbnails(&json),
            formats: Self::parse_formats(&json),
        })
    }

    fn parse_thumbnails(json: &serde_json::Value) -> Vec<MediaThumbnail> {
        let Some(thumbnails) = json["thumbnails"].as_array() else {
            return Vec::new();
        };

        thumbnails
            .iter()
            .map(|t| MediaThumbnail {
                // id is a string on most extractors, a number on some
                id: match &t["id"] {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Number(n) => n.to_string(),
                    _ => String::new(),
                },
                url: t["url"].as_str().unwrap_or("").to_string(),
            })
            .collect()
    }

    fn parse_formats(json: &serde_json::Value) -> Vec<MediaFormat> {
        let Some(formats) = json["formats"].as_array() else {
            return Vec::new();
        };

        formats
            .iter()
            .map(|f| MediaFormat {
                format_id: f["format_id"].as_str().unwrap_or("").to_string(),
                ext: f["ext"].as_str().unwrap_or("").to_string(),
                vcodec: f["vcodec"].as_str().unwrap_or(NO_CODEC).to_string(),
                acodec: f["acodec"].as_str().unwrap_or(NO_CODEC).to_string(),
                protocol: f["protocol"].as_str().unwrap_or("").to_string(),
                height: f["height"].as_u64().and_then(|h| u32::try_from(h).ok()).unwrap_or(0),
                width: f["width"].as_u64().and_then(|w| u32::try_from(w).ok()),
                fps: f["fps"].as_f64().map(|fps| fps as f32),
                filesize: f["filesize"].as_u64().or_else(|| f["filesize_approx"].as_u64()),
                format_note: f["format_note"].as_str().map(|s| s.to_string()),
                url: f["url"].as_str().unwrap_or("").to_string(),
            })
            .collect()
    }
}

#[async_trait]
impl MediaResolver for YoutubeDlResolver {
    fn name(&self) -> &'static str {
        "cli-youtube-dl"
    }

    fn is_available(&self) -> bool {
        self.locate()
            .is_some_and(|p| Path::new(&p).exists() || find_system_binary(&[p.as_str()]).is_some())
    }

    async fn resolve(&self, url: &str, options: &str) -> Result<MediaInfo, ParserError> {
        let program = self
            .locate()
            .ok_or_else(|| ParserError::ToolNotFound("youtube-dl executable not found".to_string()))?;

        let args = self.build_args(url, options);
        debug!(target: "ytdl_resolver", "Running {} {}", program, args.join(" "));

        let output = run_output_with_timeout(&program, &args, self.config.timeout_seconds).await?;
        let stderr = String::from_utf8_lossy(&output.stderr);

        for line in stderr.lines().filter(|l| l.starts_with("WARNING:")) {
            warn!(target: "ytdl_resolver", "{}", line);
        }

        let has_error_line = stderr.lines().any(|l| l.starts_with("ERROR:"));
        if !output.status.success() || has_error_line {
            return Err(ParserError::from_tool_output(&stderr));
        }

        let info = Self::parse_json(&output.stdout)?;
        info!(
            target: "ytdl_resolver",
            "Resolved '{}' ({} formats)",
            info.title,
            info.formats.len()
        );
        Ok(info)
    }
}
