// Helper functions shared by the resolver, updater and sessions

use regex::Regex;
use std::process::{Command as StdCommand, Output, Stdio};
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration as TokioDuration};

use super::errors::ParserError;
use super::models::MediaInfo;

lazy_static::lazy_static! {
    static ref YOUTUBE_WATCH_RE: Regex = Regex::new(r"(^|//)www\.youtube\.com/").unwrap();
}

/// Run command with timeout, killing the child when it expires
pub async fn run_output_with_timeout(
    program: &str,
    args: &[String],
    timeout_secs: u64,
) -> Result<Output, ParserError> {
    let mut child = TokioCommand::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ParserError::ToolNotFound(program.to_string())
            } else {
                ParserError::ParseException(format!("Failed to start {}: {}", program, e))
            }
        })?;

    let mut stdout_pipe = child.stdout.take().ok_or_else(|| {
        ParserError::ParseException(format!("Failed to capture stdout from {}", program))
    })?;
    let mut stderr_pipe = child.stderr.take().ok_or_else(|| {
        ParserError::ParseException(format!("Failed to capture stderr from {}", program))
    })?;

    // Drain both pipes while waiting on the child
    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await?;
        Ok::<Vec<u8>, std::io::Error>(buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await?;
        Ok::<Vec<u8>, std::io::Error>(buf)
    });

    match timeout(TokioDuration::from_secs(timeout_secs), child.wait()).await {
        Ok(status_res) => {
            let status = status_res.map_err(|e| {
                ParserError::ParseException(format!("Failed to wait for {}: {}", program, e))
            })?;
            let stdout = join_pipe(stdout_task, "stdout").await?;
            let stderr = join_pipe(stderr_task, "stderr").await?;
            Ok(Output {
                status,
                stdout,
                stderr,
            })
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(ParserError::ParseException(format!(
                "{} timed out after {}s",
                program, timeout_secs
            )))
        }
    }
}

async fn join_pipe(
    task: tokio::task::JoinHandle<std::io::Result<Vec<u8>>>,
    name: &str,
) -> Result<Vec<u8>, ParserError> {
    task.await
        .map_err(|e| ParserError::ParseException(format!("{} task failed: {}", name, e)))?
        .map_err(|e| ParserError::ParseException(format!("Failed to read {}: {}", name, e)))
}

/// Locate a system install of one of `names` (common paths, then `which`)
pub fn find_system_binary(names: &[&str]) -> Option<String> {
    for name in names {
        let common_paths = [
            format!("/opt/homebrew/bin/{}", name), // Homebrew on Apple Silicon
            format!("/usr/local/bin/{}", name),    // Homebrew on Intel Mac
            format!("/usr/bin/{}", name),          // System installation
        ];

        for path in common_paths {
            if std::path::Path::new(&path).exists() {
                return Some(path);
            }
        }

        let finder = if cfg!(windows) { "where" } else { "which" };
        if let Ok(output) = StdCommand::new(finder).arg(name).output() {
            if output.status.success() {
                let stdout = String::from_utf8_lossy(&output.stdout);
                if let Some(path) = stdout.lines().next().map(str::trim) {
                    if !path.is_empty() {
                        return Some(path.to_string());
                    }
                }
            }
        }
    }

    None
}

/// Version string printed by `<program> --version`
pub fn tool_version(program: &str) -> Option<String> {
    match StdCommand::new(program).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let out = String::from_utf8_lossy(&output.stdout).trim().to_string();
            (!out.is_empty()).then_some(out)
        }
        _ => None,
    }
}

/// Strip playlist/index parameters from YouTube watch URLs
pub fn normalize_request_url(url: &str) -> String {
    if YOUTUBE_WATCH_RE.is_match(url) {
        url.split('&').next().unwrap_or(url).to_string()
    } else {
        url.to_string()
    }
}

/// Fix up a resolved URL before handing it to the player
pub fn normalize_playback_url(info: &MediaInfo, url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    if info.extractor == "vimeo" {
        return url.replace("source=1", "");
    }
    url.to_string()
}

/// Playback time as MM:SS, or HH:MM:SS from one hour up
pub fn format_time(seconds: f64) -> String {
    let duration = time::Duration::seconds_f64(seconds.max(0.0));
    let hours = duration.whole_hours();
    let minutes = duration.whole_minutes() % 60;
    let secs = duration.whole_seconds() % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info_with_extractor(extractor: &str) -> MediaInfo {
        MediaInfo {
            id: "1".to_string(),
            title: "t".to_string(),
            extractor: extractor.to_string(),
            url: String::new(),
            duration: 0,
            thumbnail: String::new(),
            thumbnails: Vec::new(),
            formats: Vec::new(),
        }
    }

    #[test]
    fn test_youtube_url_trimmed() {
        assert_eq!(
            normalize_request_url("https://www.youtube.com/watch?v=DDsRfbfnC_A&list=PL1&index=2"),
            "https://www.youtube.com/watch?v=DDsRfbfnC_A"
        );
        assert_eq!(
            normalize_request_url("https://vimeo.com/1?a=1&b=2"),
            "https://vimeo.com/1?a=1&b=2"
        );
    }

    #[test]
    fn test_vimeo_source_param_removed() {
        let info = info_with_extractor("vimeo");
        assert_eq!(
            normalize_playback_url(&info, "https://vod.vimeo.com/v.mp4?source=1&x=2"),
            "https://vod.vimeo.com/v.mp4?&x=2"
        );
        let other = info_with_extractor("youtube");
        assert_eq!(normalize_playback_url(&other, "https://a/b?source=1"), "https://a/b?source=1");
        assert_eq!(normalize_playback_url(&info, ""), "");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(75.4), "01:15");
        assert_eq!(format_time(3725.0), "01:02:05");
        assert_eq!(format_time(-3.0), "00:00");
    }

    #[tokio::test]
    async fn test_missing_program_reported() {
        let err = run_output_with_timeout("ytdl-player-no-such-binary", &[], 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ParserError::ToolNotFound(_)));
    }
}
