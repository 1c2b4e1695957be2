// Common data models for the parser and playback sessions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// youtube-dl options that yield a stream the native video pipeline can open
pub const DEFAULT_VIDEO_PARSE_OPTIONS: &str =
    "--format [protocol=https][ext=mp4]/[protocol=http][ext=mp4] --no-cache-dir";

/// youtube-dl options that yield a stream an audio source can open
pub const DEFAULT_AUDIO_PARSE_OPTIONS: &str =
    "--format [protocol=https][ext=mp3]/[protocol=http][ext=mp3] --no-cache-dir";

/// Sentinel used by youtube-dl for an absent stream
pub const NO_CODEC: &str = "none";

/// One streamable variant reported by youtube-dl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFormat {
    /// Format ID (e.g., "18", "137")
    pub format_id: String,
    /// Container (mp4, webm, mp3, wav)
    pub ext: String,
    /// Video codec or "none"
    pub vcodec: String,
    /// Audio codec or "none"
    pub acodec: String,
    /// Transport (http, https, m3u8, rtmp, ...)
    pub protocol: String,
    /// Vertical resolution, 0 when unknown
    pub height: u32,
    pub width: Option<u32>,
    pub fps: Option<f32>,
    pub filesize: Option<u64>,
    /// Quality label (e.g., "720p", "medium")
    pub format_note: Option<String>,
    /// Direct media URL
    pub url: String,
}

impl MediaFormat {
    pub fn has_video(&self) -> bool {
        self.vcodec != NO_CODEC
    }

    pub fn has_audio(&self) -> bool {
        self.acodec != NO_CODEC
    }

    /// Plain HTTP(S) transport, playable without an adaptive player
    pub fn is_direct_http(&self) -> bool {
        self.protocol == "http" || self.protocol == "https"
    }

    /// Check if video codec is H.264 (avc1, avc3)
    pub fn is_avc(&self) -> bool {
        self.vcodec.starts_with("avc")
    }

    /// Label shown on a quality toggle: format note, else "{height}p"
    pub fn quality_label(&self) -> String {
        match self.format_note.as_deref() {
            Some(note) if !note.is_empty() => note.to_string(),
            _ => format!("{}p", self.height),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaThumbnail {
    pub id: String,
    pub url: String,
}

/// Media info parsed from `youtube-dl --dump-json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub id: String,
    pub title: String,
    /// Extractor key in lower case (youtube, vimeo, twitch:stream, ...)
    pub extractor: String,
    /// URL of the format picked by the `--format` option
    pub url: String,
    /// Duration in seconds, 0 for live streams
    pub duration: u64,
    pub thumbnail: String,
    pub thumbnails: Vec<MediaThumbnail>,
    pub formats: Vec<MediaFormat>,
}

/// Preferred playback quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoQuality {
    /// Highest available
    Best,
    P2160,
    P1440,
    P1080,
    #[default]
    P720,
    P480,
    P360,
}

impl VideoQuality {
    /// Height used to pick the initial format
    pub fn target_height(&self) -> u32 {
        match self {
            Self::Best => u32::MAX,
            Self::P2160 => 2160,
            Self::P1440 => 1440,
            Self::P1080 => 1080,
            Self::P720 => 720,
            Self::P480 => 480,
            Self::P360 => 360,
        }
    }

    /// youtube-dl options capped at this quality
    pub fn parse_options(&self) -> String {
        let best = match self {
            Self::Best => String::new(),
            other => format!("best[height<={}]", other.target_height()),
        };
        format!(
            "--format {}[protocol=https][ext=mp4]/[protocol=http][ext=mp4] --no-cache-dir",
            best
        )
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Best => write!(f, "best"),
            other => write!(f, "{}p", other.target_height()),
        }
    }
}

impl FromStr for VideoQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        match value.trim_end_matches('p') {
            "best" => Ok(Self::Best),
            "2160" | "4k" => Ok(Self::P2160),
            "1440" => Ok(Self::P1440),
            "1080" => Ok(Self::P1080),
            "720" => Ok(Self::P720),
            "480" => Ok(Self::P480),
            "360" => Ok(Self::P360),
            _ => Err(format!(
                "Unknown quality '{}' (expected best, 2160p, 1440p, 1080p, 720p, 480p or 360p)",
                s
            )),
        }
    }
}

/// Processing status of the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessingStatus {
    #[default]
    Ready,
    /// Fetching or installing youtube-dl
    Updating,
    Parsing,
    /// Last cycle failed; reset on the next request
    Error,
}
