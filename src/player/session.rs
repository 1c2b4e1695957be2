// Playback sessions - the selector's consumers
//
// A session is built from one `ParseEvent::Success` payload and answers what
// the playback surface should open: which URL, with which audio track, and
// what the quality toggle shows.

use tracing::{debug, warn};

use super::format_selector::{FormatSelector, SupportedFormatSet};
use super::models::{MediaFormat, MediaInfo, VideoQuality};
use super::utils::normalize_playback_url;

/// Video playback state for one parsed media
#[derive(Debug, Clone)]
pub struct VideoSession {
    info: MediaInfo,
    formats: SupportedFormatSet,
    format_index: usize,
}

impl VideoSession {
    pub fn new(info: MediaInfo, quality: VideoQuality) -> Self {
        let formats = FormatSelector::classify_formats(&info.formats);

        let format_index =
            match FormatSelector::select_initial_index(&formats.video_formats, quality.target_height()) {
                Ok(index) => index,
                Err(e) => {
                    warn!(target: "ytdl_session", "{}; using the parsed url", e);
                    0
                }
            };

        debug!(
            target: "ytdl_session",
            "{} video / {} audio formats supported, starting at index {}",
            formats.video_formats.len(),
            formats.audio_formats.len(),
            format_index
        );

        Self {
            info,
            formats,
            format_index,
        }
    }

    pub fn info(&self) -> &MediaInfo {
        &self.info
    }

    pub fn supported_formats(&self) -> &SupportedFormatSet {
        &self.formats
    }

    pub fn format_index(&self) -> usize {
        self.format_index
    }

    pub fn current_format(&self) -> Option<&MediaFormat> {
        self.formats.video_formats.get(self.format_index)
    }

    /// Anything the player could open
    pub fn has_playable_stream(&self) -> bool {
        self.current_format().is_some() || !self.info.url.is_empty()
    }

    /// URL for the video output; falls back to the url youtube-dl selected
    pub fn playback_url(&self) -> String {
        let url = self
            .current_format()
            .map(|f| f.url.as_str())
            .unwrap_or(self.info.url.as_str());
        normalize_playback_url(&self.info, url)
    }

    /// URL supplying audio: the current format when muxed, else the first muxed one
    pub fn audio_url(&self) -> Option<String> {
        let current = self.current_format()?;
        let source = if current.has_audio() {
            current
        } else {
            FormatSelector::select_audio_fallback(&self.formats.video_formats)?
        };
        Some(normalize_playback_url(&self.info, &source.url))
    }

    /// Switch to `index`; out of range keeps the current format
    pub fn switch_format(&mut self, index: usize) -> Option<&MediaFormat> {
        let choice =
            FormatSelector::switch_format(&self.formats.video_formats, self.format_index, index)?;
        self.format_index = choice.index;
        Some(choice.format)
    }

    /// Cycle to the next quality
    pub fn toggle_quality(&mut self) -> Option<&MediaFormat> {
        let next = FormatSelector::next_index(self.formats.video_formats.len(), self.format_index)?;
        self.switch_format(next)
    }

    pub fn quality_label(&self) -> Option<String> {
        self.current_format().map(MediaFormat::quality_label)
    }
}

/// Audio-only playback state for one parsed media
#[derive(Debug, Clone)]
pub struct AudioSession {
    info: MediaInfo,
    audio_formats: Vec<MediaFormat>,
}

impl AudioSession {
    pub fn new(info: MediaInfo) -> Self {
        let audio_formats = FormatSelector::classify_formats(&info.formats).audio_formats;
        Self {
            info,
            audio_formats,
        }
    }

    pub fn info(&self) -> &MediaInfo {
        &self.info
    }

    pub fn audio_formats(&self) -> &[MediaFormat] {
        &self.audio_formats
    }

    pub fn playback_url(&self) -> String {
        self.audio_formats
            .first()
            .map(|f| f.url.clone())
            .unwrap_or_else(|| self.info.url.clone())
    }
}
