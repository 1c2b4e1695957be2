// FormatSelector - picks the formats a native player can open
//
// Converts raw formats from youtube-dl into ordered playback candidates.
// Handles:
// - Container/protocol eligibility (mp4 video, mp3/wav audio, plain HTTP(S))
// - One video format per height, ascending
// - Codec preferences (muxed first, then H.264 among video-only)
// - Initial quality by nearest height

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::models::MediaFormat;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("No supported video formats to select from")]
    EmptySet,
}

/// Playback-compatible formats derived from one parse result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportedFormatSet {
    /// Ascending by height, one entry per height
    pub video_formats: Vec<MediaFormat>,
    /// Audio-only formats in input order
    pub audio_formats: Vec<MediaFormat>,
}

impl SupportedFormatSet {
    pub fn is_empty(&self) -> bool {
        self.video_formats.is_empty() && self.audio_formats.is_empty()
    }
}

/// Result of a format switch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormatChoice<'a> {
    pub index: usize,
    pub format: &'a MediaFormat,
}

/// Format selector for the native video/audio pipeline
pub struct FormatSelector;

impl FormatSelector {
    /// Split raw formats into supported video and audio lists
    pub fn classify_formats(formats: &[MediaFormat]) -> SupportedFormatSet {
        let mut video_formats: Vec<MediaFormat> = formats
            .iter()
            .filter(|f| Self::is_video_candidate(f))
            .cloned()
            .collect();

        let audio_formats: Vec<MediaFormat> = formats
            .iter()
            .filter(|f| Self::is_audio_candidate(f))
            .cloned()
            .collect();

        // Stable sort keeps input order inside equal (height, rank) runs
        video_formats.sort_by_key(|f| (f.height, Self::preference_rank(f)));

        SupportedFormatSet {
            video_formats: Self::collapse_heights(video_formats),
            audio_formats,
        }
    }

    /// One entry per height from a list sorted by `(height, rank)`.
    ///
    /// The best rank wins. Within it, a later muxed or H.264 format replaces
    /// the earlier one; other video-only formats keep the first seen.
    fn collapse_heights(sorted: Vec<MediaFormat>) -> Vec<MediaFormat> {
        let mut collapsed: Vec<MediaFormat> = Vec::with_capacity(sorted.len());

        for format in sorted {
            match collapsed.last_mut() {
                Some(kept) if kept.height == format.height => {
                    let rank = Self::preference_rank(&format);
                    if rank < 2 && rank == Self::preference_rank(kept) {
                        *kept = format;
                    }
                }
                _ => collapsed.push(format),
            }
        }

        collapsed
    }

    /// mp4 with video over plain HTTP(S)
    pub fn is_video_candidate(format: &MediaFormat) -> bool {
        format.has_video() && format.ext == "mp4" && format.is_direct_http()
    }

    /// mp3/wav audio-only over plain HTTP(S)
    pub fn is_audio_candidate(format: &MediaFormat) -> bool {
        !format.has_video()
            && format.has_audio()
            && (format.ext == "mp3" || format.ext == "wav")
            && format.is_direct_http()
    }

    /// Lower is better: muxed, then H.264 video-only, then other video-only
    fn preference_rank(format: &MediaFormat) -> u8 {
        if format.has_audio() {
            0
        } else if format.is_avc() {
            1
        } else {
            2
        }
    }

    /// First muxed format, used to supply audio for a video-only pick
    pub fn select_audio_fallback(video_formats: &[MediaFormat]) -> Option<&MediaFormat> {
        video_formats.iter().find(|f| f.has_audio())
    }

    /// Index of the format nearest to `target_height`; ties go to the lower one
    pub fn select_initial_index(
        video_formats: &[MediaFormat],
        target_height: u32,
    ) -> Result<usize, SelectionError> {
        let mut best: Option<(usize, u64)> = None;

        for (index, format) in video_formats.iter().enumerate() {
            let diff = (i64::from(format.height) - i64::from(target_height)).unsigned_abs();
            match best {
                Some((_, best_diff)) if diff >= best_diff => {}
                _ => best = Some((index, diff)),
            }
        }

        best.map(|(index, _)| index).ok_or(SelectionError::EmptySet)
    }

    /// Bounds-checked switch; out-of-range `new_index` keeps the current choice
    pub fn switch_format(
        video_formats: &[MediaFormat],
        current_index: usize,
        new_index: usize,
    ) -> Option<FormatChoice<'_>> {
        let index = if new_index < video_formats.len() {
            new_index
        } else {
            current_index
        };

        video_formats
            .get(index)
            .map(|format| FormatChoice { index, format })
    }

    /// Next index for a cycling quality toggle
    pub fn next_index(len: usize, current_index: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some((current_index + 1) % len)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_format(id: &str, height: u32, vcodec: &str, acodec: &str) -> MediaFormat {
        MediaFormat {
            format_id: id.to_string(),
            ext: "mp4".to_string(),
            vcodec: vcodec.to_string(),
            acodec: acodec.to_string(),
            protocol: "https".to_string(),
            height,
            width: None,
            fps: None,
            filesize: None,
            format_note: None,
            url: format!("https://cdn.example.com/{}", id),
        }
    }

    fn make_audio_format(id: &str, ext: &str) -> MediaFormat {
        MediaFormat {
            ext: ext.to_string(),
            ..make_format(id, 0, "none", "mp3")
        }
    }

    fn heights(formats: &[MediaFormat]) -> Vec<u32> {
        formats.iter().map(|f| f.height).collect()
    }

    fn ids(formats: &[MediaFormat]) -> Vec<&str> {
        formats.iter().map(|f| f.format_id.as_str()).collect()
    }

    #[test]
    fn test_video_sorted_and_unique() {
        let formats = vec![
            make_format("a", 1080, "avc1.640028", "none"),
            make_format("b", 360, "avc1.42001E", "mp4a.40.2"),
            make_format("c", 720, "avc1.64001F", "mp4a.40.2"),
            make_format("d", 360, "vp9", "none"),
            make_format("e", 720, "av01.0.05M.08", "none"),
        ];

        let set = FormatSelector::classify_formats(&formats);
        assert_eq!(heights(&set.video_formats), vec![360, 720, 1080]);
        assert_eq!(ids(&set.video_formats), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_muxed_wins_either_order() {
        let muxed = make_format("muxed", 720, "vp9", "opus");
        let avc_only = make_format("avc", 720, "avc1.64001F", "none");

        for input in [
            vec![muxed.clone(), avc_only.clone()],
            vec![avc_only.clone(), muxed.clone()],
        ] {
            let set = FormatSelector::classify_formats(&input);
            assert_eq!(ids(&set.video_formats), vec!["muxed"]);
        }
    }

    #[test]
    fn test_avc_preferred_among_video_only() {
        let formats = vec![
            make_format("vp9", 1080, "vp9", "none"),
            make_format("avc", 1080, "avc1.640028", "none"),
        ];
        let set = FormatSelector::classify_formats(&formats);
        assert_eq!(ids(&set.video_formats), vec!["avc"]);

        let formats = vec![
            make_format("first", 1080, "vp9", "none"),
            make_format("second", 1080, "av01.0.08M.08", "none"),
        ];
        let set = FormatSelector::classify_formats(&formats);
        assert_eq!(ids(&set.video_formats), vec!["first"]);
    }

    #[test]
    fn test_later_muxed_replaces_earlier_muxed() {
        let formats = vec![
            make_format("first", 720, "avc1.64001F", "mp4a.40.2"),
            make_format("avc", 720, "avc1.4d401f", "none"),
            make_format("second", 720, "vp9", "opus"),
        ];
        let set = FormatSelector::classify_formats(&formats);
        assert_eq!(ids(&set.video_formats), vec!["second"]);
    }

    #[test]
    fn test_later_avc_replaces_earlier_avc() {
        let formats = vec![
            make_format("136", 720, "avc1.4d401f", "none"),
            make_format("398", 720, "av01.0.05M.08", "none"),
            make_format("298", 720, "avc1.4d4020", "none"),
        ];
        let set = FormatSelector::classify_formats(&formats);
        assert_eq!(ids(&set.video_formats), vec!["298"]);
    }

    #[test]
    fn test_muxed_kept_over_later_avc() {
        let formats = vec![
            make_format("22", 720, "avc1.64001F", "mp4a.40.2"),
            make_format("136", 720, "avc1.4d401f", "none"),
            make_format("298", 720, "avc1.4d4020", "none"),
        ];
        let set = FormatSelector::classify_formats(&formats);
        assert_eq!(ids(&set.video_formats), vec!["22"]);
    }

    #[test]
    fn test_ineligible_formats_dropped() {
        let mut webm = make_format("webm", 480, "vp9", "opus");
        webm.ext = "webm".to_string();
        let mut hls = make_format("hls", 720, "avc1.4d401f", "mp4a.40.2");
        hls.protocol = "m3u8_native".to_string();
        let mut m4a = make_audio_format("m4a", "m4a");
        m4a.acodec = "mp4a.40.2".to_string();

        let set = FormatSelector::classify_formats(&[webm, hls, m4a]);
        assert!(set.is_empty());
    }

    #[test]
    fn test_rtmp_only_yields_empty_set() {
        let mut video = make_format("v", 720, "avc1", "mp4a");
        video.protocol = "rtmp".to_string();
        let mut audio = make_audio_format("a", "mp3");
        audio.protocol = "rtmp".to_string();

        let set = FormatSelector::classify_formats(&[video, audio]);
        assert!(set.video_formats.is_empty());
        assert!(set.audio_formats.is_empty());
    }

    #[test]
    fn test_audio_only_in_input_order() {
        let formats = vec![
            make_audio_format("wav", "wav"),
            make_format("v", 720, "avc1", "mp4a"),
            make_audio_format("mp3-1", "mp3"),
            make_audio_format("mp3-2", "mp3"),
        ];
        let set = FormatSelector::classify_formats(&formats);
        assert_eq!(ids(&set.audio_formats), vec!["wav", "mp3-1", "mp3-2"]);
        assert!(set.audio_formats.iter().all(|f| f.vcodec == "none"));
    }

    #[test]
    fn test_classify_is_idempotent() {
        let formats = vec![
            make_format("a", 720, "vp9", "none"),
            make_format("b", 720, "avc1", "none"),
            make_format("c", 240, "avc1", "mp4a"),
            make_audio_format("d", "mp3"),
        ];
        assert_eq!(
            FormatSelector::classify_formats(&formats),
            FormatSelector::classify_formats(&formats)
        );
    }

    #[test]
    fn test_audio_fallback() {
        let formats = vec![
            make_format("a", 360, "avc1", "none"),
            make_format("b", 720, "avc1", "mp4a"),
            make_format("c", 1080, "avc1", "mp4a"),
        ];
        let fallback = FormatSelector::select_audio_fallback(&formats);
        assert_eq!(fallback.map(|f| f.format_id.as_str()), Some("b"));

        assert!(FormatSelector::select_audio_fallback(&formats[..1]).is_none());
    }

    #[test]
    fn test_initial_index_nearest() {
        let formats = vec![
            make_format("a", 360, "avc1", "mp4a"),
            make_format("b", 720, "avc1", "mp4a"),
            make_format("c", 1080, "avc1", "mp4a"),
        ];
        assert_eq!(FormatSelector::select_initial_index(&formats, 700), Ok(1));
        assert_eq!(FormatSelector::select_initial_index(&formats, u32::MAX), Ok(2));
        assert_eq!(FormatSelector::select_initial_index(&formats, 0), Ok(0));
    }

    #[test]
    fn test_initial_index_tie_prefers_lower() {
        let formats = vec![
            make_format("a", 360, "avc1", "mp4a"),
            make_format("b", 1080, "avc1", "mp4a"),
        ];
        assert_eq!(FormatSelector::select_initial_index(&formats, 720), Ok(0));
    }

    #[test]
    fn test_initial_index_empty() {
        assert_eq!(
            FormatSelector::select_initial_index(&[], 720),
            Err(SelectionError::EmptySet)
        );
    }

    #[test]
    fn test_switch_format_bounds() {
        let formats = vec![
            make_format("a", 360, "avc1", "mp4a"),
            make_format("b", 720, "avc1", "mp4a"),
        ];

        let choice = FormatSelector::switch_format(&formats, 0, 1).unwrap();
        assert_eq!(choice.index, 1);
        assert_eq!(choice.format.format_id, "b");

        let unchanged = FormatSelector::switch_format(&formats, 0, formats.len()).unwrap();
        assert_eq!(unchanged.index, 0);
        assert_eq!(unchanged.format.format_id, "a");

        assert!(FormatSelector::switch_format(&[], 0, 0).is_none());
    }

    #[test]
    fn test_next_index_cycles() {
        assert_eq!(FormatSelector::next_index(3, 1), Some(2));
        assert_eq!(FormatSelector::next_index(3, 2), Some(0));
        assert_eq!(FormatSelector::next_index(0, 0), None);
    }
}
