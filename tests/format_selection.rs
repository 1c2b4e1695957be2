use ytdl_player_lib::player::utils::format_time;
use ytdl_player_lib::{
    AudioSession, FormatSelector, MediaInfo, VideoQuality, VideoSession, YoutubeDlResolver,
};

fn youtube_fixture() -> MediaInfo {
    let raw = include_bytes!("fixtures/youtube_dump.json");
    YoutubeDlResolver::parse_json(raw).expect("fixture parses")
}

fn ids(formats: &[ytdl_player_lib::MediaFormat]) -> Vec<&str> {
    formats.iter().map(|f| f.format_id.as_str()).collect()
}

#[test]
fn classifies_youtube_dump() {
    let info = youtube_fixture();
    let set = FormatSelector::classify_formats(&info.formats);

    // dash/hls/webm variants are dropped, muxed and avc win per height
    assert_eq!(ids(&set.video_formats), vec!["160", "18", "22", "299", "401"]);
    assert_eq!(ids(&set.audio_formats), vec!["mp3-128"]);

    let heights: Vec<u32> = set.video_formats.iter().map(|f| f.height).collect();
    assert!(heights.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn later_avc_wins_same_height_collision() {
    let info = youtube_fixture();
    let set = FormatSelector::classify_formats(&info.formats);

    // 137 and 299 are both 1080p H.264 video-only; the later one is kept
    let at_1080: Vec<&str> = set
        .video_formats
        .iter()
        .filter(|f| f.height == 1080)
        .map(|f| f.format_id.as_str())
        .collect();
    assert_eq!(at_1080, vec!["299"]);

    // 136 and 298 collide at 720p too, but muxed 22 outranks both
    let at_720 = set.video_formats.iter().find(|f| f.height == 720);
    assert_eq!(at_720.map(|f| f.format_id.as_str()), Some("22"));
}

#[test]
fn picks_initial_quality_per_preference() {
    let info = youtube_fixture();
    let set = FormatSelector::classify_formats(&info.formats);

    let pick = |quality: VideoQuality| {
        FormatSelector::select_initial_index(&set.video_formats, quality.target_height()).unwrap()
    };

    assert_eq!(pick(VideoQuality::P360), 1);
    assert_eq!(pick(VideoQuality::P720), 2);
    assert_eq!(pick(VideoQuality::P1080), 3);
    assert_eq!(pick(VideoQuality::P1440), 3);
    assert_eq!(pick(VideoQuality::Best), 4);
}

#[test]
fn video_session_over_fixture() {
    let mut session = VideoSession::new(youtube_fixture(), VideoQuality::P1080);

    assert_eq!(session.quality_label().as_deref(), Some("1080p"));
    assert_eq!(
        session.playback_url(),
        "https://rr1.googlevideo.com/videoplayback?itag=299"
    );
    // 299 is video-only; sound comes from the first muxed format
    assert_eq!(
        session.audio_url().as_deref(),
        Some("https://rr1.googlevideo.com/videoplayback?itag=18")
    );

    session.toggle_quality();
    assert_eq!(session.quality_label().as_deref(), Some("2160p"));
    session.toggle_quality();
    assert_eq!(session.quality_label().as_deref(), Some("144p"));

    let len = session.supported_formats().video_formats.len();
    assert_eq!(session.switch_format(len).map(|f| f.height), Some(144));
}

#[test]
fn audio_session_over_fixture() {
    let session = AudioSession::new(youtube_fixture());
    assert_eq!(session.playback_url(), "http://media.example.com/audio.mp3");
    assert_eq!(format_time(session.info().duration as f64), "01:02:05");
}
