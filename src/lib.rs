pub mod logging;
pub mod player;

pub use logging::init_logging;
pub use player::{
    AudioSession, ErrorCode, FormatSelector, MediaFormat, MediaInfo, ParseEvent, ParseFailure,
    ParserConfig, ParserError, ProcessingStatus, SupportedFormatSet, ToolManager, VideoQuality,
    VideoSession, YoutubeDlResolver, YtdlParser,
};
