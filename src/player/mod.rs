// Player module - youtube-dl parsing and playback format selection

pub mod config;
pub mod errors;
pub mod format_selector;
pub mod models;
pub mod parser;
pub mod resolver;
pub mod session;
pub mod tools;
pub mod utils;

pub use config::ParserConfig;
pub use errors::{ErrorCode, ParseFailure, ParserError};
pub use format_selector::{FormatChoice, FormatSelector, SelectionError, SupportedFormatSet};
pub use models::{MediaFormat, MediaInfo, MediaThumbnail, ProcessingStatus, VideoQuality};
pub use parser::{ParseEvent, YtdlParser};
pub use resolver::{MediaResolver, YoutubeDlResolver};
pub use session::{AudioSession, VideoSession};
pub use tools::{ToolInfo, ToolManager};
