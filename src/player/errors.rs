// Error types for the youtube-dl parser and its collaborators

use serde::{Deserialize, Serialize};
use thiserror::Error;

lazy_static::lazy_static! {
    static ref TOOL_ERROR_RE: regex::Regex = regex::Regex::new(r"(?m)^ERROR:\s*(.+)$").unwrap();
}

/// Error codes reported through `ParseEvent::Failure`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Release API or executable download request failed
    FetchReleaseApiFailed,
    /// Writing the downloaded executable or its version failed
    UpdateLibFailed,
    /// Marking the downloaded executable as runnable failed
    GrantLibPermissionFailed,
    /// youtube-dl reported an error for the requested URL
    ParseFailed,
    /// youtube-dl could not be run or its output could not be read
    ParseException,
}

#[derive(Debug, Clone, Error)]
pub enum ParserError {
    /// GitHub release API or asset download failed
    #[error("Failed to fetch youtube-dl release: {0}")]
    FetchRelease(String),

    /// Local install of the downloaded executable failed
    #[error("Failed to update youtube-dl: {0}")]
    UpdateLib(String),

    #[error("Failed to grant youtube-dl permission: {0}")]
    GrantPermission(String),

    /// youtube-dl ran and reported an error
    #[error("Parse failed: {0}")]
    ParseFailed(String),

    /// youtube-dl could not be started, timed out, or printed invalid JSON
    #[error("Parse exception: {0}")]
    ParseException(String),

    /// No usable youtube-dl executable
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Previous prepare/parse cycle is still running
    #[error("Previous process not finished yet")]
    Busy,
}

impl ParserError {
    /// Code surfaced to event consumers
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::FetchRelease(_) => ErrorCode::FetchReleaseApiFailed,
            Self::UpdateLib(_) => ErrorCode::UpdateLibFailed,
            Self::GrantPermission(_) => ErrorCode::GrantLibPermissionFailed,
            Self::ParseFailed(_) => ErrorCode::ParseFailed,
            Self::ParseException(_) | Self::ToolNotFound(_) | Self::Busy => {
                ErrorCode::ParseException
            }
        }
    }

    /// Classify stderr of a failed youtube-dl run.
    ///
    /// The first `ERROR:` line becomes the message when present.
    pub fn from_tool_output(stderr: &str) -> Self {
        if stderr.contains("No such file") || stderr.contains("command not found") {
            return Self::ToolNotFound(stderr.trim().to_string());
        }

        match TOOL_ERROR_RE.captures(stderr) {
            Some(caps) => Self::ParseFailed(caps[1].trim().to_string()),
            None if stderr.trim().is_empty() => {
                Self::ParseFailed("youtube-dl exited with an error".to_string())
            }
            None => Self::ParseFailed(stderr.trim().to_string()),
        }
    }
}

/// Failure payload carried by parse events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFailure {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&ParserError> for ParseFailure {
    fn from(err: &ParserError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_line_extracted() {
        let stderr = "WARNING: falling back to generic\nERROR: Unsupported URL: https://example.com\n";
        match ParserError::from_tool_output(stderr) {
            ParserError::ParseFailed(msg) => assert_eq!(msg, "Unsupported URL: https://example.com"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_tool_detected() {
        let err = ParserError::from_tool_output("sh: youtube-dl: command not found");
        assert!(matches!(err, ParserError::ToolNotFound(_)));
        assert_eq!(err.code(), ErrorCode::ParseException);
    }

    #[test]
    fn test_failure_carries_code() {
        let failure = ParseFailure::from(&ParserError::GrantPermission("EPERM".into()));
        assert_eq!(failure.code, ErrorCode::GrantLibPermissionFailed);
        assert!(failure.message.contains("EPERM"));
    }
}
