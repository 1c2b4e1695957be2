// YtdlParser - runs prepare + parse cycles off the caller's task
//
// Results come back as `ParseEvent`s on a single-consumer channel; the owner
// drains it from its own loop and feeds `Success` payloads to the sessions.
// One cycle runs at a time. Request ids let the owner drop stale results.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::config::ParserConfig;
use super::errors::{ParseFailure, ParserError};
use super::models::{MediaInfo, ProcessingStatus, DEFAULT_VIDEO_PARSE_OPTIONS};
use super::resolver::MediaResolver;
use super::tools::ToolManager;

/// Outcome of a prepare + parse cycle
#[derive(Debug, Clone, PartialEq)]
pub enum ParseEvent {
    Success { request_id: u64, info: MediaInfo },
    Failure { request_id: u64, failure: ParseFailure },
    /// A newer youtube-dl was installed during prepare
    VersionUpdated(String),
}

#[derive(Default)]
struct SharedState {
    status: Mutex<ProcessingStatus>,
    prepared: AtomicBool,
}

impl SharedState {
    fn status(&self) -> ProcessingStatus {
        *self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_status(&self, status: ProcessingStatus) {
        *self.status.lock().unwrap_or_else(|e| e.into_inner()) = status;
    }
}

pub struct YtdlParser {
    options: Option<String>,
    auto_update: bool,
    resolver: Arc<dyn MediaResolver>,
    updater: Option<Arc<ToolManager>>,
    shared: Arc<SharedState>,
    last_request_id: AtomicU64,
    events: mpsc::UnboundedSender<ParseEvent>,
}

impl YtdlParser {
    /// Create a parser and the receiving end of its event channel
    pub fn new(
        config: &ParserConfig,
        resolver: Arc<dyn MediaResolver>,
        updater: Option<Arc<ToolManager>>,
    ) -> (Self, mpsc::UnboundedReceiver<ParseEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();

        let parser = Self {
            options: config.options.clone(),
            auto_update: config.auto_update,
            resolver,
            updater,
            shared: Arc::new(SharedState::default()),
            last_request_id: AtomicU64::new(0),
            events,
        };

        (parser, receiver)
    }

    pub fn status(&self) -> ProcessingStatus {
        self.shared.status()
    }

    /// Whether youtube-dl has been checked/updated in this session
    pub fn is_prepared(&self) -> bool {
        self.shared.prepared.load(Ordering::SeqCst)
    }

    /// Custom youtube-dl options; `None` restores the default video options
    pub fn set_options(&mut self, options: Option<String>) {
        self.options = options;
    }

    /// Options the next parse will run with
    pub fn options(&self) -> &str {
        self.options.as_deref().unwrap_or(DEFAULT_VIDEO_PARSE_OPTIONS)
    }

    fn needs_update(&self) -> bool {
        self.auto_update && self.updater.is_some() && !self.is_prepared()
    }

    /// Start a prepare + parse cycle for `url`.
    ///
    /// Must be called inside a Tokio runtime. Returns the request id that the
    /// resulting `Success`/`Failure` event will carry, or `Busy` while a
    /// previous cycle is still running. A previous `Error` status is cleared.
    pub fn prepare_and_parse(&self, url: &str) -> Result<u64, ParserError> {
        let needs_update = self.needs_update();

        {
            let mut status = self.shared.status.lock().unwrap_or_else(|e| e.into_inner());
            if *status == ProcessingStatus::Error {
                *status = ProcessingStatus::Ready;
            }
            if *status != ProcessingStatus::Ready {
                warn!(target: "ytdl_parser", "Previous process not finished yet!");
                return Err(ParserError::Busy);
            }
            *status = if needs_update {
                ProcessingStatus::Updating
            } else {
                ProcessingStatus::Parsing
            };
        }

        let request_id = self.last_request_id.fetch_add(1, Ordering::SeqCst) + 1;
        let cycle = ParseCycle {
            request_id,
            url: url.to_string(),
            options: self.options().to_string(),
            updater: if needs_update { self.updater.clone() } else { None },
            resolver: Arc::clone(&self.resolver),
            shared: Arc::clone(&self.shared),
            events: self.events.clone(),
        };

        debug!(target: "ytdl_parser", "Request {} for {}", request_id, url);
        tokio::spawn(cycle.run());

        Ok(request_id)
    }
}

/// State moved into the background task for one request
struct ParseCycle {
    request_id: u64,
    url: String,
    options: String,
    updater: Option<Arc<ToolManager>>,
    resolver: Arc<dyn MediaResolver>,
    shared: Arc<SharedState>,
    events: mpsc::UnboundedSender<ParseEvent>,
}

impl ParseCycle {
    async fn run(self) {
        let mut guard = CycleGuard {
            request_id: self.request_id,
            shared: Arc::clone(&self.shared),
            events: self.events.clone(),
            armed: true,
        };
        let outcome = self.prepare_and_resolve().await;
        guard.armed = false;

        match outcome {
            Ok(info) => {
                info!(
                    target: "ytdl_parser",
                    "Success getting media resources via {}",
                    self.resolver.name()
                );
                self.shared.set_status(ProcessingStatus::Ready);
                self.emit(ParseEvent::Success {
                    request_id: self.request_id,
                    info,
                });
            }
            Err(e) => self.fail(e),
        }
    }

    async fn prepare_and_resolve(&self) -> Result<MediaInfo, ParserError> {
        if let Some(updater) = &self.updater {
            if let Some(version) = updater.ensure_latest().await? {
                self.emit(ParseEvent::VersionUpdated(version));
            }
        }

        self.shared.prepared.store(true, Ordering::SeqCst);
        self.shared.set_status(ProcessingStatus::Parsing);

        self.resolver.resolve(&self.url, &self.options).await
    }

    fn fail(&self, err: ParserError) {
        error!(target: "ytdl_parser", "Request {} failed: {}", self.request_id, err);
        self.shared.set_status(ProcessingStatus::Error);
        self.emit(ParseEvent::Failure {
            request_id: self.request_id,
            failure: ParseFailure::from(&err),
        });
    }

    fn emit(&self, event: ParseEvent) {
        if self.events.send(event).is_err() {
            debug!(target: "ytdl_parser", "Event receiver dropped");
        }
    }
}

/// Leaves the parser usable when a cycle dies without reporting
struct CycleGuard {
    request_id: u64,
    shared: Arc<SharedState>,
    events: mpsc::UnboundedSender<ParseEvent>,
    armed: bool,
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let err = ParserError::ParseException("parse task aborted".to_string());
        error!(target: "ytdl_parser", "Request {} failed: {}", self.request_id, err);
        self.shared.set_status(ProcessingStatus::Error);
        let _ = self.events.send(ParseEvent::Failure {
            request_id: self.request_id,
            failure: ParseFailure::from(&err),
        });
    }
}
