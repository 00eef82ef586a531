// Error handling for the player controller

use std::fmt;

use crate::engine::{EngineError, EngineErrorKind};

/// Internal error type returned by controller commands
#[derive(Debug, Clone)]
pub enum PlayerError {
    /// Failed to set up the pipeline or an element
    InitializationError(String),

    /// Command rejected because of the current playback state
    InvalidState(String),

    /// Command argument outside its documented range
    InvalidArgument(String),

    /// Pipeline operation failed
    PipelineError(String),

    /// Network error (fetching or streaming)
    NetworkError(String),

    /// Playlist expansion error
    PlaylistError(String),

    /// Dispatcher or worker thread error
    ThreadError(String),

    /// IO error
    IoError(String),
}

impl fmt::Display for PlayerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PlayerError::InitializationError(msg) => write!(f, "Initialization error: {}", msg),
            PlayerError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            PlayerError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            PlayerError::PipelineError(msg) => write!(f, "Pipeline error: {}", msg),
            PlayerError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            PlayerError::PlaylistError(msg) => write!(f, "Playlist error: {}", msg),
            PlayerError::ThreadError(msg) => write!(f, "Thread error: {}", msg),
            PlayerError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for PlayerError {}

/// Result type alias for controller operations
pub type Result<T> = std::result::Result<T, PlayerError>;

impl From<std::io::Error> for PlayerError {
    fn from(err: std::io::Error) -> Self {
        PlayerError::IoError(err.to_string())
    }
}

/// Error kinds surfaced to the playback observer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaError {
    Unknown,
    InvalidRequest,
    ServiceUnavailable,
    InternalServerError,
    InternalDeviceError,
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            MediaError::Unknown => "MEDIA_ERROR_UNKNOWN",
            MediaError::InvalidRequest => "MEDIA_ERROR_INVALID_REQUEST",
            MediaError::ServiceUnavailable => "MEDIA_ERROR_SERVICE_UNAVAILABLE",
            MediaError::InternalServerError => "MEDIA_ERROR_INTERNAL_SERVER_ERROR",
            MediaError::InternalDeviceError => "MEDIA_ERROR_INTERNAL_DEVICE_ERROR",
        };
        write!(f, "{}", name)
    }
}

/// Map an engine bus error into the observable taxonomy.
///
/// `from_source_element` says whether the failing element is the current
/// source; errors originating anywhere else in the pipeline are device
/// errors. `remote` is the adapter's own classification of its media
/// (remote URL vs local bytes).
pub(crate) fn classify_engine_error(
    error: &EngineError,
    from_source_element: bool,
    remote: bool,
) -> MediaError {
    if !from_source_element {
        return MediaError::InternalDeviceError;
    }

    if let Some(status) = error.http_status {
        match status {
            400..=499 => return MediaError::InvalidRequest,
            502 | 503 | 504 => return MediaError::ServiceUnavailable,
            500..=599 => return MediaError::InternalServerError,
            _ => {}
        }
    }

    match error.kind {
        EngineErrorKind::Network => {
            if remote {
                MediaError::ServiceUnavailable
            } else {
                MediaError::InternalDeviceError
            }
        }
        EngineErrorKind::State => MediaError::InternalDeviceError,
        EngineErrorKind::Decode | EngineErrorKind::Other => MediaError::Unknown,
    }
}
