// Observer capability for playback lifecycle, buffering, tag and error events

use crate::error::MediaError;
use crate::types::{SourceId, Tag};

/// Receiver for asynchronous playback events.
///
/// All callbacks fire on the player's dispatcher thread, in emit order:
/// `started` first, then any number of `paused`/`resumed`, underrun/refilled
/// and tag deliveries, then exactly one of `finished`, `stopped` or `error`.
/// Implementations must return quickly and must not call back into the
/// player synchronously from a callback.
pub trait PlaybackObserver: Send + Sync {
    fn on_playback_started(&self, _id: SourceId) {}

    fn on_playback_paused(&self, _id: SourceId) {}

    fn on_playback_resumed(&self, _id: SourceId) {}

    fn on_playback_stopped(&self, _id: SourceId) {}

    fn on_playback_finished(&self, _id: SourceId) {}

    fn on_playback_error(&self, _id: SourceId, _kind: MediaError, _message: &str) {}

    fn on_buffer_underrun(&self, _id: SourceId) {}

    fn on_buffer_refilled(&self, _id: SourceId) {}

    /// Decoded metadata tags, in stream order within each delivery.
    fn on_tags(&self, _id: SourceId, _tags: Vec<Tag>) {}
}
