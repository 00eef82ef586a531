// Pending seek target and seekability for the current source

use std::time::Duration;

/// Holds the pending seek point and the cached "is seekable" flag.
///
/// Cleared on every source teardown and after each seek attempt.
#[derive(Debug, Default)]
pub struct OffsetManager {
    seek_point: Option<Duration>,
    seekable: bool,
}

impl OffsetManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_seek_point(&mut self, offset: Duration) {
        self.seek_point = Some(offset);
    }

    pub fn seek_point(&self) -> Option<Duration> {
        self.seek_point
    }

    pub fn is_seek_point_set(&self) -> bool {
        self.seek_point.is_some()
    }

    pub fn set_seekable(&mut self, seekable: bool) {
        self.seekable = seekable;
    }

    pub fn is_seekable(&self) -> bool {
        self.seekable
    }

    /// Reset both fields to their unset defaults.
    pub fn clear(&mut self) {
        self.seek_point = None;
        self.seekable = false;
    }
}
