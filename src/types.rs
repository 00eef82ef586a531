// Core identifier and value types shared across the controller

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide source id counter. Starts at 1 so that 0 stays reserved
/// for [`SourceId::INVALID`] across every player instance.
static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier for an active source.
///
/// Each successful `set_*_source` mints a fresh id; commands quoting any
/// other id are rejected. Ids are unique and strictly increasing for the
/// lifetime of the process, across all player instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(u64);

impl SourceId {
    /// The reserved "no source" id.
    pub const INVALID: SourceId = SourceId(0);

    /// Mint the next process-wide id.
    pub(crate) fn next() -> SourceId {
        SourceId(NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn is_valid(&self) -> bool {
        *self != SourceId::INVALID
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which speaker a player instance drives. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakerType {
    /// Main content/voice channel.
    Avatar,
    /// Alerts and notification sounds.
    Alert,
}

/// Public volume scale bounds.
pub const VOLUME_MIN: u8 = 0;
pub const VOLUME_MAX: u8 = 100;

/// Snapshot of the speaker state as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeakerSettings {
    /// Volume on the public scale, 0..=100.
    pub volume: u8,
    pub mute: bool,
}

/// Value kind of a decoded stream tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    String,
    Uint,
    Int,
    Boolean,
    Double,
}

/// One decoded metadata tag. Values arrive stringified by the tag
/// producer; `kind` records the original value type.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub key: String,
    pub value: String,
    pub kind: TagKind,
}
