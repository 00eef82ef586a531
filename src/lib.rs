// Audio media player controller
// Serializes play/pause/seek/volume commands through a single dispatcher
// thread and drives an external pipeline engine: src -> decoder -> converter
// -> volume -> sink

mod dispatcher;

pub mod engine;
pub mod error;
pub mod fetch;
pub mod normalizer;
pub mod observer;
pub mod offset;
pub mod pipeline;
pub mod player;
pub mod playlist;
pub mod source;
pub mod types;

// Re-exports
pub use engine::{
    BusHandler, BusMessage, Element, EngineError, EngineErrorKind, PadAddedHook, PipelineEngine,
    PipelineState, StateChangeResult, TagEntry, TagValue,
};
pub use error::{MediaError, PlayerError, Result};
pub use fetch::{
    HttpContent, HttpContentFetcher, HttpContentFetcherFactory, UreqContentFetcherFactory,
};
pub use normalizer::Normalizer;
pub use observer::PlaybackObserver;
pub use offset::OffsetManager;
pub use pipeline::AudioPipeline;
pub use player::MediaPlayer;
pub use playlist::PlaylistExpander;
pub use source::{
    AttachmentReader, MediaStream, ReadStatus, ReaderSource, SourceAdapter, StreamSource,
    UrlSource,
};
pub use types::{SourceId, SpeakerSettings, SpeakerType, Tag, TagKind, VOLUME_MAX, VOLUME_MIN};
