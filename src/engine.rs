// Seam to the native audio pipeline engine
// The controller drives the engine exclusively through this trait; the
// engine reports back through bus messages delivered to a registered handler

use std::time::Duration;

/// Opaque handle to an engine element (source, decoder, converter, volume,
/// sink, or the pipeline root). Minted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Element(u64);

impl Element {
    pub fn from_raw(raw: u64) -> Self {
        Element(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Pipeline state, ordered from torn down to rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineState {
    Null,
    Ready,
    Paused,
    Playing,
}

/// Outcome of a state request or state query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChangeResult {
    /// The change completed synchronously.
    Success,
    /// The change is in progress; completion is reported on the bus.
    Async,
    /// The element reached the state but cannot produce data in it yet.
    NoPreroll,
    Failure,
}

/// Coarse origin of an engine error, used for observer-facing classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    /// Transport-level failure while acquiring media bytes.
    Network,
    /// The media itself could not be parsed or decoded.
    Decode,
    /// An element refused a state transition.
    State,
    Other,
}

/// An error reported on the engine bus.
#[derive(Debug, Clone)]
pub struct EngineError {
    pub kind: EngineErrorKind,
    /// HTTP status attached by the engine's transport, when there is one.
    pub http_status: Option<u16>,
    pub message: String,
}

/// Raw tag value as produced by the engine's tag readers.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    String(String),
    Uint(u64),
    Int(i64),
    Boolean(bool),
    Double(f64),
    /// Date/time rendered to ISO-8601 by the engine.
    DateTime(String),
    /// Binary payloads (cover art and the like); never forwarded.
    Buffer(Vec<u8>),
}

/// One raw tag entry off the bus, in message order.
#[derive(Debug, Clone, PartialEq)]
pub struct TagEntry {
    pub key: String,
    pub value: TagValue,
}

/// Messages delivered by the engine bus.
///
/// The engine must deliver messages in emit order. The bus flushes while an
/// element is driven down to [`PipelineState::Null`], so state-changed
/// messages for the intermediate downward transitions are normally discarded
/// (which is what keeps teardown and segment cycling silent); an engine may
/// still deliver the final transition into `Null` when it initiates the
/// drop itself.
#[derive(Debug, Clone)]
pub enum BusMessage {
    EndOfStream {
        source: Element,
    },
    Error {
        source: Element,
        error: EngineError,
    },
    StateChanged {
        source: Element,
        old: PipelineState,
        new: PipelineState,
        /// The state still being worked towards, if any.
        pending: Option<PipelineState>,
    },
    Buffering {
        percent: i32,
    },
    Tags {
        tags: Vec<TagEntry>,
    },
}

pub type BusHandler = Box<dyn Fn(BusMessage) + Send + Sync>;
pub type PadAddedHook = Box<dyn Fn() + Send + Sync>;

/// Contract the controller consumes from the native pipeline engine.
///
/// Implementations must be callable from any thread. Hooks registered on an
/// element are dropped when the element is removed from its pipeline.
pub trait PipelineEngine: Send + Sync {
    /// Create an element from a factory name ("audioconvert", "volume", ...).
    fn make_element(&self, factory: &str, name: &str) -> Option<Element>;

    fn make_pipeline(&self, name: &str) -> Option<Element>;

    fn add(&self, pipeline: Element, element: Element) -> bool;

    fn remove(&self, pipeline: Element, element: Element) -> bool;

    fn link(&self, upstream: Element, downstream: Element) -> bool;

    fn set_state(&self, element: Element, target: PipelineState) -> StateChangeResult;

    /// Current and pending state, plus how the last change resolved.
    fn get_state(&self, element: Element) -> (StateChangeResult, PipelineState, Option<PipelineState>);

    fn query_position(&self, element: Element) -> Option<Duration>;

    /// Whether buffering is currently in progress. `None` when the query is
    /// not supported by the current stream.
    fn query_buffering(&self, element: Element) -> Option<bool>;

    fn query_seekable(&self, element: Element) -> Option<bool>;

    /// Issue a flushing key-unit seek.
    fn seek(&self, element: Element, position: Duration) -> bool;

    fn set_volume(&self, element: Element, volume: f64);

    fn volume(&self, element: Element) -> f64;

    fn set_muted(&self, element: Element, muted: bool);

    fn muted(&self, element: Element) -> bool;

    /// Whether the decoder wants to buffer before producing output.
    fn use_buffering(&self, element: Element) -> bool;

    /// Feed bytes into a source element. May block for backpressure.
    /// Returns false once the element is removed or flushing, at which point
    /// feeders stop.
    fn push_source_data(&self, element: Element, data: &[u8]) -> bool;

    /// Signal that no more bytes will arrive for this source element.
    fn end_source_data(&self, element: Element) -> bool;

    fn set_bus_handler(&self, pipeline: Element, handler: BusHandler);

    /// Invoke `hook` once the decoder's output pad appears. Returns false if
    /// the element cannot emit the notification.
    fn connect_pad_added(&self, element: Element, hook: PadAddedHook) -> bool;
}
