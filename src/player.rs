// The media player controller
// Serializes every command and bus callback through a single dispatcher
// thread and translates pipeline state transitions into observer events

use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::dispatcher::{Dispatcher, DispatcherHandle};
use crate::engine::{
    BusMessage, Element, EngineError, PipelineEngine, PipelineState, StateChangeResult, TagEntry,
    TagValue,
};
use crate::error::{classify_engine_error, MediaError, PlayerError, Result};
use crate::fetch::HttpContentFetcherFactory;
use crate::normalizer::Normalizer;
use crate::observer::PlaybackObserver;
use crate::offset::OffsetManager;
use crate::pipeline::AudioPipeline;
use crate::playlist::PlaylistExpander;
use crate::source::{
    AttachmentReader, MediaStream, ReaderSource, SourceAdapter, StreamSource, UrlSource,
};
use crate::types::{SourceId, SpeakerSettings, SpeakerType, Tag, TagKind, VOLUME_MAX, VOLUME_MIN};

/// Engine volume element range.
const ENGINE_VOLUME_MIN: f64 = 0.0;
const ENGINE_VOLUME_MAX: f64 = 1.0;

/// Public volume adjustment range.
const ADJUST_VOLUME_MIN: f64 = -100.0;
const ADJUST_VOLUME_MAX: f64 = 100.0;

/// Engine volume adjustment range.
const ENGINE_ADJUST_MIN: f64 = -1.0;
const ENGINE_ADJUST_MAX: f64 = 1.0;

/// Audio media player controller.
///
/// Accepts one source at a time (byte stream, pull reader, or URL with
/// playlist expansion), drives the pipeline engine, and reports playback
/// lifecycle, buffering, tag and error events to an observer.
///
/// Every command crosses into the dispatcher thread and blocks on its
/// completion, so effects of command A are visible to a later command B.
/// Must not be dropped from the dispatcher thread (that is, from inside an
/// observer callback).
pub struct MediaPlayer {
    dispatcher: Dispatcher<PlayerContext>,
    speaker_type: SpeakerType,
    fetcher_factory: Arc<dyn HttpContentFetcherFactory>,
    prep_thread: Arc<Mutex<Option<thread::JoinHandle<()>>>>,
}

impl MediaPlayer {
    /// Create a player over the given engine. Builds the persistent part of
    /// the pipeline and starts the dispatcher thread.
    pub fn create(
        engine: Arc<dyn PipelineEngine>,
        fetcher_factory: Arc<dyn HttpContentFetcherFactory>,
        speaker_type: SpeakerType,
    ) -> Result<MediaPlayer> {
        let (handle, jobs) = Dispatcher::channel();

        let bus_handle = handle.clone();
        let pipeline = AudioPipeline::build(
            Arc::clone(&engine),
            Box::new(move |message| {
                bus_handle.post(move |ctx: &mut PlayerContext| ctx.handle_bus_message(message));
            }),
        )?;

        let context = PlayerContext {
            pipeline,
            handle: handle.clone(),
            source: None,
            current_id: SourceId::INVALID,
            observer: None,
            offsets: OffsetManager::new(),
            flags: PlaybackFlags::default(),
            teardown_epoch: 0,
            shutting_down: false,
        };
        let dispatcher = Dispatcher::spawn(context, handle, jobs);

        Ok(MediaPlayer {
            dispatcher,
            speaker_type,
            fetcher_factory,
            prep_thread: Arc::new(Mutex::new(None)),
        })
    }

    fn call<R, F>(&self, job: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut PlayerContext) -> Result<R> + Send + 'static,
    {
        self.dispatcher
            .handle()
            .call(job)
            .unwrap_or_else(|| Err(PlayerError::ThreadError("dispatcher unavailable".to_string())))
    }

    /// Replace the current source with a seekable byte stream.
    pub fn set_stream_source(
        &self,
        stream: Box<dyn MediaStream>,
        repeat: bool,
    ) -> Result<SourceId> {
        log::debug!("set_stream_source called (repeat: {})", repeat);
        self.call(move |ctx| ctx.handle_set_stream_source(stream, repeat))
    }

    /// Replace the current source with a pull-style attachment reader.
    pub fn set_reader_source(&self, reader: Box<dyn AttachmentReader>) -> Result<SourceId> {
        log::debug!("set_reader_source called");
        self.call(move |ctx| ctx.handle_set_reader_source(reader))
    }

    /// Replace the current source with a remote URL, expanding playlists.
    ///
    /// Expansion blocks on the fetcher, so it runs on a dedicated
    /// preparation thread; the previous preparation thread is joined first.
    pub fn set_url_source(&self, url: &str) -> Result<SourceId> {
        log::debug!("set_url_source called");
        if let Some(previous) = self.prep_thread.lock().take() {
            let _ = previous.join();
        }

        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let factory = Arc::clone(&self.fetcher_factory);
        let prep_slot = Arc::clone(&self.prep_thread);
        let url = url.to_string();

        let posted = self.dispatcher.handle().post(move |ctx| {
            // Teardown happens here, on the dispatcher, so that teardowns of
            // successive set-source calls stay serialized.
            ctx.tear_down_transient();
            if ctx.shutting_down {
                let _ = done_tx.send(Err(PlayerError::InvalidState(
                    "player is shutting down".to_string(),
                )));
                return;
            }
            let handle = ctx.handle.clone();
            let epoch = ctx.teardown_epoch;
            let worker = thread::spawn(move || {
                let expander = PlaylistExpander::new(Arc::clone(&factory));
                let expanded = expander.expand(&url);
                let delivered = handle.post(move |ctx: &mut PlayerContext| {
                    let result = ctx.handle_set_url_source(expanded, factory, epoch);
                    let _ = done_tx.send(result);
                });
                if !delivered {
                    log::warn!("Dispatcher gone before URL source could be installed");
                }
            });
            *prep_slot.lock() = Some(worker);
        });
        if !posted {
            return Err(PlayerError::ThreadError("dispatcher unavailable".to_string()));
        }
        done_rx
            .recv()
            .unwrap_or_else(|_| Err(PlayerError::ThreadError("dispatcher unavailable".to_string())))
    }

    /// Begin playback of the current source.
    pub fn play(&self, id: SourceId) -> Result<()> {
        log::debug!("play called (id: {})", id);
        self.call(move |ctx| ctx.handle_play(id))
    }

    /// Stop playback. The pipeline is torn down and the id becomes invalid.
    pub fn stop(&self, id: SourceId) -> Result<()> {
        log::debug!("stop called (id: {})", id);
        self.call(move |ctx| ctx.handle_stop(id))
    }

    /// Pause playback. Raced against a pending play or resume, the pause
    /// wins and both lifecycle events are reported in order.
    pub fn pause(&self, id: SourceId) -> Result<()> {
        log::debug!("pause called (id: {})", id);
        self.call(move |ctx| ctx.handle_pause(id))
    }

    /// Resume paused playback.
    pub fn resume(&self, id: SourceId) -> Result<()> {
        log::debug!("resume called (id: {})", id);
        self.call(move |ctx| ctx.handle_resume(id))
    }

    /// Current play position. `None` when the pipeline is unset, the id is
    /// stale, or the pipeline is neither paused nor playing.
    pub fn get_offset(&self, id: SourceId) -> Option<Duration> {
        log::debug!("get_offset called (id: {})", id);
        self.dispatcher
            .handle()
            .call(move |ctx: &mut PlayerContext| ctx.handle_get_offset(id))
            .flatten()
    }

    /// Record a seek target; the seek is issued at the next opportunity
    /// (typically when the initial buffering completes).
    pub fn set_offset(&self, id: SourceId, offset: Duration) -> Result<()> {
        log::debug!("set_offset called (id: {})", id);
        self.call(move |ctx| ctx.handle_set_offset(id, offset))
    }

    /// Replace the observer. Synchronous: once this returns, subsequent
    /// events go to the new observer.
    pub fn set_observer(&self, observer: Option<Arc<dyn PlaybackObserver>>) {
        log::debug!("set_observer called");
        let _ = self.dispatcher.handle().call(move |ctx: &mut PlayerContext| {
            ctx.observer = observer.map(|o| Arc::downgrade(&o));
        });
    }

    /// Set the speaker volume on the public 0..=100 scale.
    pub fn set_volume(&self, volume: u8) -> Result<()> {
        log::debug!("set_volume called ({})", volume);
        self.call(move |ctx| ctx.handle_set_volume(volume))
    }

    /// Adjust the volume by a delta on the public scale, clamping at the
    /// engine's bounds.
    pub fn adjust_volume(&self, delta: i8) -> Result<()> {
        log::debug!("adjust_volume called ({})", delta);
        self.call(move |ctx| ctx.handle_adjust_volume(delta))
    }

    pub fn set_mute(&self, mute: bool) -> Result<()> {
        log::debug!("set_mute called ({})", mute);
        self.call(move |ctx| ctx.handle_set_mute(mute))
    }

    pub fn get_speaker_settings(&self) -> Result<SpeakerSettings> {
        log::debug!("get_speaker_settings called");
        self.call(|ctx| ctx.handle_get_speaker_settings())
    }

    /// The speaker this player drives. Fixed at construction; not dispatched.
    pub fn speaker_type(&self) -> SpeakerType {
        self.speaker_type
    }

    #[cfg(test)]
    pub(crate) fn sync(&self) {
        let _ = self.dispatcher.handle().call(|_ctx: &mut PlayerContext| ());
    }
}

impl Drop for MediaPlayer {
    fn drop(&mut self) {
        let _ = self
            .dispatcher
            .handle()
            .call(|ctx: &mut PlayerContext| ctx.begin_shutdown());
        if let Some(worker) = self.prep_thread.lock().take() {
            let _ = worker.join();
        }
        // Dropping the dispatcher drains remaining jobs and joins the worker.
    }
}

/// Dispatcher-thread-only playback flags.
#[derive(Debug, Default)]
struct PlaybackFlags {
    playback_started_sent: bool,
    playback_finished_sent: bool,
    is_paused: bool,
    is_buffer_underrun: bool,
    play_pending: bool,
    pause_pending: bool,
    resume_pending: bool,
    pause_immediately: bool,
}

/// All mutable controller state. Owned by the dispatcher thread.
struct PlayerContext {
    pipeline: AudioPipeline,
    handle: DispatcherHandle<PlayerContext>,
    source: Option<Box<dyn SourceAdapter>>,
    current_id: SourceId,
    observer: Option<Weak<dyn PlaybackObserver>>,
    offsets: OffsetManager,
    flags: PlaybackFlags,
    /// Bumped on every teardown; lets a slow URL preparation detect that a
    /// newer set-source has replaced it.
    teardown_epoch: u64,
    shutting_down: bool,
}

impl PlayerContext {
    fn observer(&self) -> Option<Arc<dyn PlaybackObserver>> {
        self.observer.as_ref()?.upgrade()
    }

    fn validate_source_and_id(&self, id: SourceId) -> bool {
        if self.source.is_none() {
            log::error!("Command rejected: no source set");
            return false;
        }
        if id != self.current_id {
            log::error!(
                "Command rejected: id mismatch (given: {}, current: {})",
                id,
                self.current_id
            );
            return false;
        }
        true
    }

    /// Remove the transient pipeline head and forget the source. Does not
    /// emit observer events; `stop` and the bus machine emit their own.
    fn tear_down_transient(&mut self) {
        log::debug!("Tearing down transient pipeline elements");
        self.teardown_epoch += 1;
        self.current_id = SourceId::INVALID;
        if let Some(mut source) = self.source.take() {
            source.shutdown();
        }
        self.pipeline.tear_down_transient();
        self.offsets.clear();
        self.flags = PlaybackFlags::default();
    }

    fn begin_shutdown(&mut self) {
        self.shutting_down = true;
        self.tear_down_transient();
    }

    /// Wire a freshly constructed adapter: register the pad-added hook and
    /// mint the new source id.
    fn install_source(&mut self, source: Box<dyn SourceAdapter>) -> Result<SourceId> {
        let handle = self.handle.clone();
        let connected = self.pipeline.connect_pad_added(Box::new(move || {
            handle.post(|ctx: &mut PlayerContext| ctx.handle_pad_added());
        }));
        if !connected {
            log::error!("Setting source failed: could not connect pad-added hook");
            return Err(PlayerError::PipelineError(
                "failed to connect pad-added hook".to_string(),
            ));
        }
        self.source = Some(source);
        self.current_id = SourceId::next();
        Ok(self.current_id)
    }

    fn handle_set_stream_source(
        &mut self,
        stream: Box<dyn MediaStream>,
        repeat: bool,
    ) -> Result<SourceId> {
        log::debug!("Setting stream source");
        self.tear_down_transient();
        let source = StreamSource::create(&mut self.pipeline, stream, repeat)?;
        self.install_source(Box::new(source))
    }

    fn handle_set_reader_source(&mut self, reader: Box<dyn AttachmentReader>) -> Result<SourceId> {
        log::debug!("Setting reader source");
        self.tear_down_transient();
        let source = ReaderSource::create(&mut self.pipeline, reader)?;
        self.install_source(Box::new(source))
    }

    /// Final step of a URL set-source: runs on the dispatcher once the
    /// preparation thread has expanded the playlist. Teardown already
    /// happened before that thread was spawned.
    fn handle_set_url_source(
        &mut self,
        expanded: Result<Vec<String>>,
        factory: Arc<dyn HttpContentFetcherFactory>,
        epoch: u64,
    ) -> Result<SourceId> {
        log::debug!("Setting URL source");
        if self.shutting_down {
            return Err(PlayerError::InvalidState(
                "player is shutting down".to_string(),
            ));
        }
        if self.teardown_epoch != epoch {
            log::warn!("URL source superseded by a newer set-source");
            return Err(PlayerError::InvalidState(
                "source superseded before installation".to_string(),
            ));
        }
        let entries = expanded?;
        let source = UrlSource::create(&mut self.pipeline, entries, factory)?;
        self.install_source(Box::new(source))
    }

    fn handle_pad_added(&mut self) {
        log::debug!("Decoder pad added");
        if !self.pipeline.link_decoder_to_converter() {
            log::error!("Linking decoder to converter failed");
        }
    }

    fn handle_play(&mut self, id: SourceId) -> Result<()> {
        log::debug!("handle_play (id: {}, current: {})", id, self.current_id);
        if !self.validate_source_and_id(id) {
            return Err(PlayerError::InvalidState("no source or id mismatch".to_string()));
        }
        if let Some(source) = self.source.as_mut() {
            source.preprocess();
        }

        let (state_result, current, _) = self.pipeline.get_state();
        if state_result == StateChangeResult::Failure {
            log::error!("Play failed: state query failed");
            return Err(PlayerError::PipelineError("state query failed".to_string()));
        }
        if current == PipelineState::Playing {
            log::error!("Play failed: already playing");
            return Err(PlayerError::InvalidState("already playing".to_string()));
        }
        if self.flags.play_pending {
            log::error!("Play failed: play currently pending");
            return Err(PlayerError::InvalidState("play currently pending".to_string()));
        }

        self.flags.playback_finished_sent = false;
        self.flags.playback_started_sent = false;
        self.flags.play_pending = true;
        self.flags.pause_immediately = false;

        // The decoder decides whether to buffer first. Buffering sources
        // pause for preroll and reach PLAYING through the buffering path.
        let starting_state = if self.pipeline.decoder_wants_buffering() {
            PipelineState::Paused
        } else {
            PipelineState::Playing
        };
        log::debug!("Requesting starting state {:?}", starting_state);
        if self.pipeline.set_state(starting_state) == StateChangeResult::Failure {
            log::error!("Play failed: state change request failed");
            self.send_playback_error(
                MediaError::InternalDeviceError,
                "failed to request playback state",
            );
        }
        Ok(())
    }

    fn handle_stop(&mut self, id: SourceId) -> Result<()> {
        log::debug!("handle_stop (id: {}, current: {})", id, self.current_id);
        if !self.validate_source_and_id(id) {
            return Err(PlayerError::InvalidState("no source or id mismatch".to_string()));
        }

        let (state_result, current, pending) = self.pipeline.get_state();
        if state_result == StateChangeResult::Failure {
            log::error!("Stop failed: state query failed");
            return Err(PlayerError::PipelineError("state query failed".to_string()));
        }
        if current == PipelineState::Null {
            log::error!("Stop failed: already stopped");
            return Err(PlayerError::InvalidState("already stopped".to_string()));
        }
        if pending == Some(PipelineState::Null) {
            log::error!("Stop failed: already stopping");
            return Err(PlayerError::InvalidState("already stopping".to_string()));
        }

        // A state change to Null completes synchronously per the engine
        // contract.
        if self.pipeline.set_state(PipelineState::Null) == StateChangeResult::Failure {
            log::error!("Stop failed: state change request failed");
            return Err(PlayerError::PipelineError("state change failed".to_string()));
        }

        // Complete any accepted lifecycle before reporting the stop.
        if self.flags.play_pending {
            self.send_playback_started();
        } else if self.flags.resume_pending {
            self.send_playback_resumed();
        }
        self.send_playback_stopped();
        Ok(())
    }

    fn handle_pause(&mut self, id: SourceId) -> Result<()> {
        log::debug!("handle_pause (id: {}, current: {})", id, self.current_id);
        if !self.validate_source_and_id(id) {
            return Err(PlayerError::InvalidState("no source or id mismatch".to_string()));
        }

        let (state_result, current, _) = self.pipeline.get_state();
        if state_result == StateChangeResult::Failure {
            log::error!("Pause failed: state query failed");
            return Err(PlayerError::PipelineError("state query failed".to_string()));
        }

        // A pause racing a pending play or resume pauses immediately, so no
        // audio blips out before the pause lands.
        if self.flags.play_pending || self.flags.resume_pending {
            if self.flags.pause_pending {
                log::error!("Pause failed: pause currently pending");
                return Err(PlayerError::InvalidState("pause currently pending".to_string()));
            }
            if self.pipeline.set_state(PipelineState::Paused) == StateChangeResult::Failure {
                log::error!("Pause failed: state change request failed");
                return Err(PlayerError::PipelineError("state change failed".to_string()));
            }
            self.flags.pause_immediately = true;
            return Ok(());
        }

        if current != PipelineState::Playing {
            log::error!("Pause failed: no audio playing");
            return Err(PlayerError::InvalidState("no audio playing".to_string()));
        }
        if self.flags.pause_pending {
            log::error!("Pause failed: pause currently pending");
            return Err(PlayerError::InvalidState("pause currently pending".to_string()));
        }

        if self.pipeline.set_state(PipelineState::Paused) == StateChangeResult::Failure {
            log::error!("Pause failed: state change request failed");
            return Err(PlayerError::PipelineError("state change failed".to_string()));
        }
        self.flags.pause_pending = true;
        Ok(())
    }

    fn handle_resume(&mut self, id: SourceId) -> Result<()> {
        log::debug!("handle_resume (id: {}, current: {})", id, self.current_id);
        if !self.validate_source_and_id(id) {
            return Err(PlayerError::InvalidState("no source or id mismatch".to_string()));
        }

        let (state_result, current, _) = self.pipeline.get_state();
        if state_result == StateChangeResult::Failure {
            log::error!("Resume failed: state query failed");
            return Err(PlayerError::PipelineError("state query failed".to_string()));
        }
        if current == PipelineState::Playing {
            log::error!("Resume failed: already playing");
            return Err(PlayerError::InvalidState("already playing".to_string()));
        }
        if current != PipelineState::Paused {
            log::error!("Resume failed: not currently paused");
            return Err(PlayerError::InvalidState("not currently paused".to_string()));
        }
        if self.flags.resume_pending {
            log::error!("Resume failed: resume currently pending");
            return Err(PlayerError::InvalidState("resume currently pending".to_string()));
        }

        if self.pipeline.set_state(PipelineState::Playing) == StateChangeResult::Failure {
            log::error!("Resume failed: state change request failed");
            return Err(PlayerError::PipelineError("state change failed".to_string()));
        }
        self.flags.resume_pending = true;
        self.flags.pause_immediately = false;
        Ok(())
    }

    fn handle_get_offset(&mut self, id: SourceId) -> Option<Duration> {
        log::debug!("handle_get_offset (id: {}, current: {})", id, self.current_id);
        if !self.pipeline.is_set() {
            log::debug!("get_offset: pipeline not set");
            return None;
        }
        if !self.validate_source_and_id(id) {
            return None;
        }

        let (state_result, state, _) = self.pipeline.get_state();
        if state_result != StateChangeResult::Success {
            log::error!("get_offset failed: state query unsuccessful");
            return None;
        }
        if state != PipelineState::Paused && state != PipelineState::Playing {
            log::error!("get_offset failed: invalid pipeline state {:?}", state);
            return None;
        }
        match self.pipeline.query_position() {
            Some(position) => Some(position),
            None => {
                log::error!("get_offset failed: position query failed");
                None
            }
        }
    }

    fn handle_set_offset(&mut self, id: SourceId, offset: Duration) -> Result<()> {
        log::debug!("handle_set_offset (id: {}, current: {})", id, self.current_id);
        if !self.validate_source_and_id(id) {
            return Err(PlayerError::InvalidState("no source or id mismatch".to_string()));
        }
        self.offsets.set_seek_point(offset);
        Ok(())
    }

    fn handle_set_volume(&mut self, volume: u8) -> Result<()> {
        if volume > VOLUME_MAX {
            log::error!("set_volume failed: {} out of range", volume);
            return Err(PlayerError::InvalidArgument(format!(
                "volume {} outside [{}, {}]",
                volume, VOLUME_MIN, VOLUME_MAX
            )));
        }
        let to_engine = Normalizer::new(
            VOLUME_MIN as f64,
            VOLUME_MAX as f64,
            ENGINE_VOLUME_MIN,
            ENGINE_VOLUME_MAX,
        )?;
        if !self.pipeline.set_volume(to_engine.normalize(volume as f64)) {
            log::error!("set_volume failed: volume element missing");
            return Err(PlayerError::PipelineError("volume element missing".to_string()));
        }
        Ok(())
    }

    fn handle_adjust_volume(&mut self, delta: i8) -> Result<()> {
        let delta = delta as f64;
        if !(ADJUST_VOLUME_MIN..=ADJUST_VOLUME_MAX).contains(&delta) {
            log::error!("adjust_volume failed: {} out of range", delta);
            return Err(PlayerError::InvalidArgument(format!(
                "delta {} outside [{}, {}]",
                delta, ADJUST_VOLUME_MIN, ADJUST_VOLUME_MAX
            )));
        }
        let to_engine_delta = Normalizer::new(
            ADJUST_VOLUME_MIN,
            ADJUST_VOLUME_MAX,
            ENGINE_ADJUST_MIN,
            ENGINE_ADJUST_MAX,
        )?;
        let current = self.pipeline.volume().ok_or_else(|| {
            log::error!("adjust_volume failed: volume element missing");
            PlayerError::PipelineError("volume element missing".to_string())
        })?;
        let adjusted = (current + to_engine_delta.normalize(delta))
            .clamp(ENGINE_VOLUME_MIN, ENGINE_VOLUME_MAX);
        self.pipeline.set_volume(adjusted);
        Ok(())
    }

    fn handle_set_mute(&mut self, mute: bool) -> Result<()> {
        if !self.pipeline.set_muted(mute) {
            log::error!("set_mute failed: volume element missing");
            return Err(PlayerError::PipelineError("volume element missing".to_string()));
        }
        Ok(())
    }

    fn handle_get_speaker_settings(&mut self) -> Result<SpeakerSettings> {
        let to_public = Normalizer::new(
            ENGINE_VOLUME_MIN,
            ENGINE_VOLUME_MAX,
            VOLUME_MIN as f64,
            VOLUME_MAX as f64,
        )?;
        let volume = self.pipeline.volume().ok_or_else(|| {
            log::error!("get_speaker_settings failed: volume element missing");
            PlayerError::PipelineError("volume element missing".to_string())
        })?;
        let mute = self.pipeline.muted().unwrap_or(false);
        Ok(SpeakerSettings {
            volume: to_public.normalize(volume).round() as u8,
            mute,
        })
    }

    // --- bus state machine -------------------------------------------------

    fn handle_bus_message(&mut self, message: BusMessage) {
        match message {
            BusMessage::EndOfStream { source } => {
                if self.pipeline.is_pipeline(source) {
                    self.handle_end_of_stream();
                }
            }
            BusMessage::Error { source, error } => self.handle_engine_error(source, error),
            BusMessage::StateChanged {
                source,
                old,
                new,
                pending,
            } => {
                if self.pipeline.is_pipeline(source) {
                    self.handle_state_changed(old, new, pending);
                }
            }
            BusMessage::Buffering { percent } => self.handle_buffering(percent),
            BusMessage::Tags { tags } => self.handle_tags(tags),
        }
    }

    fn handle_end_of_stream(&mut self) {
        log::debug!("End of stream reached");
        let Some(source) = self.source.as_mut() else {
            log::debug!("End of stream with no source; ignoring");
            return;
        };
        if !source.handle_end_of_stream() {
            log::error!("Source failed to handle end of stream");
            self.send_playback_error(
                MediaError::InternalDeviceError,
                "source failed to handle end of stream",
            );
            return;
        }

        // Another segment: cycle the pipeline to consume it.
        if self.source.as_ref().map_or(false, |s| s.has_additional_data()) {
            if self.pipeline.set_state(PipelineState::Null) == StateChangeResult::Failure {
                log::error!("Continuing playback failed: could not reset pipeline");
                self.send_playback_error(
                    MediaError::InternalDeviceError,
                    "failed to reset pipeline for next segment",
                );
                return;
            }
            if self.pipeline.set_state(PipelineState::Playing) == StateChangeResult::Failure {
                log::error!("Continuing playback failed: could not restart pipeline");
                self.send_playback_error(
                    MediaError::InternalDeviceError,
                    "failed to restart pipeline for next segment",
                );
            }
        } else {
            self.send_playback_finished();
        }
    }

    fn handle_engine_error(&mut self, source: Element, error: EngineError) {
        let remote = self
            .source
            .as_ref()
            .map_or(false, |s| s.is_playback_remote());
        let from_source = self.pipeline.is_source_element(source);
        log::error!(
            "Engine error (from source element: {}, remote: {}): {}",
            from_source,
            remote,
            error.message
        );
        let kind = classify_engine_error(&error, from_source, remote);
        let message = error.message.clone();
        self.send_playback_error(kind, &message);
    }

    fn handle_state_changed(
        &mut self,
        old: PipelineState,
        new: PipelineState,
        pending: Option<PipelineState>,
    ) {
        log::debug!(
            "State changed: {:?} -> {:?} (pending: {:?})",
            old,
            new,
            pending
        );
        if new == PipelineState::Paused && self.flags.pause_immediately {
            if self.flags.play_pending {
                self.send_playback_started();
            } else if self.flags.resume_pending {
                self.send_playback_resumed();
            }
            self.send_playback_paused();
        } else if new == PipelineState::Playing {
            if !self.flags.playback_started_sent {
                self.send_playback_started();
            } else if self.flags.is_buffer_underrun {
                self.send_buffer_refilled();
                self.flags.is_buffer_underrun = false;
            } else if self.flags.is_paused {
                self.send_playback_resumed();
                self.flags.is_paused = false;
            }
        } else if new == PipelineState::Paused
            && old == PipelineState::Ready
            && pending.is_none()
        {
            // Initial preroll. Streams that never report buffering (and
            // streams whose buffering query fails) start playing here.
            let buffering = self.pipeline.query_buffering().unwrap_or(false);
            if !buffering {
                self.pipeline.set_state(PipelineState::Playing);
            }
        } else if new == PipelineState::Paused && old == PipelineState::Playing {
            if self.flags.is_buffer_underrun {
                self.send_buffer_underrun();
            } else if !self.flags.is_paused {
                self.send_playback_paused();
                self.flags.is_paused = true;
            }
        } else if new == PipelineState::Null && old == PipelineState::Ready {
            self.send_playback_stopped();
        }
    }

    fn handle_buffering(&mut self, percent: i32) {
        log::debug!("Buffering: {}%", percent);
        if percent < 100 {
            if self.pipeline.set_state(PipelineState::Paused) == StateChangeResult::Failure {
                log::error!("Pausing on buffer underrun failed");
                self.send_playback_error(
                    MediaError::InternalDeviceError,
                    "pausing on buffer underrun failed",
                );
                return;
            }
            // Only an underrun once playback has actually started.
            if self.flags.playback_started_sent {
                self.flags.is_buffer_underrun = true;
            }
        } else {
            if self.flags.pause_immediately {
                // A pause raced the play; stay paused.
                return;
            }
            if let Some(seekable) = self.pipeline.query_seekable() {
                self.offsets.set_seekable(seekable);
            }
            if self.offsets.is_seekable() && self.offsets.is_seek_point_set() {
                self.seek();
            } else if self.pipeline.set_state(PipelineState::Playing) == StateChangeResult::Failure
            {
                log::error!("Resuming on buffer refilled failed");
                self.send_playback_error(
                    MediaError::InternalDeviceError,
                    "resuming on buffer refilled failed",
                );
            }
        }
    }

    /// Issue the pending seek. Clears the offset manager regardless of the
    /// outcome, so a failed seek is not retried forever.
    fn seek(&mut self) -> bool {
        let successful = match self.offsets.seek_point() {
            Some(point) if self.offsets.is_seekable() => {
                if self.pipeline.seek(point) {
                    log::debug!("Seek to {:?} issued", point);
                    true
                } else {
                    log::error!("Seek to {:?} failed", point);
                    false
                }
            }
            _ => {
                log::error!(
                    "Seek failed: invalid state (seekable: {}, seek point set: {})",
                    self.offsets.is_seekable(),
                    self.offsets.is_seek_point_set()
                );
                false
            }
        };
        self.offsets.clear();
        successful
    }

    fn handle_tags(&mut self, raw: Vec<TagEntry>) {
        if !self.current_id.is_valid() {
            return;
        }
        // Delivered even when filtering leaves nothing usable.
        let tags = collect_tags(raw);
        log::debug!("Delivering {} tags", tags.len());
        if let Some(observer) = self.observer() {
            observer.on_tags(self.current_id, tags);
        }
    }

    // --- observer event helpers -------------------------------------------

    fn send_playback_started(&mut self) {
        if self.flags.playback_started_sent {
            return;
        }
        log::debug!("Calling on_playback_started (id: {})", self.current_id);
        self.flags.playback_started_sent = true;
        self.flags.play_pending = false;
        if self.current_id.is_valid() {
            if let Some(observer) = self.observer() {
                observer.on_playback_started(self.current_id);
            }
        }
    }

    fn send_playback_finished(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.shutdown();
        }
        self.flags.is_paused = false;
        self.flags.playback_started_sent = false;
        if !self.flags.playback_finished_sent {
            self.flags.playback_finished_sent = true;
            log::debug!("Calling on_playback_finished (id: {})", self.current_id);
            if self.current_id.is_valid() {
                if let Some(observer) = self.observer() {
                    observer.on_playback_finished(self.current_id);
                }
            }
        }
        self.current_id = SourceId::INVALID;
        self.tear_down_transient();
    }

    fn send_playback_paused(&mut self) {
        log::debug!("Calling on_playback_paused (id: {})", self.current_id);
        self.flags.pause_pending = false;
        if self.current_id.is_valid() {
            if let Some(observer) = self.observer() {
                observer.on_playback_paused(self.current_id);
            }
        }
    }

    fn send_playback_resumed(&mut self) {
        log::debug!("Calling on_playback_resumed (id: {})", self.current_id);
        self.flags.resume_pending = false;
        if self.current_id.is_valid() {
            if let Some(observer) = self.observer() {
                observer.on_playback_resumed(self.current_id);
            }
        }
    }

    fn send_playback_stopped(&mut self) {
        if self.current_id.is_valid() {
            log::debug!("Calling on_playback_stopped (id: {})", self.current_id);
            if let Some(observer) = self.observer() {
                observer.on_playback_stopped(self.current_id);
            }
        }
        self.current_id = SourceId::INVALID;
        self.tear_down_transient();
    }

    fn send_playback_error(&mut self, kind: MediaError, message: &str) {
        log::debug!(
            "Calling on_playback_error (id: {}, kind: {})",
            self.current_id,
            kind
        );
        self.flags.play_pending = false;
        self.flags.pause_pending = false;
        self.flags.resume_pending = false;
        self.flags.pause_immediately = false;
        if self.current_id.is_valid() {
            if let Some(observer) = self.observer() {
                observer.on_playback_error(self.current_id, kind, message);
            }
        }
        self.current_id = SourceId::INVALID;
        self.tear_down_transient();
    }

    fn send_buffer_underrun(&mut self) {
        log::debug!("Calling on_buffer_underrun (id: {})", self.current_id);
        if self.current_id.is_valid() {
            if let Some(observer) = self.observer() {
                observer.on_buffer_underrun(self.current_id);
            }
        }
    }

    fn send_buffer_refilled(&mut self) {
        log::debug!("Calling on_buffer_refilled (id: {})", self.current_id);
        if self.current_id.is_valid() {
            if let Some(observer) = self.observer() {
                observer.on_buffer_refilled(self.current_id);
            }
        }
    }
}

/// Keep the recognized tag kinds, stringify their values, drop the rest.
/// Order within the message is preserved.
fn collect_tags(raw: Vec<TagEntry>) -> Vec<Tag> {
    let mut tags = Vec::with_capacity(raw.len());
    for entry in raw {
        let (value, kind) = match entry.value {
            TagValue::String(s) => (s, TagKind::String),
            TagValue::Uint(u) => (u.to_string(), TagKind::Uint),
            TagValue::Int(i) => (i.to_string(), TagKind::Int),
            TagValue::Boolean(b) => ((if b { "true" } else { "false" }).to_string(), TagKind::Boolean),
            TagValue::Double(d) => (d.to_string(), TagKind::Double),
            TagValue::DateTime(s) => (s, TagKind::String),
            TagValue::Buffer(_) => continue,
        };
        tags.push(Tag {
            key: entry.key,
            value,
            kind,
        });
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::FakeEngine;
    use crate::engine::EngineErrorKind;
    use crate::fetch::testing::StubFetcherFactory;
    use crate::observer::testing::{ObservedEvent, TestObserver};
    use std::io::Cursor;

    struct Fixture {
        player: MediaPlayer,
        engine: Arc<FakeEngine>,
        observer: Arc<TestObserver>,
        factory: Arc<StubFetcherFactory>,
    }

    fn fixture() -> Fixture {
        let engine = Arc::new(FakeEngine::new());
        let factory = Arc::new(StubFetcherFactory::new());
        let player = MediaPlayer::create(
            Arc::clone(&engine) as Arc<dyn PipelineEngine>,
            Arc::clone(&factory) as Arc<dyn HttpContentFetcherFactory>,
            SpeakerType::Avatar,
        )
        .unwrap();
        let observer = Arc::new(TestObserver::new());
        player.set_observer(Some(Arc::clone(&observer) as Arc<dyn PlaybackObserver>));
        Fixture {
            player,
            engine,
            observer,
            factory,
        }
    }

    fn stream_source(player: &MediaPlayer) -> SourceId {
        player
            .set_stream_source(Box::new(Cursor::new(vec![0u8; 64])), false)
            .unwrap()
    }

    #[test]
    fn source_ids_are_unique_and_increasing_across_players() {
        let first = fixture();
        let second = fixture();
        let a = stream_source(&first.player);
        let b = stream_source(&second.player);
        let c = stream_source(&first.player);
        assert!(a.is_valid() && b.is_valid() && c.is_valid());
        assert!(a < b && b < c);
    }

    #[test]
    fn play_to_end_emits_started_then_finished() {
        let f = fixture();
        let id = stream_source(&f.player);
        f.player.play(id).unwrap();
        f.player.sync();
        f.engine.emit_end_of_stream();
        f.player.sync();
        assert_eq!(
            f.observer.events(),
            vec![ObservedEvent::Started(id), ObservedEvent::Finished(id)]
        );
        // The id is dead after the terminal event.
        assert!(f.player.play(id).is_err());
        f.player.sync();
        assert_eq!(f.observer.events().len(), 2);
    }

    #[test]
    fn immediate_pause_racing_play_orders_started_before_paused() {
        let f = fixture();
        f.engine.set_auto_state_messages(false);
        let id = stream_source(&f.player);
        f.player.play(id).unwrap();
        f.player.pause(id).unwrap();
        // The engine finally reaches PAUSED; the racing pause was recorded.
        f.engine
            .emit_state_changed(PipelineState::Ready, PipelineState::Paused, None);
        f.player.sync();
        assert_eq!(
            f.observer.events(),
            vec![ObservedEvent::Started(id), ObservedEvent::Paused(id)]
        );
    }

    #[test]
    fn seek_is_issued_when_preroll_buffering_completes() {
        let f = fixture();
        f.factory.insert(
            "http://host/show.m3u",
            "audio/x-mpegurl",
            b"http://host/ep1.mp3\n",
        );
        f.factory.insert("http://host/ep1.mp3", "audio/mpeg", b"data");
        f.engine.set_use_buffering(true);
        f.engine.set_buffering_result(Some(true));
        f.engine.set_seekable_result(Some(true));

        let id = f.player.set_url_source("http://host/show.m3u").unwrap();
        f.player.set_offset(id, Duration::from_secs(30)).unwrap();
        f.player.play(id).unwrap();
        f.player.sync();
        assert!(f.observer.events().is_empty());

        // Buffering completes: the pending seek wins over going to PLAYING.
        f.engine.emit_buffering(100);
        f.player.sync();
        assert_eq!(f.engine.seeks(), vec![Duration::from_secs(30)]);
        assert!(f.observer.events().is_empty());

        // The post-seek rebuffer completes: now playback starts.
        f.engine.emit_buffering(100);
        f.player.sync();
        assert_eq!(f.observer.events(), vec![ObservedEvent::Started(id)]);
        assert_eq!(f.engine.seeks().len(), 1);
    }

    #[test]
    fn buffer_underrun_cycle_reports_underrun_then_refilled() {
        let f = fixture();
        let id = stream_source(&f.player);
        f.player.play(id).unwrap();
        f.player.sync();

        f.engine.emit_buffering(30);
        f.player.sync();
        f.engine.emit_buffering(100);
        f.player.sync();

        assert_eq!(
            f.observer.events(),
            vec![
                ObservedEvent::Started(id),
                ObservedEvent::Underrun(id),
                ObservedEvent::Refilled(id),
            ]
        );

        // `is_paused` stayed false: a normal pause still reports paused.
        f.player.pause(id).unwrap();
        f.player.sync();
        assert_eq!(f.observer.events().last(), Some(&ObservedEvent::Paused(id)));
    }

    #[test]
    fn commands_quoting_a_stale_id_are_rejected_without_events() {
        let f = fixture();
        let old = stream_source(&f.player);
        let new = stream_source(&f.player);
        assert!(f.player.play(old).is_err());
        f.player.sync();
        assert!(f.observer.events().is_empty());
        f.player.play(new).unwrap();
        f.player.sync();
        assert_eq!(f.observer.events(), vec![ObservedEvent::Started(new)]);
    }

    #[test]
    fn volume_round_trips_and_clamps() {
        let f = fixture();
        f.player.set_volume(50).unwrap();
        assert_eq!(f.player.get_speaker_settings().unwrap().volume, 50);

        f.player.adjust_volume(10).unwrap();
        assert_eq!(f.player.get_speaker_settings().unwrap().volume, 60);

        f.player.adjust_volume(100).unwrap();
        assert_eq!(f.player.get_speaker_settings().unwrap().volume, 100);

        f.player.adjust_volume(-10).unwrap();
        assert_eq!(f.player.get_speaker_settings().unwrap().volume, 90);

        assert!(f.player.set_volume(101).is_err());
    }

    #[test]
    fn mute_round_trips() {
        let f = fixture();
        f.player.set_mute(true).unwrap();
        assert!(f.player.get_speaker_settings().unwrap().mute);
        f.player.set_mute(false).unwrap();
        assert!(!f.player.get_speaker_settings().unwrap().mute);
    }

    #[test]
    fn stop_on_a_stopped_source_fails_without_events() {
        let f = fixture();
        let id = stream_source(&f.player);
        assert!(f.player.stop(id).is_err());
        f.player.sync();
        assert!(f.observer.events().is_empty());
    }

    #[test]
    fn stop_completes_a_pending_play_before_stopping() {
        let f = fixture();
        f.engine.set_auto_state_messages(false);
        let id = stream_source(&f.player);
        f.player.play(id).unwrap();
        f.player.stop(id).unwrap();
        f.player.sync();
        assert_eq!(
            f.observer.events(),
            vec![ObservedEvent::Started(id), ObservedEvent::Stopped(id)]
        );
        // Terminal: nothing further for this id.
        assert!(f.player.pause(id).is_err());
    }

    #[test]
    fn pause_and_resume_cycle() {
        let f = fixture();
        let id = stream_source(&f.player);
        f.player.play(id).unwrap();
        f.player.sync();
        f.player.pause(id).unwrap();
        f.player.sync();
        f.player.resume(id).unwrap();
        f.player.sync();
        assert_eq!(
            f.observer.events(),
            vec![
                ObservedEvent::Started(id),
                ObservedEvent::Paused(id),
                ObservedEvent::Resumed(id),
            ]
        );
    }

    #[test]
    fn resume_requires_a_paused_pipeline() {
        let f = fixture();
        let id = stream_source(&f.player);
        f.player.play(id).unwrap();
        f.player.sync();
        assert!(f.player.resume(id).is_err());
    }

    #[test]
    fn get_offset_reports_position_only_while_paused_or_playing() {
        let f = fixture();
        f.engine.set_position_result(Some(Duration::from_secs(5)));
        let id = stream_source(&f.player);

        // Pipeline still NULL before play.
        assert_eq!(f.player.get_offset(id), None);

        f.player.play(id).unwrap();
        f.player.sync();
        assert_eq!(f.player.get_offset(id), Some(Duration::from_secs(5)));
        assert_eq!(f.player.get_offset(SourceId::INVALID), None);

        f.player.stop(id).unwrap();
        assert_eq!(f.player.get_offset(id), None);
    }

    #[test]
    fn tags_are_filtered_stringified_and_ordered() {
        let f = fixture();
        let id = stream_source(&f.player);
        f.engine.emit_tags(vec![
            TagEntry {
                key: "title".to_string(),
                value: TagValue::String("Song".to_string()),
            },
            TagEntry {
                key: "art".to_string(),
                value: TagValue::Buffer(vec![1, 2, 3]),
            },
            TagEntry {
                key: "bitrate".to_string(),
                value: TagValue::Uint(128_000),
            },
            TagEntry {
                key: "gain".to_string(),
                value: TagValue::Double(-2.5),
            },
            TagEntry {
                key: "date".to_string(),
                value: TagValue::DateTime("2017-01-01".to_string()),
            },
        ]);
        f.player.sync();
        let events = f.observer.events();
        assert_eq!(events.len(), 1);
        let ObservedEvent::Tags(tag_id, tags) = &events[0] else {
            panic!("expected a tags event");
        };
        assert_eq!(*tag_id, id);
        let keys: Vec<&str> = tags.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["title", "bitrate", "gain", "date"]);
        assert_eq!(tags[1].value, "128000");
        assert_eq!(tags[1].kind, TagKind::Uint);
        assert_eq!(tags[3].kind, TagKind::String);
    }

    #[test]
    fn tag_messages_with_no_usable_values_deliver_an_empty_list() {
        let f = fixture();
        let id = stream_source(&f.player);
        f.engine.emit_tags(vec![TagEntry {
            key: "art".to_string(),
            value: TagValue::Buffer(vec![0]),
        }]);
        f.player.sync();
        assert_eq!(f.observer.events(), vec![ObservedEvent::Tags(id, Vec::new())]);
    }

    #[test]
    fn engine_errors_are_classified_and_terminal() {
        let f = fixture();
        let id = stream_source(&f.player);
        f.player.play(id).unwrap();
        f.player.sync();

        let source_element = f.engine.element_named("audio_source").unwrap();
        f.engine.emit_error_from(
            source_element,
            EngineError {
                kind: EngineErrorKind::Network,
                http_status: Some(503),
                message: "service unavailable".to_string(),
            },
        );
        f.player.sync();
        assert_eq!(
            f.observer.events().last(),
            Some(&ObservedEvent::Error(
                id,
                MediaError::ServiceUnavailable,
                "service unavailable".to_string()
            ))
        );
        assert!(f.player.play(id).is_err());
    }

    #[test]
    fn errors_from_other_elements_are_device_errors() {
        let f = fixture();
        let id = stream_source(&f.player);
        f.player.play(id).unwrap();
        f.player.sync();

        let sink = f.engine.element_named("audio_sink").unwrap();
        f.engine.emit_error_from(
            sink,
            EngineError {
                kind: EngineErrorKind::Other,
                http_status: None,
                message: "sink write failed".to_string(),
            },
        );
        f.player.sync();
        assert_eq!(
            f.observer.events().last(),
            Some(&ObservedEvent::Error(
                id,
                MediaError::InternalDeviceError,
                "sink write failed".to_string()
            ))
        );
    }

    #[test]
    fn replacing_a_source_is_silent_and_tears_the_old_one_down() {
        let f = fixture();
        let first = stream_source(&f.player);
        let second = stream_source(&f.player);
        f.player.sync();
        assert!(f.observer.events().is_empty());
        assert_eq!(f.engine.removed_elements().len(), 2);
        assert!(f.player.play(first).is_err());
        f.player.play(second).unwrap();
    }

    #[test]
    fn url_source_cycles_through_playlist_entries() {
        let f = fixture();
        f.factory.insert(
            "http://host/show.m3u",
            "audio/x-mpegurl",
            b"http://host/ep1.mp3\nhttp://host/ep2.mp3\n",
        );
        f.factory.insert("http://host/ep1.mp3", "audio/mpeg", b"one");
        f.factory.insert("http://host/ep2.mp3", "audio/mpeg", b"two");

        let id = f.player.set_url_source("http://host/show.m3u").unwrap();
        f.player.play(id).unwrap();
        f.player.sync();
        assert_eq!(f.observer.events(), vec![ObservedEvent::Started(id)]);

        // First entry drains; the second one keeps the same id playing.
        f.engine.emit_end_of_stream();
        f.player.sync();
        assert_eq!(f.observer.events(), vec![ObservedEvent::Started(id)]);

        // Second entry drains; now playback finishes.
        f.engine.emit_end_of_stream();
        f.player.sync();
        assert_eq!(
            f.observer.events(),
            vec![ObservedEvent::Started(id), ObservedEvent::Finished(id)]
        );
    }

    #[test]
    fn url_source_with_a_bad_playlist_fails() {
        let f = fixture();
        f.factory
            .insert("http://host/empty.m3u", "audio/x-mpegurl", b"#EXTM3U\n");
        assert!(f.player.set_url_source("http://host/empty.m3u").is_err());
        f.player.sync();
        assert!(f.observer.events().is_empty());
    }

    #[test]
    fn engine_initiated_drop_to_null_reports_stopped() {
        let f = fixture();
        f.engine.set_auto_state_messages(false);
        let id = stream_source(&f.player);
        f.player.play(id).unwrap();
        // The engine drops the pipeline on its own and reports the final
        // transition; the controller translates it into a stop.
        f.engine
            .emit_state_changed(PipelineState::Ready, PipelineState::Null, None);
        f.player.sync();
        assert_eq!(f.observer.events(), vec![ObservedEvent::Stopped(id)]);
        assert!(f.player.play(id).is_err());
    }

    #[test]
    fn pad_added_links_the_decoder_to_the_converter() {
        let f = fixture();
        let _id = stream_source(&f.player);
        let decoder = f.engine.element_named("decoder").unwrap();
        let converter = f.engine.element_named("converter").unwrap();
        f.engine.fire_pad_added(decoder);
        f.player.sync();
        assert!(f.engine.links().contains(&(decoder, converter)));
    }

    #[test]
    fn set_volume_drives_the_engine_scale() {
        let f = fixture();
        f.player.set_volume(50).unwrap();
        assert!((f.engine.current_volume() - 0.5).abs() < 1e-12);
        f.player.set_volume(0).unwrap();
        assert_eq!(f.engine.current_volume(), 0.0);
        f.player.set_volume(100).unwrap();
        assert_eq!(f.engine.current_volume(), 1.0);
    }

    #[test]
    fn play_fails_when_the_state_query_fails() {
        let f = fixture();
        let id = stream_source(&f.player);
        f.engine.set_fail_get_state(true);
        assert!(f.player.play(id).is_err());
        f.player.sync();
        assert!(f.observer.events().is_empty());
    }

    #[test]
    fn synchronous_state_change_failure_is_reported_asynchronously() {
        let f = fixture();
        let id = stream_source(&f.player);
        f.engine.force_set_state_result(Some(StateChangeResult::Failure));
        // The command itself is accepted; the failure arrives as an error
        // event, and the id dies with it.
        f.player.play(id).unwrap();
        f.player.sync();
        assert_eq!(
            f.observer.events(),
            vec![ObservedEvent::Error(
                id,
                MediaError::InternalDeviceError,
                "failed to request playback state".to_string()
            )]
        );
        f.engine.force_set_state_result(None);
        assert!(f.player.play(id).is_err());
    }

    #[test]
    fn speaker_type_is_fixed_at_construction() {
        let f = fixture();
        assert_eq!(f.player.speaker_type(), SpeakerType::Avatar);
    }

    #[test]
    fn dropping_the_player_with_an_active_source_is_clean() {
        let f = fixture();
        let id = stream_source(&f.player);
        f.player.play(id).unwrap();
        drop(f.player);
    }
}
