// Byte-stream source: feeds a seekable stream into the pipeline

use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;

use crate::engine::{Element, PipelineEngine};
use crate::error::{PlayerError, Result};
use crate::pipeline::AudioPipeline;
use crate::source::{Feeder, SourceAdapter, FEED_CHUNK_SIZE};

/// Seekable byte stream accepted by [`StreamSource`]. Seekability is what
/// makes `repeat` possible.
pub trait MediaStream: Read + Seek + Send {}

impl<T: Read + Seek + Send + ?Sized> MediaStream for T {}

/// Source adapter for an in-process byte stream.
///
/// With `repeat` the feeder rewinds at end of stream and keeps feeding, so
/// the pipeline never sees an end of stream; without it the stream is fed
/// once and end-of-data is signalled.
pub struct StreamSource {
    engine: Arc<dyn PipelineEngine>,
    element: Element,
    stream: Option<Box<dyn MediaStream>>,
    repeat: bool,
    feeder: Option<Feeder>,
}

impl StreamSource {
    /// Create the adapter and insert its elements into the pipeline.
    pub fn create(
        pipeline: &mut AudioPipeline,
        stream: Box<dyn MediaStream>,
        repeat: bool,
    ) -> Result<Self> {
        let engine = Arc::clone(pipeline.engine());
        let element = engine
            .make_element("appsrc", "audio_source")
            .ok_or_else(|| {
                PlayerError::InitializationError("failed to create source element".to_string())
            })?;
        let decoder = engine.make_element("decodebin", "decoder").ok_or_else(|| {
            PlayerError::InitializationError("failed to create decoder element".to_string())
        })?;
        pipeline.set_source_elements(element, decoder)?;
        Ok(Self {
            engine,
            element,
            stream: Some(stream),
            repeat,
            feeder: None,
        })
    }
}

impl SourceAdapter for StreamSource {
    fn preprocess(&mut self) {
        if self.feeder.is_some() {
            return;
        }
        let Some(mut stream) = self.stream.take() else {
            log::debug!("Stream already consumed; nothing to feed");
            return;
        };
        let engine = Arc::clone(&self.engine);
        let element = self.element;
        let repeat = self.repeat;
        self.feeder = Some(Feeder::spawn(move |stop| {
            let mut chunk = [0u8; FEED_CHUNK_SIZE];
            loop {
                if stop.load(std::sync::atomic::Ordering::Relaxed) {
                    break;
                }
                match stream.read(&mut chunk) {
                    Ok(0) => {
                        if repeat {
                            if let Err(e) = stream.seek(SeekFrom::Start(0)) {
                                log::error!("Rewinding repeating stream failed: {}", e);
                                let _ = engine.end_source_data(element);
                                break;
                            }
                            continue;
                        }
                        let _ = engine.end_source_data(element);
                        break;
                    }
                    Ok(n) => {
                        if !engine.push_source_data(element, &chunk[..n]) {
                            break;
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        log::error!("Reading stream source failed: {}", e);
                        let _ = engine.end_source_data(element);
                        break;
                    }
                }
            }
        }));
    }

    fn handle_end_of_stream(&mut self) -> bool {
        true
    }

    fn has_additional_data(&self) -> bool {
        false
    }

    fn is_playback_remote(&self) -> bool {
        false
    }

    fn shutdown(&mut self) {
        if let Some(mut feeder) = self.feeder.take() {
            feeder.stop();
        }
        self.stream = None;
    }
}
