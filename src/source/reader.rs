// Pull-reader source: polls an attachment reader and feeds the pipeline

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::engine::{Element, PipelineEngine};
use crate::error::{PlayerError, Result};
use crate::pipeline::AudioPipeline;
use crate::source::{Feeder, SourceAdapter, FEED_CHUNK_SIZE};

/// Outcome of one [`AttachmentReader::read`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadStatus {
    /// `n` bytes were written into the buffer.
    Data(usize),
    /// Nothing available right now; try again shortly.
    WouldBlock,
    /// The writer closed the attachment; no more data will arrive.
    Closed,
    Error(String),
}

/// Pull-style producer of compressed audio bytes.
pub trait AttachmentReader: Send {
    fn read(&mut self, buf: &mut [u8]) -> ReadStatus;
}

/// Back-off before polling again after a would-block read.
const WOULD_BLOCK_BACKOFF: Duration = Duration::from_millis(10);

/// Source adapter for a pull-style attachment reader.
pub struct ReaderSource {
    engine: Arc<dyn PipelineEngine>,
    element: Element,
    reader: Option<Box<dyn AttachmentReader>>,
    feeder: Option<Feeder>,
}

impl ReaderSource {
    /// Create the adapter and insert its elements into the pipeline.
    pub fn create(pipeline: &mut AudioPipeline, reader: Box<dyn AttachmentReader>) -> Result<Self> {
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
            reader: Some(reader),
            feeder: None,
        })
    }
}

impl SourceAdapter for ReaderSource {
    fn preprocess(&mut self) {
        if self.feeder.is_some() {
            return;
        }
        let Some(mut reader) = self.reader.take() else {
            log::debug!("Attachment reader already consumed; nothing to feed");
            return;
        };
        let engine = Arc::clone(&self.engine);
        let element = self.element;
        self.feeder = Some(Feeder::spawn(move |stop| {
            let mut chunk = [0u8; FEED_CHUNK_SIZE];
            loop {
                if stop.load(std::sync::atomic::Ordering::Relaxed) {
                    break;
                }
                match reader.read(&mut chunk) {
                    ReadStatus::Data(0) | ReadStatus::WouldBlock => {
                        thread::sleep(WOULD_BLOCK_BACKOFF);
                    }
                    ReadStatus::Data(n) => {
                        let n = n.min(chunk.len());
                        if !engine.push_source_data(element, &chunk[..n]) {
                            break;
                        }
                    }
                    ReadStatus::Closed => {
                        let _ = engine.end_source_data(element);
                        break;
                    }
                    ReadStatus::Error(message) => {
                        log::error!("Attachment read failed: {}", message);
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
        self.reader = None;
    }
}
