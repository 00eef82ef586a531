// URL source: feeds playlist-expanded entries, one segment at a time

use std::io::Read;
use std::sync::Arc;

use crate::engine::{Element, PipelineEngine};
use crate::error::{PlayerError, Result};
use crate::fetch::HttpContentFetcherFactory;
use crate::pipeline::AudioPipeline;
use crate::source::{Feeder, SourceAdapter, FEED_CHUNK_SIZE};

/// Source adapter for a remote URL.
///
/// Playlist expansion happens earlier, on the URL preparation thread; the
/// adapter receives the flat entry list. Each entry is fetched and fed on
/// its own feeder thread; end of stream advances to the next entry and the
/// controller cycles the pipeline to consume it.
pub struct UrlSource {
    engine: Arc<dyn PipelineEngine>,
    element: Element,
    entries: Vec<String>,
    next_entry: usize,
    factory: Arc<dyn HttpContentFetcherFactory>,
    feeder: Option<Feeder>,
}

impl UrlSource {
    /// Create the adapter and insert its elements into the pipeline.
    pub fn create(
        pipeline: &mut AudioPipeline,
        entries: Vec<String>,
        factory: Arc<dyn HttpContentFetcherFactory>,
    ) -> Result<Self> {
        if entries.is_empty() {
            return Err(PlayerError::PlaylistError(
                "no playable entries for URL source".to_string(),
            ));
        }
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
            entries,
            next_entry: 0,
            factory,
            feeder: None,
        })
    }

    fn start_next_entry(&mut self) -> bool {
        if let Some(mut feeder) = self.feeder.take() {
            feeder.stop();
        }
        let Some(url) = self.entries.get(self.next_entry).cloned() else {
            return false;
        };
        self.next_entry += 1;
        log::debug!("Feeding playlist entry: {}", url);

        let engine = Arc::clone(&self.engine);
        let element = self.element;
        let mut fetcher = self.factory.create(&url);
        self.feeder = Some(Feeder::spawn(move |stop| {
            let content = match fetcher.fetch() {
                Ok(content) => content,
                Err(e) => {
                    log::error!("Fetching {} failed: {}", url, e);
                    let _ = engine.end_source_data(element);
                    return;
                }
            };
            if !content.is_success() {
                log::error!("Fetching {} returned status {}", url, content.status);
                let _ = engine.end_source_data(element);
                return;
            }
            let mut body = content.body;
            let mut chunk = [0u8; FEED_CHUNK_SIZE];
            loop {
                if stop.load(std::sync::atomic::Ordering::Relaxed) {
                    return;
                }
                match body.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => {
                        if !engine.push_source_data(element, &chunk[..n]) {
                            return;
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        log::error!("Streaming {} failed: {}", url, e);
                        break;
                    }
                }
            }
            let _ = engine.end_source_data(element);
        }));
        true
    }
}

impl SourceAdapter for UrlSource {
    fn preprocess(&mut self) {
        if self.feeder.is_none() && self.next_entry == 0 {
            self.start_next_entry();
        }
    }

    fn handle_end_of_stream(&mut self) -> bool {
        if self.next_entry < self.entries.len() {
            self.start_next_entry()
        } else {
            if let Some(mut feeder) = self.feeder.take() {
                feeder.stop();
            }
            true
        }
    }

    fn has_additional_data(&self) -> bool {
        self.feeder.is_some()
    }

    fn is_playback_remote(&self) -> bool {
        true
    }

    fn shutdown(&mut self) {
        if let Some(mut feeder) = self.feeder.take() {
            feeder.stop();
        }
    }
}
