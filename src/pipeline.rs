// Thin facade over the engine pipeline
// Owns the element handles and performs the wiring on source changes

use std::sync::Arc;
use std::time::Duration;

use crate::engine::{
    BusHandler, Element, PadAddedHook, PipelineEngine, PipelineState, StateChangeResult,
};
use crate::error::{PlayerError, Result};

/// The audio processing graph: `src -> decoder -> converter -> volume -> sink`.
///
/// `converter`, `volume` and `sink` are created once and live until the
/// facade is dropped. `src` and `decoder` are transient: the active source
/// adapter installs them and [`AudioPipeline::tear_down_transient`] removes
/// them on every source change.
pub struct AudioPipeline {
    engine: Arc<dyn PipelineEngine>,
    pipeline: Option<Element>,
    source: Option<Element>,
    decoder: Option<Element>,
    converter: Option<Element>,
    volume: Option<Element>,
    sink: Option<Element>,
}

impl AudioPipeline {
    /// Create the persistent tail of the chain and register the bus handler.
    pub fn build(engine: Arc<dyn PipelineEngine>, bus_handler: BusHandler) -> Result<Self> {
        let converter = engine
            .make_element("audioconvert", "converter")
            .ok_or_else(|| init_error("converter"))?;
        let volume = engine
            .make_element("volume", "volume")
            .ok_or_else(|| init_error("volume"))?;
        let sink = engine
            .make_element("alsasink", "audio_sink")
            .ok_or_else(|| init_error("audio sink"))?;
        let pipeline = engine
            .make_pipeline("audio-pipeline")
            .ok_or_else(|| init_error("pipeline"))?;

        engine.set_bus_handler(pipeline, bus_handler);

        for element in [converter, volume, sink] {
            if !engine.add(pipeline, element) {
                return Err(PlayerError::InitializationError(
                    "failed to add a persistent element to the pipeline".to_string(),
                ));
            }
        }
        if !engine.link(converter, volume) || !engine.link(volume, sink) {
            return Err(PlayerError::InitializationError(
                "failed to link converter -> volume -> sink".to_string(),
            ));
        }

        Ok(Self {
            engine,
            pipeline: Some(pipeline),
            source: None,
            decoder: None,
            converter: Some(converter),
            volume: Some(volume),
            sink: Some(sink),
        })
    }

    pub fn engine(&self) -> &Arc<dyn PipelineEngine> {
        &self.engine
    }

    /// Insert the transient head of the chain. The decoder's output is
    /// linked to the converter later, once its pad appears.
    pub fn set_source_elements(&mut self, source: Element, decoder: Element) -> Result<()> {
        let pipeline = self
            .pipeline
            .ok_or_else(|| PlayerError::PipelineError("pipeline not set".to_string()))?;
        if !self.engine.add(pipeline, source) || !self.engine.add(pipeline, decoder) {
            return Err(PlayerError::PipelineError(
                "failed to add source elements to the pipeline".to_string(),
            ));
        }
        if !self.engine.link(source, decoder) {
            return Err(PlayerError::PipelineError(
                "failed to link source -> decoder".to_string(),
            ));
        }
        self.source = Some(source);
        self.decoder = Some(decoder);
        Ok(())
    }

    /// Register a hook for the decoder's pad-added notification.
    pub fn connect_pad_added(&self, hook: PadAddedHook) -> bool {
        match self.decoder {
            Some(decoder) => self.engine.connect_pad_added(decoder, hook),
            None => false,
        }
    }

    /// Complete the chain once the decoder has identified the stream.
    pub fn link_decoder_to_converter(&self) -> bool {
        match (self.decoder, self.converter) {
            (Some(decoder), Some(converter)) => self.engine.link(decoder, converter),
            _ => false,
        }
    }

    /// Stop the pipeline and drop the transient elements.
    pub fn tear_down_transient(&mut self) {
        let Some(pipeline) = self.pipeline else {
            self.source = None;
            self.decoder = None;
            return;
        };
        self.engine.set_state(pipeline, PipelineState::Null);
        if let Some(source) = self.source.take() {
            self.engine.remove(pipeline, source);
        }
        if let Some(decoder) = self.decoder.take() {
            self.engine.remove(pipeline, decoder);
        }
    }

    pub fn is_set(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn is_pipeline(&self, element: Element) -> bool {
        self.pipeline == Some(element)
    }

    pub fn is_source_element(&self, element: Element) -> bool {
        self.source == Some(element)
    }

    pub fn source_element(&self) -> Option<Element> {
        self.source
    }

    pub fn set_state(&self, target: PipelineState) -> StateChangeResult {
        match self.pipeline {
            Some(pipeline) => self.engine.set_state(pipeline, target),
            None => StateChangeResult::Failure,
        }
    }

    pub fn get_state(&self) -> (StateChangeResult, PipelineState, Option<PipelineState>) {
        match self.pipeline {
            Some(pipeline) => self.engine.get_state(pipeline),
            None => (StateChangeResult::Failure, PipelineState::Null, None),
        }
    }

    pub fn query_buffering(&self) -> Option<bool> {
        self.engine.query_buffering(self.pipeline?)
    }

    pub fn query_seekable(&self) -> Option<bool> {
        self.engine.query_seekable(self.pipeline?)
    }

    pub fn query_position(&self) -> Option<Duration> {
        self.engine.query_position(self.pipeline?)
    }

    /// Issue a flushing key-unit seek on the pipeline root.
    pub fn seek(&self, position: Duration) -> bool {
        match self.pipeline {
            Some(pipeline) => self.engine.seek(pipeline, position),
            None => false,
        }
    }

    pub fn decoder_wants_buffering(&self) -> bool {
        match self.decoder {
            Some(decoder) => self.engine.use_buffering(decoder),
            None => false,
        }
    }

    pub fn set_volume(&self, volume: f64) -> bool {
        match self.volume {
            Some(element) => {
                self.engine.set_volume(element, volume);
                true
            }
            None => false,
        }
    }

    pub fn volume(&self) -> Option<f64> {
        self.volume.map(|element| self.engine.volume(element))
    }

    pub fn set_muted(&self, muted: bool) -> bool {
        match self.volume {
            Some(element) => {
                self.engine.set_muted(element, muted);
                true
            }
            None => false,
        }
    }

    pub fn muted(&self) -> Option<bool> {
        self.volume.map(|element| self.engine.muted(element))
    }
}

fn init_error(what: &str) -> PlayerError {
    PlayerError::InitializationError(format!("failed to create {} element", what))
}
