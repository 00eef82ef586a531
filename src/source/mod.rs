// Source adapters: bridge a byte producer to the pipeline's source element

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

mod reader;
mod stream;
mod url;

pub use reader::{AttachmentReader, ReadStatus, ReaderSource};
pub use stream::{MediaStream, StreamSource};
pub use url::UrlSource;

/// Bytes per push into the engine's source element.
pub(crate) const FEED_CHUNK_SIZE: usize = 4096;

/// Capability the controller consumes from the active source.
///
/// Adapters create their source and decoder elements at construction and
/// register them with the pipeline facade; byte feeding happens on an
/// adapter-owned worker thread.
pub trait SourceAdapter: Send {
    /// Called on the dispatcher before each play request.
    fn preprocess(&mut self);

    /// React to the pipeline reaching end of stream. Returns false only
    /// when the adapter could not recover its own state.
    fn handle_end_of_stream(&mut self) -> bool;

    /// Whether another segment is ready to play after an end of stream.
    fn has_additional_data(&self) -> bool;

    /// Whether the bytes come from a remote service, for error
    /// classification.
    fn is_playback_remote(&self) -> bool;

    /// Stop feeding and release the byte producer. Idempotent.
    fn shutdown(&mut self);
}

/// A stoppable feeding thread.
///
/// The worker closure polls the flag between chunks and exits promptly once
/// it is raised; `stop` raises it and joins.
pub(crate) struct Feeder {
    stop: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl Feeder {
    pub(crate) fn spawn<F>(work: F) -> Feeder
    where
        F: FnOnce(&AtomicBool) + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let worker = thread::spawn(move || work(&flag));
        Feeder {
            stop,
            worker: Some(worker),
        }
    }

    pub(crate) fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for Feeder {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn feeder_stops_and_joins() {
        let mut feeder = Feeder::spawn(|stop| {
            while !stop.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(1));
            }
        });
        feeder.stop();
        assert!(feeder.worker.is_none());
    }

    #[test]
    fn feeder_drop_stops_the_worker() {
        let ran = Arc::new(AtomicBool::new(false));
        {
            let ran = Arc::clone(&ran);
            let _feeder = Feeder::spawn(move |stop| {
                while !stop.load(Ordering::Relaxed) {
                    thread::sleep(Duration::from_millis(1));
                }
                ran.store(true, Ordering::Relaxed);
            });
        }
        assert!(ran.load(Ordering::Relaxed));
    }
}
