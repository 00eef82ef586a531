// Single-threaded serialization of all controller work
// One worker thread owns the state; callers post closures into a FIFO

use std::thread;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

pub(crate) enum Job<S> {
    Run(Box<dyn FnOnce(&mut S) + Send>),
    Quit,
}

/// Cloneable posting side of a dispatcher.
///
/// `post` never blocks; posted closures run exactly once, in post order, on
/// the worker thread. Pipeline bus deliveries and caller commands share the
/// same FIFO, which is what serializes every mutation of controller state.
pub(crate) struct DispatcherHandle<S> {
    tx: Sender<Job<S>>,
}

impl<S> Clone for DispatcherHandle<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<S> DispatcherHandle<S> {
    /// Queue a closure for the worker. Returns false once the worker has
    /// shut down.
    pub(crate) fn post<F>(&self, job: F) -> bool
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        self.tx.send(Job::Run(Box::new(job))).is_ok()
    }

    /// Queue a closure and block until the worker has run it, returning its
    /// result. Returns `None` if the worker is gone.
    pub(crate) fn call<R, F>(&self, job: F) -> Option<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut S) -> R + Send + 'static,
    {
        let (done_tx, done_rx) = bounded(1);
        if !self.post(move |state| {
            let _ = done_tx.send(job(state));
        }) {
            return None;
        }
        done_rx.recv().ok()
    }
}

/// Owns the worker thread. Dropping it quits the loop (after draining jobs
/// that were already queued) and joins the worker.
pub(crate) struct Dispatcher<S> {
    handle: DispatcherHandle<S>,
    worker: Option<thread::JoinHandle<()>>,
}

impl<S: Send + 'static> Dispatcher<S> {
    /// Create the job channel before the state exists, so state constructors
    /// can hand the posting side to callbacks (e.g. the pipeline bus).
    pub(crate) fn channel() -> (DispatcherHandle<S>, Receiver<Job<S>>) {
        let (tx, rx) = unbounded();
        (DispatcherHandle { tx }, rx)
    }

    pub(crate) fn spawn(state: S, handle: DispatcherHandle<S>, jobs: Receiver<Job<S>>) -> Self {
        let worker = thread::spawn(move || Self::run(state, jobs));
        Self {
            handle,
            worker: Some(worker),
        }
    }

    pub(crate) fn handle(&self) -> &DispatcherHandle<S> {
        &self.handle
    }

    fn run(mut state: S, jobs: Receiver<Job<S>>) {
        while let Ok(job) = jobs.recv() {
            match job {
                Job::Run(job) => job(&mut state),
                Job::Quit => {
                    // Drain whatever was queued before the quit, then exit.
                    while let Ok(Job::Run(job)) = jobs.try_recv() {
                        job(&mut state);
                    }
                    return;
                }
            }
        }
    }
}

impl<S> Drop for Dispatcher<S> {
    fn drop(&mut self) {
        let _ = self.handle.tx.send(Job::Quit);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
