use std::sync::mpsc;
use std::thread;

use crate::models::error::SessionError;
use crate::session::completion::{self, Completion};

type Job<C> = Box<dyn FnOnce(&mut C) + Send + 'static>;

/// A dedicated worker thread that owns a context and runs jobs against it
/// one at a time, strictly in submission order.
///
/// Exclusive ownership of the context by the worker is what serializes
/// mutations; no job ever observes another one half-done.
pub(crate) struct SessionQueue<C: Send + 'static> {
    sender: Option<mpsc::Sender<Job<C>>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl<C: Send + 'static> SessionQueue<C> {
    pub(crate) fn spawn(label: &str, mut context: C) -> Self {
        let (sender, receiver) = mpsc::channel::<Job<C>>();
        let worker = thread::Builder::new()
            .name(label.to_string())
            .spawn(move || {
                for job in receiver {
                    job(&mut context);
                }
                log::debug!("Session queue drained, releasing context");
            })
            .expect("failed to spawn session queue thread");

        Self {
            sender: Some(sender),
            worker: Some(worker),
        }
    }

    /// Enqueue `job`. The returned completion resolves with its result, or
    /// with [`SessionError::QueueClosed`] if the worker is gone.
    pub(crate) fn submit<T, F>(&self, job: F) -> Completion<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut C) -> Result<T, SessionError> + Send + 'static,
    {
        let (completer, completion) = completion::pair();
        let Some(sender) = &self.sender else {
            return completion;
        };
        let job: Job<C> = Box::new(move |context| completer.complete(job(context)));
        if sender.send(job).is_err() {
            log::warn!("Session queue closed, dropping job");
        }
        completion
    }
}

impl<C: Send + 'static> Drop for SessionQueue<C> {
    fn drop(&mut self) {
        // Closing the channel lets the worker finish queued jobs and exit.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            // A job may drop the last handle to its own queue.
            if worker.thread().id() != thread::current().id() {
                let _ = worker.join();
            }
        }
    }
}
