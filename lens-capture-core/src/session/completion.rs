use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use parking_lot::{Condvar, Mutex};

use crate::models::error::SessionError;

struct Slot<T> {
    result: Option<Result<T, SessionError>>,
    waker: Option<Waker>,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

/// The pending result of a session operation.
///
/// Resolves once the operation has run on the session queue. Wait on it
/// with [`wait`](Self::wait) or `.await` it.
#[must_use = "session operations report success or failure through their completion"]
pub struct Completion<T> {
    shared: Arc<Shared<T>>,
}

/// Write side of a [`Completion`]. Dropping it unfulfilled resolves the
/// completion with [`SessionError::QueueClosed`].
pub(crate) struct Completer<T> {
    shared: Option<Arc<Shared<T>>>,
}

pub(crate) fn pair<T>() -> (Completer<T>, Completion<T>) {
    let shared = Arc::new(Shared {
        slot: Mutex::new(Slot {
            result: None,
            waker: None,
        }),
        ready: Condvar::new(),
    });
    (
        Completer {
            shared: Some(Arc::clone(&shared)),
        },
        Completion { shared },
    )
}

impl<T> Completion<T> {
    /// A completion that is already resolved.
    pub fn ready(result: Result<T, SessionError>) -> Self {
        let (completer, completion) = pair();
        completer.complete(result);
        completion
    }

    /// Block until the operation finishes.
    pub fn wait(self) -> Result<T, SessionError> {
        let mut slot = self.shared.slot.lock();
        loop {
            if let Some(result) = slot.result.take() {
                return result;
            }
            self.shared.ready.wait(&mut slot);
        }
    }

    pub fn is_complete(&self) -> bool {
        self.shared.slot.lock().result.is_some()
    }
}

impl<T> Future for Completion<T> {
    type Output = Result<T, SessionError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.shared.slot.lock();
        match slot.result.take() {
            Some(result) => Poll::Ready(result),
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl<T> Completer<T> {
    pub(crate) fn complete(mut self, result: Result<T, SessionError>) {
        self.fulfill(result);
    }

    fn fulfill(&mut self, result: Result<T, SessionError>) {
        let Some(shared) = self.shared.take() else {
            return;
        };
        let waker = {
            let mut slot = shared.slot.lock();
            slot.result = Some(result);
            slot.waker.take()
        };
        shared.ready.notify_all();
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        self.fulfill(Err(SessionError::QueueClosed));
    }
}
