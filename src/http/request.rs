//! Request handles and the exactly-once delivery guard.
//!
//! Issuing a request yields two halves sharing one [`Delivery`]:
//!
//! - [`RequestHandle`] stays with the caller and can cancel at any time.
//! - [`Responder`] goes to the transport, which reports progress through it
//!   and finally completes it.
//!
//! Whichever of completion and cancellation wins the compare-and-swap on the
//! delivered flag invokes the caller's completion callback; the other becomes
//! a no-op. Progress is only reported while the request is pending and never
//! overlaps the terminal callback.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::ReentrantMutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::error::RequestError;
use super::response::HttpResponse;

/// Terminal callback of a request, invoked exactly once.
pub type CompletionCallback = Box<dyn FnOnce(Result<HttpResponse, RequestError>) + Send + 'static>;

/// Progress callback: `(transferred, total)`; `total` is 0 when unknown.
pub type ProgressCallback = Box<dyn FnMut(u64, u64) + Send + 'static>;

struct Callbacks {
    completion: Option<CompletionCallback>,
    progress: Option<ProgressCallback>,
}

struct Delivery {
    delivered: AtomicBool,
    callbacks: ReentrantMutex<RefCell<Callbacks>>,
    token: CancellationToken,
}

impl Delivery {
    /// Invoke the completion callback unless a terminal result was already
    /// delivered. Returns whether this call delivered.
    fn deliver(&self, result: Result<HttpResponse, RequestError>) -> bool {
        let result = match result {
            Ok(_) if self.token.is_cancelled() => Err(RequestError::Cancelled),
            other => other,
        };
        if self
            .delivered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        // Waits for a progress call running on another thread.
        let completion = {
            let guard = self.callbacks.lock();
            let mut callbacks = guard.borrow_mut();
            callbacks.progress = None;
            callbacks.completion.take()
        };
        if let Some(completion) = completion {
            completion(result);
        }
        true
    }

    fn progress(&self, transferred: u64, total: u64) {
        if self.delivered.load(Ordering::Acquire) {
            return;
        }
        let guard = self.callbacks.lock();
        let taken = guard.borrow_mut().progress.take();
        let Some(mut progress) = taken else {
            return;
        };
        progress(transferred, total);
        // The callback may have cancelled the request from the same thread.
        if !self.delivered.load(Ordering::Acquire) {
            guard.borrow_mut().progress = Some(progress);
        }
    }

    #[inline]
    fn is_delivered(&self) -> bool {
        self.delivered.load(Ordering::Acquire)
    }
}

/// Create the caller and transport halves of a new request.
pub fn channel(completion: CompletionCallback, progress: Option<ProgressCallback>) -> (RequestHandle, Responder) {
    let delivery = Arc::new(Delivery {
        delivered: AtomicBool::new(false),
        callbacks: ReentrantMutex::new(RefCell::new(Callbacks {
            completion: Some(completion),
            progress,
        })),
        token: CancellationToken::new(),
    });
    (
        RequestHandle {
            delivery: Arc::clone(&delivery),
        },
        Responder { delivery },
    )
}

/// Caller side of an in-flight request.
#[derive(Clone)]
pub struct RequestHandle {
    delivery: Arc<Delivery>,
}

impl RequestHandle {
    /// Cancel the request.
    ///
    /// Safe at any time: after completion it does nothing, and when it races
    /// the transport's completion exactly one of the two reaches the caller.
    /// A cancelled request always resolves as [`RequestError::Cancelled`].
    pub fn cancel(&self) {
        self.delivery.token.cancel();
        if self.delivery.deliver(Err(RequestError::Cancelled)) {
            debug!("request cancelled");
        }
    }

    /// Whether the terminal callback has been invoked (or is being invoked).
    pub fn is_finished(&self) -> bool {
        self.delivery.is_delivered()
    }

    pub fn is_cancelled(&self) -> bool {
        self.delivery.token.is_cancelled()
    }
}

impl fmt::Debug for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandle")
            .field("finished", &self.is_finished())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Transport side of an in-flight request.
///
/// Dropping a responder without completing it delivers a transport failure,
/// so a caller is never left waiting on a request the transport abandoned.
pub struct Responder {
    delivery: Arc<Delivery>,
}

impl Responder {
    /// Deliver the terminal result. Returns false if the request was already
    /// cancelled; the result is then discarded.
    pub fn complete(self, result: Result<HttpResponse, RequestError>) -> bool {
        let delivered = self.delivery.deliver(result);
        if !delivered {
            trace!("completion discarded after cancellation");
        }
        delivered
    }

    /// Report transfer progress. Ignored once the request is finished.
    pub fn progress(&self, transferred: u64, total: u64) {
        self.delivery.progress(transferred, total);
    }

    /// Progress reporter that can be moved into a body stream.
    pub fn progress_reporter(&self) -> ProgressReporter {
        ProgressReporter {
            delivery: Arc::clone(&self.delivery),
        }
    }

    /// Token cancelled when the caller cancels; transports stop work on it.
    pub fn token(&self) -> CancellationToken {
        self.delivery.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.delivery.token.is_cancelled()
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        if !self.delivery.is_delivered() {
            self.delivery.deliver(Err(RequestError::TransportFailure(
                "transport dropped the request without completing it".to_string(),
            )));
        }
    }
}

/// Owned progress sink for a request.
#[derive(Clone)]
pub struct ProgressReporter {
    delivery: Arc<Delivery>,
}

impl ProgressReporter {
    pub fn report(&self, transferred: u64, total: u64) {
        self.delivery.progress(transferred, total);
    }
}
