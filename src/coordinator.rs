//! # Request coordinator
//!
//! Tracks in-flight remote requests per key (one key per entity table) and
//! gives callers a join point.
//!
//! Each key moves between two states:
//!
//! ```text
//! Idle --enqueue--> Pending(1) --enqueue--> Pending(n)
//! Pending(n) --completion--> Pending(n-1) --...--> Idle
//! ```
//!
//! Every completion, successful or not, decrements the key's counter and
//! publishes a [`RequestEvent`]: `Finished` or `Failed` for the request
//! itself, followed by `Drained` when the key returns to idle. Events of one
//! key are published in completion order; nothing is promised across keys.
//!
//! [`RequestCoordinator::wait_for_response`] suspends until the key is idle.
//! It is a join, not a cancellation point, and it has no deadline of its own;
//! [`RequestCoordinator::wait_for_response_timeout`] bounds it.
//!
//! Requests for the same key are not serialized, only counted.

use std::{
    collections::HashMap,
    future::Future,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::sync::{broadcast, oneshot, watch};

use crate::error::RemoteError;

/// Broadcast channel capacity for request events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestEvent {
    /// A request completed successfully.
    Finished {
        key: String,
        request: RequestId,
        remaining: usize,
    },
    /// A request completed with an error.
    Failed {
        key: String,
        request: RequestId,
        kind: &'static str,
        remaining: usize,
    },
    /// The last in-flight request of `key` completed.
    Drained { key: String },
}

impl RequestEvent {
    pub fn key(&self) -> &str {
        match self {
            RequestEvent::Finished { key, .. }
            | RequestEvent::Failed { key, .. }
            | RequestEvent::Drained { key } => key,
        }
    }
}

pub struct RequestCoordinator {
    keys: Mutex<HashMap<String, Arc<watch::Sender<usize>>>>,
    events: broadcast::Sender<RequestEvent>,
    next_id: AtomicU64,
}

impl Default for RequestCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestCoordinator {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            keys: Mutex::new(HashMap::new()),
            events,
            next_id: AtomicU64::new(1),
        }
    }

    fn counter(&self, key: &str) -> Arc<watch::Sender<usize>> {
        let mut keys = self
            .keys
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(
            keys.entry(key.to_string())
                .or_insert_with(|| Arc::new(watch::Sender::new(0))),
        )
    }

    /// Spawns `request` on the tokio runtime and accounts for it under `key`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn enqueue<T, F>(&self, key: &str, request: F) -> RequestHandle<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, RemoteError>> + Send + 'static,
    {
        let counter = self.counter(key);
        counter.send_modify(|pending| *pending += 1);

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        let mut completion = Completion {
            key: key.to_string(),
            request: id,
            counter,
            events: self.events.clone(),
            failure: Some(RemoteError::Dropped.kind()),
        };

        tokio::spawn(async move {
            let result = request.await;
            completion.failure = result.as_ref().err().map(RemoteError::kind);
            if let Err(e) = &result {
                tracing::debug!(key = %completion.key, request = id, error = %e, "request failed");
            }
            let _ = tx.send(result);
            // completion drops here and releases the key
        });

        RequestHandle {
            key: key.to_string(),
            id,
            inner: HandleState::Pending(rx),
        }
    }

    /// Suspends until every request enqueued under `key` has completed.
    pub async fn wait_for_response(&self, key: &str) {
        let mut rx = self.counter(key).subscribe();
        let _ = rx.wait_for(|pending| *pending == 0).await;
    }

    /// Bounded [`wait_for_response`](Self::wait_for_response). Returns false
    /// when `timeout` elapsed first; the requests keep running.
    pub async fn wait_for_response_timeout(&self, key: &str, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait_for_response(key))
            .await
            .is_ok()
    }

    pub fn pending(&self, key: &str) -> usize {
        *self.counter(key).borrow()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RequestEvent> {
        self.events.subscribe()
    }
}

/// Releases one pending slot of a key when dropped, even if the request task
/// panicked.
struct Completion {
    key: String,
    request: RequestId,
    counter: Arc<watch::Sender<usize>>,
    events: broadcast::Sender<RequestEvent>,
    failure: Option<&'static str>,
}

impl Drop for Completion {
    fn drop(&mut self) {
        self.counter.send_modify(|pending| {
            *pending = pending.saturating_sub(1);
            let remaining = *pending;

            let event = match self.failure {
                None => RequestEvent::Finished {
                    key: self.key.clone(),
                    request: self.request,
                    remaining,
                },
                Some(kind) => RequestEvent::Failed {
                    key: self.key.clone(),
                    request: self.request,
                    kind,
                    remaining,
                },
            };
            let _ = self.events.send(event);

            if remaining == 0 {
                let _ = self.events.send(RequestEvent::Drained {
                    key: self.key.clone(),
                });
            }
        });
    }
}

enum HandleState<T> {
    Pending(oneshot::Receiver<Result<T, RemoteError>>),
    Ready(Result<T, RemoteError>),
}

/// Typed outcome of one enqueued request.
pub struct RequestHandle<T> {
    key: String,
    id: RequestId,
    inner: HandleState<T>,
}

impl<T> RequestHandle<T> {
    /// A handle for a request refused before it reached the coordinator.
    pub fn rejected(key: &str, error: RemoteError) -> Self {
        Self {
            key: key.to_string(),
            id: 0,
            inner: HandleState::Ready(Err(error)),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Identifier carried by this request's events, `0` for rejected ones.
    pub fn id(&self) -> RequestId {
        self.id
    }

    pub async fn outcome(self) -> Result<T, RemoteError> {
        match self.inner {
            HandleState::Ready(result) => result,
            HandleState::Pending(rx) => rx.await.unwrap_or(Err(RemoteError::Dropped)),
        }
    }
}
