//! Bounded, retrying admission queue.
//!
//! Requests are admitted in FIFO order while fewer than `parallel_requests`
//! are active. Each admitted request runs on its own tokio task until it
//! reaches a terminal state:
//!
//! - success resolves the caller's future and frees the slot;
//! - a 429 keeps the slot for `rate_limit_delay`, then goes back to the end of
//!   pending without touching the retry budget;
//! - any other failure spends one retry and goes back to the end of pending,
//!   or, with no budget left, rejects the caller's future.
//!
//! There is no cancellation. Completion order is whatever the network gives.

use gelo_asyncutils::{Debounce, lock};
use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, oneshot};
use tracing::instrument;

use crate::error::{Error, ErrorKind, Result};
use crate::fetcher::{FetcherHandle, Response};
use crate::settings::Settings;

const EVENT_CAPACITY: usize = 16;

/// Published to subscribers of [`AdmissionQueue::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueEvent {
    /// The server answered 429. Coalesced: at most one per rate-limit window.
    RateLimited,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub pending: usize,
    pub active: usize,
    /// Highest active count observed since the queue was created.
    pub peak_active: usize,
}

struct QueueItem {
    id: u64,
    url: String,
    retries_remaining: u32,
    attempts: u32,
    sink: oneshot::Sender<Result<Response>>,
}

#[derive(Default)]
struct State {
    pending: VecDeque<QueueItem>,
    active: HashSet<u64>,
    next_id: u64,
    peak_active: usize,
}

struct Inner {
    fetcher: FetcherHandle,
    settings: Settings,
    state: Mutex<State>,
    rate_limit: Debounce,
    events: broadcast::Sender<QueueEvent>,
}

/// Cheap to clone; clones share the same queue.
#[derive(Clone)]
pub struct AdmissionQueue {
    inner: Arc<Inner>,
}

impl AdmissionQueue {
    pub fn new(fetcher: FetcherHandle, settings: Settings) -> Self {
        let settings = Settings {
            parallel_requests: settings.parallel_requests.max(1),
            ..settings
        };
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                fetcher,
                rate_limit: Debounce::new(settings.rate_limit_delay()),
                settings,
                state: Mutex::new(State::default()),
                events,
            }),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Queue a GET for `url`.
    ///
    /// The request is queued (and possibly admitted) immediately, before the
    /// returned future is first polled, so enqueue order is admission order.
    /// Must be called from within a tokio runtime.
    pub fn enqueue(&self, url: impl Into<String>) -> impl Future<Output = Result<Response>> + Send + 'static {
        let url = url.into();
        let (sink, receiver) = oneshot::channel();
        {
            let mut state = lock(&self.inner.state);
            let id = state.next_id;
            state.next_id += 1;
            tracing::trace!(id, url = %url, "Enqueued request");
            state.pending.push_back(QueueItem {
                id,
                url,
                retries_remaining: self.inner.settings.max_retry_count,
                attempts: 0,
                sink,
            });
        }
        self.pump();
        async move { receiver.await.unwrap_or_else(|_| Err(exn::Exn::from(ErrorKind::Closed))) }
    }

    /// Receive [`QueueEvent`]s. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.inner.events.subscribe()
    }

    pub fn stats(&self) -> QueueStats {
        let state = lock(&self.inner.state);
        QueueStats {
            pending: state.pending.len(),
            active: state.active.len(),
            peak_active: state.peak_active,
        }
    }

    /// Admit pending items while there are free slots.
    fn pump(&self) {
        let admitted: Vec<QueueItem> = {
            let mut state = lock(&self.inner.state);
            let mut admitted = Vec::new();
            while state.active.len() < self.inner.settings.parallel_requests
                && let Some(item) = state.pending.pop_front()
            {
                state.active.insert(item.id);
                admitted.push(item);
            }
            state.peak_active = state.peak_active.max(state.active.len());
            admitted
        };
        for item in admitted {
            tokio::spawn(self.clone().run(item));
        }
    }

    #[instrument(skip_all, fields(id = item.id, url = %item.url, attempt = item.attempts + 1))]
    async fn run(self, mut item: QueueItem) {
        item.attempts += 1;
        match self.inner.fetcher.get(&item.url).await {
            Ok(response) if response.is_success() => self.finish(item, Ok(response)),
            Ok(response) if response.is_rate_limited() => {
                tracing::warn!(delay_ms = self.inner.settings.rate_limit_delay_ms, "Hit rate limit, backing off");
                if self.inner.rate_limit.trigger() {
                    // No receivers is fine.
                    let _ = self.inner.events.send(QueueEvent::RateLimited);
                }
                tokio::time::sleep(self.inner.settings.rate_limit_delay()).await;
                self.requeue(item);
            },
            Ok(response) => self.retry(item, exn::Exn::from(ErrorKind::Status(response.status.as_u16()))),
            Err(err) => self.retry(item, err),
        }
    }

    fn retry(&self, mut item: QueueItem, err: Error) {
        if item.retries_remaining > 0 {
            item.retries_remaining -= 1;
            tracing::debug!(error = %err, retries_remaining = item.retries_remaining, "Request failed, requeueing");
            self.requeue(item);
        } else {
            tracing::warn!(error = %err, attempts = item.attempts, "Request failed, retry budget exhausted");
            let exhausted = ErrorKind::Exhausted {
                url: item.url.clone(),
                attempts: item.attempts,
            };
            self.finish(item, Err(err.raise(exhausted)));
        }
    }

    fn requeue(&self, item: QueueItem) {
        {
            let mut state = lock(&self.inner.state);
            state.active.remove(&item.id);
            state.pending.push_back(item);
        }
        self.pump();
    }

    fn finish(&self, item: QueueItem, result: Result<Response>) {
        lock(&self.inner.state).active.remove(&item.id);
        // The caller may have dropped its future; nothing to deliver to then.
        let _ = item.sink.send(result);
        self.pump();
    }
}
