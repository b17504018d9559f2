//! Scripted [`Fetcher`] for tests.

use async_trait::async_trait;
use gelo_asyncutils::lock;
use reqwest::StatusCode;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::{ErrorKind, Result};
use crate::fetcher::{Fetcher, Response};

const UNSCRIPTED_STATUS: u16 = 404;

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(Vec<u8>),
    Status(u16),
    Transport(String),
}

/// In-memory [`Fetcher`] that replays scripted replies per URL.
///
/// Replies for a URL are consumed in order; the last one repeats forever.
/// URLs without a script get a 404. Every call optionally sleeps for a fixed
/// latency (use paused tokio time), and the highest number of overlapping
/// calls is recorded.
///
/// ```ignore
/// use gelo_queue::{Fetcher, MockFetcher, Reply};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let fetcher = MockFetcher::new();
/// fetcher.script("https://a", [Reply::Status(500), Reply::Ok(b"{}".to_vec())]);
/// assert_eq!(fetcher.get("https://a").await.unwrap().status, 500);
/// assert_eq!(fetcher.get("https://a").await.unwrap().status, 200);
/// assert_eq!(fetcher.get("https://a").await.unwrap().status, 200);
/// # }
/// ```
#[derive(Default)]
pub struct MockFetcher {
    latency: Duration,
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self { latency, ..Self::default() }
    }

    /// Append replies to the script for `url`.
    pub fn script(&self, url: impl Into<String>, replies: impl IntoIterator<Item = Reply>) {
        lock(&self.scripts).entry(url.into()).or_default().extend(replies);
    }

    /// Every requested URL, in call order.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        lock(&self.calls).iter().filter(|u| *u == url).count()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(&self, url: &str) -> Reply {
        let mut scripts = lock(&self.scripts);
        match scripts.get_mut(url) {
            Some(replies) if replies.len() > 1 => replies.pop_front().unwrap_or(Reply::Status(UNSCRIPTED_STATUS)),
            Some(replies) => replies.front().cloned().unwrap_or(Reply::Status(UNSCRIPTED_STATUS)),
            None => Reply::Status(UNSCRIPTED_STATUS),
        }
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn get(&self, url: &str) -> Result<Response> {
        lock(&self.calls).push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.next_reply(url) {
            Reply::Ok(body) => Ok(Response {
                status: StatusCode::OK,
                body,
            }),
            Reply::Status(status) => {
                let status = StatusCode::from_u16(status).map_err(|e| ErrorKind::Transport(e.to_string()))?;
                Ok(Response { status, body: Vec::new() })
            },
            Reply::Transport(reason) => exn::bail!(ErrorKind::Transport(reason)),
        }
    }
}
