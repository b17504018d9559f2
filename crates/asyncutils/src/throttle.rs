use crate::lock;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Coalescing throttle for background work.
///
/// At most one run is ever queued. The first run after a quiet period starts
/// straight away; any later run starts no sooner than `interval` after the
/// previous one started. Requests made while a run is queued are folded into
/// it, so the scheduled task must read the state it needs when it executes,
/// not when it was handed over.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    queued: bool,
    last_run: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, state: Arc::default() }
    }

    /// Queue `task` on the Tokio runtime, unless a run is already queued.
    ///
    /// Returns `false` (and drops `task`) when the request was folded into the
    /// queued run. Must be called from within a Tokio runtime.
    pub fn schedule<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = {
            let mut state = lock(&self.state);
            if state.queued {
                return false;
            }
            state.queued = true;
            match state.last_run {
                Some(last) => (last + self.interval).saturating_duration_since(Instant::now()),
                None => Duration::ZERO,
            }
        };
        tracing::trace!(delay_ms = delay.as_millis() as u64, "Throttled run queued");
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            {
                let mut state = lock(&state);
                state.queued = false;
                state.last_run = Some(Instant::now());
            }
            task.await;
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = Arc::clone(counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_run_is_immediate() {
        let throttle = Throttle::new(Duration::from_secs(1));
        let counter = Arc::new(AtomicUsize::new(0));
        assert!(throttle.schedule(counting(&counter)));
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_fold_into_queued_run() {
        let throttle = Throttle::new(Duration::from_secs(1));
        let counter = Arc::new(AtomicUsize::new(0));
        assert!(throttle.schedule(counting(&counter)));
        assert!(!throttle.schedule(counting(&counter)));
        assert!(!throttle.schedule(counting(&counter)));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_are_spaced_by_interval() {
        let throttle = Throttle::new(Duration::from_secs(1));
        let counter = Arc::new(AtomicUsize::new(0));
        throttle.schedule(counting(&counter));
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        // Second run is queued behind the interval.
        assert!(throttle.schedule(counting(&counter)));
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
