use crate::lock;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Leading-edge debounce.
///
/// The first [`trigger`](Self::trigger) after a quiet period goes through
/// immediately; every further trigger within `window` of it is swallowed.
/// Nothing is ever deferred, suppressed triggers are simply dropped.
///
/// ```
/// use gelo_asyncutils::Debounce;
/// use std::time::Duration;
///
/// let debounce = Debounce::new(Duration::from_secs(15));
/// assert!(debounce.trigger());
/// assert!(!debounce.trigger());
/// ```
#[derive(Debug)]
pub struct Debounce {
    window: Duration,
    last: Mutex<Option<Instant>>,
}
impl Debounce {
    pub fn new(window: Duration) -> Self {
        Self { window, last: Mutex::new(None) }
    }

    /// Returns `true` if the caller should act on this trigger.
    pub fn trigger(&self) -> bool {
        let now = Instant::now();
        let mut last = lock(&self.last);
        match *last {
            Some(fired) if now < fired + self.window => false,
            _ => {
                *last = Some(now);
                true
            },
        }
    }
}
