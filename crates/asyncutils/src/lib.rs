//! Timing primitives shared by the fetch queue and the item cache.
//!
//! Both primitives read their clock from [`tokio::time::Instant`], so tests
//! can drive them deterministically with a paused runtime
//! (`#[tokio::test(start_paused = true)]`).

mod debounce;
mod throttle;

pub use crate::debounce::Debounce;
pub use crate::throttle::Throttle;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a [`Mutex`], recovering the guard if a previous holder panicked.
///
/// None of the state guarded in this workspace can be left half-updated by a
/// panic (every critical section is a handful of field assignments), so a
/// poisoned lock is still safe to use.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
