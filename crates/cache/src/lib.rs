//! Post metadata cache.
//!
//! Resolved posts live in an in-memory map that is the only thing reads ever
//! look at. A miss goes through the [`AdmissionQueue`](gelo_queue::AdmissionQueue)
//! and the decoded post is inserted. The map is snapshotted to durable
//! storage under [`CACHE_KEY`], at most once per flush interval, and reloaded
//! right after each write.
//!
//! # Eviction
//! There is none, short of a full flush: once the map holds `max_size` posts,
//! inserting another one clears everything first.

mod cache;
pub mod error;
mod settings;

pub use crate::cache::{CACHE_KEY, ItemCache};
pub use crate::settings::Settings;
