use exn::ResultExt;
use gelo_asyncutils::Throttle;
use gelo_post::{Post, PostId};
use gelo_queue::AdmissionQueue;
use gelo_storage::error::ErrorKind as StorageErrorKind;
use gelo_storage::{BackendHandle, json};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::settings::Settings;

/// Durable storage key of the id to post snapshot.
pub const CACHE_KEY: &str = "post-cache";

type Snapshot = HashMap<PostId, Post>;

struct Inner {
    queue: AdmissionQueue,
    storage: BackendHandle,
    settings: Settings,
    // Async mutex: a flush holds it across the write and the reload.
    posts: Mutex<Snapshot>,
    throttle: Throttle,
}

/// Fetch-through post cache. Clones share the same map.
#[derive(Clone)]
pub struct ItemCache {
    inner: Arc<Inner>,
}

impl ItemCache {
    /// An empty cache. See [`open`](Self::open) to start from the stored
    /// snapshot.
    pub fn new(queue: AdmissionQueue, storage: BackendHandle, settings: Settings) -> Self {
        Self {
            inner: Arc::new(Inner {
                queue,
                storage,
                throttle: Throttle::new(settings.flush_interval()),
                settings,
                posts: Mutex::new(Snapshot::new()),
            }),
        }
    }

    /// Create the cache and load the stored snapshot into memory.
    ///
    /// A snapshot that can't be decoded, or that holds more than `max_size`
    /// posts, is discarded rather than treated as an error.
    #[instrument(skip_all, fields(backend = storage.name()))]
    pub async fn open(queue: AdmissionQueue, storage: BackendHandle, settings: Settings) -> Result<Self> {
        let cache = Self::new(queue, storage, settings);
        let loaded = json::load::<Snapshot>(&*cache.inner.storage, CACHE_KEY).await;
        let snapshot = match loaded {
            Ok(Some(snapshot)) if snapshot.len() > cache.inner.settings.max_size => {
                tracing::warn!(
                    posts = snapshot.len(),
                    max_size = cache.inner.settings.max_size,
                    "Stored post cache exceeds the maximum size, starting empty"
                );
                return Ok(cache);
            },
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return Ok(cache),
            Err(err) if matches!(&*err, StorageErrorKind::Serialization { .. }) => {
                tracing::warn!(error = %err, "Stored post cache is unreadable, starting empty");
                return Ok(cache);
            },
            Err(err) => return Err(err).or_raise(|| ErrorKind::Storage),
        };
        tracing::info!(posts = snapshot.len(), "Loaded post cache");
        *cache.inner.posts.lock().await = snapshot;
        Ok(cache)
    }

    /// Metadata endpoint for a single post.
    pub fn url_for(&self, id: PostId) -> String {
        format!(
            "{}/index.php?page=dapi&s=post&q=index&json=1&id={id}",
            self.inner.settings.api_base.trim_end_matches('/')
        )
    }

    /// The cached post, without fetching on a miss.
    pub async fn get(&self, id: PostId) -> Option<Post> {
        self.inner.posts.lock().await.get(&id).cloned()
    }

    /// The cached post, or fetch, decode and cache it.
    #[instrument(skip(self))]
    pub async fn get_or_fetch(&self, id: PostId) -> Result<Post> {
        if let Some(post) = self.get(id).await {
            return Ok(post);
        }
        let response = self.inner.queue.enqueue(self.url_for(id)).await.or_raise(|| ErrorKind::Fetch(id))?;
        let post = gelo_post::extract(&response.body, id).or_raise(|| ErrorKind::Parse(id))?;
        self.insert(post.clone()).await;
        Ok(post)
    }

    async fn insert(&self, post: Post) {
        {
            let mut posts = self.inner.posts.lock().await;
            if !posts.contains_key(&post.id) && posts.len() >= self.inner.settings.max_size {
                tracing::info!(posts = posts.len(), "Post cache is full, flushing everything");
                posts.clear();
            }
            posts.insert(post.id, post);
        }
        self.schedule_flush();
    }

    pub async fn len(&self) -> usize {
        self.inner.posts.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn contains(&self, id: PostId) -> bool {
        self.inner.posts.lock().await.contains_key(&id)
    }

    /// Drop every cached post, in memory and (on the next flush) durably.
    pub async fn clear(&self) {
        self.inner.posts.lock().await.clear();
        self.schedule_flush();
    }

    /// Write the snapshot now instead of waiting for the throttle.
    pub async fn persist(&self) -> Result<()> {
        self.inner.flush().await
    }

    fn schedule_flush(&self) {
        let inner = Arc::clone(&self.inner);
        self.inner.throttle.schedule(async move {
            if let Err(err) = inner.flush().await {
                tracing::warn!(error = %err, "Failed to flush post cache");
            }
        });
    }
}

impl Inner {
    #[instrument(skip_all, fields(backend = self.storage.name()))]
    async fn flush(&self) -> Result<()> {
        let mut posts = self.posts.lock().await;
        json::save(&*self.storage, CACHE_KEY, &*posts).await.or_raise(|| ErrorKind::Storage)?;
        // Pick up anything another writer stored. Entries already in memory
        // take precedence, and a merge that would overflow is not applied.
        if let Some(mut stored) = json::load::<Snapshot>(&*self.storage, CACHE_KEY).await.or_raise(|| ErrorKind::Storage)? {
            stored.extend(posts.iter().map(|(id, post)| (*id, post.clone())));
            if stored.len() <= self.settings.max_size {
                *posts = stored;
            }
        }
        tracing::debug!(posts = posts.len(), "Flushed post cache");
        Ok(())
    }
}
