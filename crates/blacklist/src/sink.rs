use gelo_post::PostId;
use std::sync::Arc;

/// Receives the blacklist decision for each post.
///
/// Called once per post per [`apply`](crate::Coordinator::apply) and again
/// for every post a toggle affects. `blacklisted == false` means the post
/// should be shown.
pub trait VisibilitySink: Send + Sync {
    fn update(&self, id: PostId, blacklisted: bool);
}

impl<F> VisibilitySink for F
where
    F: Fn(PostId, bool) + Send + Sync,
{
    fn update(&self, id: PostId, blacklisted: bool) {
        self(id, blacklisted)
    }
}

pub type SinkHandle = Arc<dyn VisibilitySink>;
