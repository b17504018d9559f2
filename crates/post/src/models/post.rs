use serde::{Deserialize, Serialize};

use super::{Rating, Tags};

pub type PostId = u64;

/// A resolved post. Immutable once decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub tags: Tags,
    pub rating: Rating,
    pub score: i64,
    /// All zeroes for videos.
    pub md5: String,
    /// Original image, animation or video.
    pub download_url: String,
    /// Best still image for a thumbnail: the file itself, or the preview
    /// frame of a video.
    pub high_res_url: String,
}
