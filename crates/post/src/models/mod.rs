mod post;
mod rating;
mod tags;

pub use self::post::{Post, PostId};
pub use self::rating::Rating;
pub use self::tags::{Category, Tags};
