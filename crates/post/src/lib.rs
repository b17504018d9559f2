mod decode;
pub mod error;
pub mod models;

pub use crate::decode::{extract, high_res_url};
pub use crate::models::{Category, Post, PostId, Rating, Tags};
