//! Decoding of the post API response body.
//!
//! The endpoint answers `{"post": [{"file_url", "md5", "tags", "score",
//! "rating", ...}]}`. Every field is optional on the wire, so the raw shape
//! is decoded leniently first and validated field by field afterwards.

use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::models::{Post, PostId, Rating, Tags};

const VIDEO_HOST_PREFIX: &str = "https://video";

#[derive(Deserialize)]
struct RawResponse {
    #[serde(default)]
    post: Vec<RawPost>,
}

#[derive(Deserialize)]
struct RawPost {
    file_url: Option<String>,
    md5: Option<String>,
    tags: Option<String>,
    score: Option<Value>,
    rating: Option<String>,
}

/// Decode the API response body for the post `id`.
#[instrument(skip(body), fields(body_size = body.as_ref().len()))]
pub fn extract(body: impl AsRef<[u8]>, id: PostId) -> Result<Post> {
    let response: RawResponse =
        serde_json::from_slice(body.as_ref()).map_err(|e| ErrorKind::MalformedBody(e.to_string()))?;
    let Some(raw) = response.post.into_iter().next() else {
        exn::bail!(ErrorKind::MissingPost);
    };

    let download_url = raw.file_url.filter(|url| !url.is_empty()).ok_or(ErrorKind::MissingField("file_url"))?;
    let tags = raw.tags.ok_or(ErrorKind::MissingField("tags"))?;
    let score = parse_score(raw.score.ok_or(ErrorKind::MissingField("score"))?)?;
    let rating: Rating = raw.rating.ok_or(ErrorKind::MissingField("rating"))?.parse()?;

    Ok(Post {
        id,
        tags: Tags {
            // The endpoint does not report tag categories.
            general: split_tags(&tags),
            ..Tags::default()
        },
        rating,
        score,
        md5: raw.md5.unwrap_or_default(),
        high_res_url: high_res_url(&download_url),
        download_url,
    })
}

/// Videos get the `.jpg` preview frame next to them; everything else is its
/// own high resolution thumbnail.
pub fn high_res_url(file_url: &str) -> String {
    if file_url.starts_with(VIDEO_HOST_PREFIX)
        && let Some(dot) = file_url.rfind('.')
        && !file_url[dot + 1..].contains('/')
    {
        return format!("{}.jpg", &file_url[..dot]);
    }
    file_url.to_string()
}

fn split_tags(tags: &str) -> Vec<String> {
    tags.split(' ').filter(|t| !t.is_empty()).map(|t| t.replace('_', " ")).collect()
}

fn parse_score(value: Value) -> Result<i64> {
    let parsed = match &value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(parsed.ok_or_else(|| ErrorKind::ParseError {
        field: "score",
        value: value.to_string(),
    })?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const BODY: &str = r#"{
        "@attributes": {"limit": 100, "offset": 0, "count": 1},
        "post": [{
            "id": 42,
            "file_url": "https://img3.example.com/images/ab/cd/abcd.png",
            "md5": "abcd",
            "tags": "red_hair blue_eyes  smile",
            "score": 17,
            "rating": "questionable"
        }]
    }"#;

    #[test]
    fn decodes_a_post() {
        let post = extract(BODY, 42).unwrap();
        assert_eq!(post.id, 42);
        assert_eq!(post.tags.general, vec!["red hair", "blue eyes", "smile"]);
        assert!(post.tags.artist.is_empty());
        assert_eq!(post.rating, Rating::Questionable);
        assert_eq!(post.score, 17);
        assert_eq!(post.md5, "abcd");
        assert_eq!(post.download_url, "https://img3.example.com/images/ab/cd/abcd.png");
        assert_eq!(post.high_res_url, post.download_url);
    }

    #[test]
    fn score_may_be_a_string() {
        let body = r#"{"post":[{"file_url":"https://x/a.jpg","tags":"a","score":"-3","rating":"g"}]}"#;
        let post = extract(body, 1).unwrap();
        assert_eq!(post.score, -3);
        assert_eq!(post.md5, "");
    }

    #[rstest]
    #[case(r#"{"post":[{"tags":"a","score":1,"rating":"g"}]}"#, "file_url")]
    #[case(r#"{"post":[{"file_url":"","tags":"a","score":1,"rating":"g"}]}"#, "file_url")]
    #[case(r#"{"post":[{"file_url":"https://x/a.jpg","score":1,"rating":"g"}]}"#, "tags")]
    #[case(r#"{"post":[{"file_url":"https://x/a.jpg","tags":"a","rating":"g"}]}"#, "score")]
    #[case(r#"{"post":[{"file_url":"https://x/a.jpg","tags":"a","score":1}]}"#, "rating")]
    fn missing_fields(#[case] body: &str, #[case] field: &'static str) {
        let err = extract(body, 1).unwrap_err();
        assert_eq!(*err, ErrorKind::MissingField(field));
    }

    #[rstest]
    #[case("not json")]
    #[case("[]")]
    fn malformed_body(#[case] body: &str) {
        let err = extract(body, 1).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedBody(_)));
    }

    #[test]
    fn empty_post_list() {
        let err = extract(r#"{"@attributes":{"count":0}}"#, 1).unwrap_err();
        assert_eq!(*err, ErrorKind::MissingPost);
    }

    #[rstest]
    #[case("https://video-cdn3.example.com/images/ab/cd/abcd.mp4", "https://video-cdn3.example.com/images/ab/cd/abcd.jpg")]
    #[case("https://video.example.com/a.b/clip.webm", "https://video.example.com/a.b/clip.jpg")]
    #[case("https://img3.example.com/images/ab/cd/abcd.png", "https://img3.example.com/images/ab/cd/abcd.png")]
    fn derives_high_res_url(#[case] file_url: &str, #[case] expected: &str) {
        assert_eq!(high_res_url(file_url), expected);
    }
}
