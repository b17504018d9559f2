use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;

use crate::error::{ErrorKind, Result};

/// A completed HTTP exchange, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub body: Vec<u8>,
}
impl Response {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == StatusCode::TOO_MANY_REQUESTS
    }
}

/// Issues a single GET. Implementations never retry; that is the queue's job.
///
/// Any response the server sends back, including 4xx/5xx, is `Ok`. Only a
/// request that produced no response at all is an
/// [`ErrorKind::Transport`] error.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<Response>;
}

pub type FetcherHandle = Arc<dyn Fetcher>;

/// [`Fetcher`] over a shared `reqwest` client.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}
impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ErrorKind::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<Response> {
        let response = self.client.get(url).send().await.map_err(|e| ErrorKind::Transport(e.to_string()))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| ErrorKind::Transport(e.to_string()))?;
        tracing::trace!(url = %url, status = status.as_u16(), bytes = body.len(), "Received response");
        Ok(Response { status, body: body.to_vec() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(200, true, false)]
    #[case(204, true, false)]
    #[case(429, false, true)]
    #[case(500, false, false)]
    #[case(304, false, false)]
    fn classifies_status(#[case] status: u16, #[case] success: bool, #[case] rate_limited: bool) {
        let response = Response {
            status: StatusCode::from_u16(status).unwrap(),
            body: Vec::new(),
        };
        assert_eq!(response.is_success(), success);
        assert_eq!(response.is_rate_limited(), rate_limited);
    }
}
