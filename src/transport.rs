//! HTTP transport
//!
//! The client only needs one operation from the network: GET a URL with a set
//! of query parameters and hand back the body. [`Transport`] is that seam;
//! [`HttpTransport`] implements it with `reqwest`.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use tracing::trace;
use url::Url;

use crate::error::{Error, Result};
use crate::options::ClientOptions;

/// Query parameters in insertion order; later inserts replace earlier values
pub type QueryParams = IndexMap<String, String>;

/// Fetches raw response bodies
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// GET `url` with `query` appended, returning the body
    async fn fetch(&self, url: &Url, query: &QueryParams) -> Result<Vec<u8>>;
}

/// Append query parameters to a URL, keeping any already present
pub fn request_url(url: &Url, query: &QueryParams) -> Url {
    let mut url = url.clone();
    if !query.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    url
}

/// `reqwest` based transport
///
/// Connection options are hints: `max_sockets` bounds the idle connections
/// kept per host and `keep_alive` enables TCP keep-alive on pooled
/// connections. `keep_alive = false` disables pooling altogether.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

/// TCP keep-alive interval used when `keep_alive` is enabled
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(60);

impl HttpTransport {
    /// Build a transport from client options
    pub fn new(options: &ClientOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder();

        if let Some(ref user_agent) = options.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        if let Some(timeout) = options.timeout_duration() {
            builder = builder.timeout(timeout);
        }
        match options.keep_alive {
            Some(true) => builder = builder.tcp_keepalive(KEEP_ALIVE_INTERVAL),
            Some(false) => builder = builder.pool_max_idle_per_host(0),
            None => {}
        }
        if let Some(max_sockets) = options.max_sockets {
            if options.keep_alive != Some(false) {
                builder = builder.pool_max_idle_per_host(max_sockets);
            }
        }

        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &Url, query: &QueryParams) -> Result<Vec<u8>> {
        let url = request_url(url, query);
        trace!(%url, "sending request");

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport(format!(
                "Server responded with status {} for {}",
                status, url
            )));
        }

        let body = response.bytes().await?;
        trace!(%url, bytes = body.len(), "received response");
        Ok(body.to_vec())
    }
}
