//! Capabilities client
//!
//! [`Client`] ties the pieces together: it owns the transport, negotiates the
//! protocol version on first use, fetches the final capabilities document and
//! decodes it with the schema of the settled version.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use url::Url;

use crate::capabilities::{CapabilitiesResult, FeatureTypeInfo};
use crate::catalog::{VersionRegistry, CAPABILITIES_ROOT, SERVICE_ID};
use crate::documents::XmlDocument;
use crate::error::{Error, Result};
use crate::negotiation::{CapabilitiesFetcher, Negotiator};
use crate::options::ClientOptions;
use crate::transport::{HttpTransport, QueryParams, Transport};
use crate::versions::ProtocolVersion;

/// WFS capabilities client
///
/// The settled version is cached for the lifetime of the client. Concurrent
/// first calls share a single negotiation; a failed negotiation is not cached.
pub struct Client {
    url: Url,
    options: ClientOptions,
    registry: Arc<VersionRegistry>,
    transport: Arc<dyn Transport>,
    version: OnceCell<ProtocolVersion>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.url.as_str())
            .field("options", &self.options)
            .field("version", &self.version.get())
            .finish()
    }
}

impl Client {
    /// Create a client over HTTP with the standard version registry
    pub fn new(url: &str, options: ClientOptions) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&options)?);
        Self::with_transport(url, options, transport)
    }

    /// Create a client over a custom transport with the standard version registry
    pub fn with_transport(
        url: &str,
        options: ClientOptions,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        Self::from_parts(url, options, Arc::new(VersionRegistry::standard()?), transport)
    }

    /// Create a client from all of its parts
    ///
    /// A pinned `options.version` must be in the registry; it is checked here,
    /// before any request is made.
    pub fn from_parts(
        url: &str,
        options: ClientOptions,
        registry: Arc<VersionRegistry>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        if url.trim().is_empty() {
            return Err(Error::Config("URL is required".to_string()));
        }
        let url = Url::parse(url)?;
        options.validate()?;

        let pinned = options
            .version
            .as_deref()
            .map(|v| registry.resolve(v))
            .transpose()?;

        Ok(Self {
            url,
            options,
            registry,
            transport,
            version: OnceCell::new_with(pinned),
        })
    }

    /// Service endpoint
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Options the client was built with
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Supported versions and their schemas
    pub fn registry(&self) -> &VersionRegistry {
        &self.registry
    }

    /// The settled version, if negotiation has already happened or the version was pinned
    pub fn negotiated_version(&self) -> Option<&ProtocolVersion> {
        self.version.get()
    }

    /// The settled version, negotiating on first use
    pub async fn version(&self) -> Result<ProtocolVersion> {
        let version = self
            .version
            .get_or_try_init(|| async {
                let negotiated = Negotiator::new(self.registry.versions()).negotiate(self).await?;
                debug!(
                    version = %negotiated.version,
                    requests = negotiated.tried.len(),
                    "version negotiated"
                );
                Ok::<_, Error>(negotiated.version)
            })
            .await?;
        Ok(version.clone())
    }

    /// Fetch and decode the capabilities document
    pub async fn capabilities(&self) -> Result<CapabilitiesResult> {
        let version = self.version().await?;
        let schema = self
            .registry
            .get(&version)
            .ok_or_else(|| Error::UnsupportedVersion(version.to_string()))?;

        let body = self.fetch_capabilities(&version).await?;
        let doc = XmlDocument::from_bytes(&body)?;
        if doc.root_name() != CAPABILITIES_ROOT {
            return Err(Error::MalformedDocument(format!(
                "Expected {} root element, got {}",
                CAPABILITIES_ROOT,
                doc.root_name()
            )));
        }
        if let Some(declared) = doc.root().attribute("version") {
            if ProtocolVersion::parse(declared).as_ref() != Some(&version) {
                warn!(%version, declared, "server answered with a different version than negotiated");
            }
        }

        schema.decode(doc.root())
    }

    /// Feature types of the capabilities document
    pub async fn feature_types(&self) -> Result<Vec<FeatureTypeInfo>> {
        Ok(self.capabilities().await?.feature_types)
    }

    /// Issue a request with the default parameters merged in
    ///
    /// `service` comes first, then the configured defaults, then `query`;
    /// later keys override earlier ones.
    pub async fn request(&self, query: &[(&str, &str)]) -> Result<Vec<u8>> {
        let mut params = QueryParams::new();
        params.insert("service".to_string(), SERVICE_ID.to_string());
        for (key, value) in &self.options.query_string_to_append {
            params.insert(key.clone(), value.clone());
        }
        for (key, value) in query {
            params.insert((*key).to_string(), (*value).to_string());
        }

        let fetch = self.transport.fetch(&self.url, &params);
        match self.options.timeout_duration() {
            Some(limit) => tokio::time::timeout(limit, fetch).await.map_err(|_| {
                Error::Transport(format!("Request timed out after {:?}", limit))
            })?,
            None => fetch.await,
        }
    }
}

#[async_trait]
impl CapabilitiesFetcher for Client {
    async fn fetch_capabilities(&self, version: &ProtocolVersion) -> Result<Vec<u8>> {
        let version = version.to_string();
        self.request(&[("request", "GetCapabilities"), ("version", &version)])
            .await
    }
}
