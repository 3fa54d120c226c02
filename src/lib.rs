//! # wfs-capabilities
//!
//! A client for OGC Web Feature Service (WFS) capabilities documents.
//!
//! ## Features
//!
//! - Protocol version negotiation (WFS 2.0.0, 1.1.0 and 1.0.0)
//! - Declarative, schema-driven decoding of namespace-qualified XML
//! - One normalized result type for every protocol version
//! - Pluggable transport, `reqwest` by default
//!
//! ## Example
//!
//! ```rust,ignore
//! use wfs_capabilities::{wfs, ClientOptions};
//!
//! let client = wfs("https://example.com/geoserver/wfs", ClientOptions::new())?;
//!
//! // Negotiates on first use, then fetches and decodes
//! let capabilities = client.capabilities().await?;
//! for feature_type in client.feature_types().await? {
//!     println!("{:?}", feature_type.name);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod versions;

// XML documents and selectors
pub mod namespaces;
pub mod documents;
pub mod xpath;

// Declarative mapping
pub mod schema;
pub mod mapper;
pub mod catalog;
pub mod capabilities;

// Protocol
pub mod options;
pub mod transport;
pub mod negotiation;
pub mod client;

// Re-exports for convenience
pub use capabilities::{BoundingBox, CapabilitiesResult, FeatureTypeInfo, ServiceInfo};
pub use catalog::VersionRegistry;
pub use client::Client;
pub use error::{Error, Result};
pub use options::ClientOptions;
pub use versions::ProtocolVersion;

/// Version of the wfs-capabilities library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Create an HTTP client for a WFS endpoint
pub fn wfs(url: &str, options: ClientOptions) -> Result<Client> {
    Client::new(url, options)
}
