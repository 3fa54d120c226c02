//! Error types for wfs-capabilities
//!
//! This module defines all error types used throughout the library.
//! Failures are split by how the version negotiator reacts to them: transport
//! and document failures are recoverable by falling back to a smaller
//! candidate, everything else is terminal.

use thiserror::Error;

use crate::versions::ProtocolVersion;

/// Result type alias using the crate Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for capabilities operations
#[derive(Error, Debug)]
pub enum Error {
    /// Network, HTTP status or timeout failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Body could not be parsed, or had an unexpected root element
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// Server responded but declared no valid protocol version
    #[error("version detection error: {0}")]
    VersionDetection(String),

    /// Server's lowest version is greater than the candidate offered
    #[error(
        "version negotiation has failed: lowest version supported by server is {minimum} \
         but candidate version was {candidate}"
    )]
    Negotiation {
        /// Version declared by the server
        minimum: ProtocolVersion,
        /// Version the client was requesting
        candidate: ProtocolVersion,
    },

    /// Every candidate was tried without agreement
    #[error("version negotiation has failed after trying {}", format_tried(.tried))]
    NegotiationExhausted {
        /// Candidates requested, in order
        tried: Vec<ProtocolVersion>,
    },

    /// Pinned version is not known to the client
    #[error("version {0} is not supported by the client")]
    UnsupportedVersion(String),

    /// Invalid registry, schema table or client options
    #[error("configuration error: {0}")]
    Config(String),

    /// URL parsing error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// JSON conversion error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the negotiator may fall back to a smaller candidate after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::MalformedDocument(_))
    }
}

impl From<roxmltree::Error> for Error {
    fn from(err: roxmltree::Error) -> Self {
        Error::MalformedDocument(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

fn format_tried(tried: &[ProtocolVersion]) -> String {
    if tried.is_empty() {
        return "no candidate".to_string();
    }
    tried
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
