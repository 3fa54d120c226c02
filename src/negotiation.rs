//! Protocol version negotiation
//!
//! The client offers its highest version and reacts to what the server
//! declares in the `version` attribute of the capabilities root:
//!
//! - same version: settled;
//! - a higher version: the server cannot go low enough, negotiation fails;
//! - a lower version the client knows: settled on it;
//! - a lower unknown version: retry with the greatest known version below it.
//!
//! When a response cannot be read at all (transport failure, broken markup,
//! wrong root element) the negotiator enters recovery mode and retries with
//! the next smaller candidate. Every retry strictly lowers the candidate
//! within a finite [`VersionSet`], so at most `versions.len()` requests are
//! made.

use async_trait::async_trait;
use tracing::debug;

use crate::catalog::CAPABILITIES_ROOT;
use crate::documents::XmlDocument;
use crate::error::{Error, Result};
use crate::versions::{ProtocolVersion, VersionSet};

/// Fetches a capabilities document for a requested version
#[async_trait]
pub trait CapabilitiesFetcher: Send + Sync {
    /// Issue `GetCapabilities` with `version` and return the raw body
    async fn fetch_capabilities(&self, version: &ProtocolVersion) -> Result<Vec<u8>>;
}

/// Outcome of a successful negotiation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiated {
    /// The agreed version
    pub version: ProtocolVersion,
    /// Candidates requested, in order
    pub tried: Vec<ProtocolVersion>,
}

/// Drives negotiation over a set of supported versions
#[derive(Debug, Clone, Copy)]
pub struct Negotiator<'v> {
    versions: &'v VersionSet,
}

impl<'v> Negotiator<'v> {
    /// Create a negotiator for the supported versions
    pub fn new(versions: &'v VersionSet) -> Self {
        Self { versions }
    }

    /// Negotiate starting from the highest supported version
    pub async fn negotiate(&self, fetcher: &dyn CapabilitiesFetcher) -> Result<Negotiated> {
        self.negotiate_from(self.versions.highest().clone(), fetcher)
            .await
    }

    /// Negotiate starting from `candidate`
    pub async fn negotiate_from(
        &self,
        mut candidate: ProtocolVersion,
        fetcher: &dyn CapabilitiesFetcher,
    ) -> Result<Negotiated> {
        let mut tried: Vec<ProtocolVersion> = Vec::with_capacity(self.versions.len());

        loop {
            debug_assert!(
                tried.last().map_or(true, |previous| candidate < *previous),
                "candidate {} did not decrease",
                candidate
            );
            debug!(%candidate, "client is trying with version");
            tried.push(candidate.clone());

            let next = match self.probe(fetcher, &candidate).await {
                Ok(declared) => {
                    debug!(%declared, "server responded with version");
                    if declared == candidate {
                        debug!("client and server versions are matching");
                        return Ok(Negotiated {
                            version: candidate,
                            tried,
                        });
                    }
                    if declared > candidate {
                        debug!(
                            %candidate,
                            minimum = %declared,
                            "candidate is smaller than the lowest version supported by server"
                        );
                        return Err(Error::Negotiation {
                            minimum: declared,
                            candidate,
                        });
                    }
                    if let Some(known) = self.versions.get(&declared) {
                        debug!(%declared, "version returned by server is supported by client");
                        return Ok(Negotiated {
                            version: known.clone(),
                            tried,
                        });
                    }
                    self.versions.next_below(&declared)
                }
                Err(err) if err.is_recoverable() => {
                    debug!(error = %err, "entering recovery mode");
                    self.versions.next_below(&candidate)
                }
                Err(err) => return Err(err),
            };

            match next {
                Some(version) => {
                    debug!(next = %version, "nearest smaller version supported by client");
                    candidate = version.clone();
                }
                None => {
                    debug!("version negotiation failed");
                    return Err(Error::NegotiationExhausted { tried });
                }
            }
        }
    }

    /// Fetch capabilities for `candidate` and read the declared version
    async fn probe(
        &self,
        fetcher: &dyn CapabilitiesFetcher,
        candidate: &ProtocolVersion,
    ) -> Result<ProtocolVersion> {
        let body = fetcher.fetch_capabilities(candidate).await?;
        declared_version(&body)
    }
}

/// Read the version declared by a capabilities body
///
/// Unreadable bodies and foreign root elements are [`Error::MalformedDocument`];
/// a capabilities root without a valid version is [`Error::VersionDetection`].
pub fn declared_version(body: &[u8]) -> Result<ProtocolVersion> {
    let doc = XmlDocument::from_bytes(body)?;
    if doc.root_name() != CAPABILITIES_ROOT {
        return Err(Error::MalformedDocument(format!(
            "Expected {} root element, got {}",
            CAPABILITIES_ROOT,
            doc.root_name()
        )));
    }

    let attr = doc.root().attribute("version");
    attr.and_then(ProtocolVersion::parse).ok_or_else(|| {
        debug!("unable to read version in capabilities");
        Error::VersionDetection(match attr {
            Some(value) => format!("Invalid version in capabilities: '{}'", value),
            None => "Unable to read version in capabilities".to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Answers every request with a fixed declared version
    struct FixedServer {
        declared: &'static str,
        requests: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CapabilitiesFetcher for FixedServer {
        async fn fetch_capabilities(&self, version: &ProtocolVersion) -> Result<Vec<u8>> {
            self.requests.lock().unwrap().push(version.to_string());
            Ok(format!(r#"<WFS_Capabilities version="{}"/>"#, self.declared).into_bytes())
        }
    }

    fn versions() -> VersionSet {
        VersionSet::new(vec![
            ProtocolVersion::new(2, 0, 0),
            ProtocolVersion::new(1, 1, 0),
            ProtocolVersion::new(1, 0, 0),
        ])
        .unwrap()
    }

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[test]
    fn test_declared_version() {
        assert_eq!(
            declared_version(br#"<WFS_Capabilities version="1.1.0"/>"#).unwrap(),
            ProtocolVersion::new(1, 1, 0)
        );
        assert!(matches!(
            declared_version(br#"<WFS_Capabilities/>"#),
            Err(Error::VersionDetection(_))
        ));
        assert!(matches!(
            declared_version(br#"<WFS_Capabilities version="1.1"/>"#),
            Err(Error::VersionDetection(_))
        ));
        assert!(matches!(
            declared_version(br#"<ows:ExceptionReport xmlns:ows="urn:ows" version="1.1.0"/>"#),
            Err(Error::MalformedDocument(_))
        ));
        assert!(matches!(
            declared_version(b"not xml"),
            Err(Error::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_lower_known_version_settles_in_one_request() {
        let versions = versions();
        let server = FixedServer {
            declared: "1.1.0",
            requests: Mutex::new(Vec::new()),
        };
        let negotiated = block_on(Negotiator::new(&versions).negotiate(&server)).unwrap();
        assert_eq!(negotiated.version, ProtocolVersion::new(1, 1, 0));
        assert_eq!(*server.requests.lock().unwrap(), vec!["2.0.0"]);
    }

    #[test]
    fn test_higher_declared_version_is_terminal() {
        let versions = versions();
        let server = FixedServer {
            declared: "3.0.0",
            requests: Mutex::new(Vec::new()),
        };
        let err = block_on(Negotiator::new(&versions).negotiate(&server)).unwrap_err();
        assert!(matches!(
            err,
            Error::Negotiation { ref minimum, ref candidate }
                if minimum.to_string() == "3.0.0" && candidate.to_string() == "2.0.0"
        ));
        assert_eq!(server.requests.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_settled_version_is_the_registry_entry() {
        let versions = versions();
        for declared in ["2.0.0+srv", "1.1.0+srv"] {
            let server = FixedServer {
                declared,
                requests: Mutex::new(Vec::new()),
            };
            let negotiated = block_on(Negotiator::new(&versions).negotiate(&server)).unwrap();
            assert!(negotiated.version.build.is_none());
            assert_eq!(negotiated.version.to_string(), declared.trim_end_matches("+srv"));
        }
    }

    #[test]
    fn test_declared_below_lowest_is_exhausted() {
        let versions = versions();
        let server = FixedServer {
            declared: "0.9.0",
            requests: Mutex::new(Vec::new()),
        };
        let err = block_on(Negotiator::new(&versions).negotiate(&server)).unwrap_err();
        assert!(matches!(err, Error::NegotiationExhausted { ref tried } if tried.len() == 1));
    }
}
