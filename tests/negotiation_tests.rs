//! Version negotiation tests
//!
//! A scripted server answers each GetCapabilities request; every requested
//! version is recorded so the tests can check how many requests were made
//! and in which order.

use std::sync::Mutex;

use async_trait::async_trait;
use proptest::prelude::*;
use wfs_capabilities::negotiation::{CapabilitiesFetcher, Negotiator};
use wfs_capabilities::versions::{ProtocolVersion, VersionSet};
use wfs_capabilities::{Error, Result};

type Responder = Box<dyn Fn(usize, &ProtocolVersion) -> Result<Vec<u8>> + Send + Sync>;

struct ScriptedServer {
    respond: Responder,
    requests: Mutex<Vec<ProtocolVersion>>,
}

impl ScriptedServer {
    fn new(respond: impl Fn(usize, &ProtocolVersion) -> Result<Vec<u8>> + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|v| v.to_string())
            .collect()
    }
}

#[async_trait]
impl CapabilitiesFetcher for ScriptedServer {
    async fn fetch_capabilities(&self, version: &ProtocolVersion) -> Result<Vec<u8>> {
        let index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(version.clone());
            requests.len() - 1
        };
        (self.respond)(index, version)
    }
}

fn capabilities(version: &str) -> Result<Vec<u8>> {
    Ok(format!(
        r#"<wfs:WFS_Capabilities xmlns:wfs="http://www.opengis.net/wfs/2.0" version="{}"/>"#,
        version
    )
    .into_bytes())
}

fn standard() -> VersionSet {
    VersionSet::new(vec![
        ProtocolVersion::new(2, 0, 0),
        ProtocolVersion::new(1, 1, 0),
        ProtocolVersion::new(1, 0, 0),
    ])
    .unwrap()
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_matching_server_settles_on_top_candidate() {
    let versions = standard();
    let server = ScriptedServer::new(|_, v| capabilities(&v.to_string()));

    let negotiated = Negotiator::new(&versions).negotiate(&server).await.unwrap();

    assert_eq!(negotiated.version.to_string(), "2.0.0");
    assert_eq!(server.requests(), vec!["2.0.0"]);
}

#[tokio::test]
async fn test_known_lower_version_settles_without_retry() {
    let versions = standard();
    let server = ScriptedServer::new(|_, _| capabilities("1.0.0"));

    let negotiated = Negotiator::new(&versions).negotiate(&server).await.unwrap();

    assert_eq!(negotiated.version.to_string(), "1.0.0");
    assert_eq!(server.requests(), vec!["2.0.0"]);
}

#[tokio::test]
async fn test_unknown_lower_version_retries_with_nearest_smaller() {
    let versions = standard();
    // Declares 1.5.0 to anything above it, then behaves
    let server = ScriptedServer::new(|_, v| {
        if *v > ProtocolVersion::new(1, 5, 0) {
            capabilities("1.5.0")
        } else {
            capabilities(&v.to_string())
        }
    });

    let negotiated = Negotiator::new(&versions).negotiate(&server).await.unwrap();

    assert_eq!(negotiated.version.to_string(), "1.1.0");
    assert_eq!(server.requests(), vec!["2.0.0", "1.1.0"]);
    assert_eq!(negotiated.tried.len(), 2);
}

#[tokio::test]
async fn test_retry_compares_against_fresh_declaration() {
    let versions = standard();
    // First answer points at an unknown 1.5.0, second at the known 1.0.0
    let server = ScriptedServer::new(|i, _| match i {
        0 => capabilities("1.5.0"),
        _ => capabilities("1.0.0"),
    });

    let negotiated = Negotiator::new(&versions).negotiate(&server).await.unwrap();

    assert_eq!(negotiated.version.to_string(), "1.0.0");
    assert_eq!(server.requests(), vec!["2.0.0", "1.1.0"]);
}

#[tokio::test]
async fn test_missing_version_fails_without_retry() {
    let versions = standard();
    let server = ScriptedServer::new(|_, _| Ok(b"<WFS_Capabilities/>".to_vec()));

    let err = Negotiator::new(&versions).negotiate(&server).await.unwrap_err();

    assert!(matches!(err, Error::VersionDetection(_)));
    assert_eq!(server.requests(), vec!["2.0.0"]);
}

#[tokio::test]
async fn test_invalid_version_fails_without_retry() {
    let versions = standard();
    let server = ScriptedServer::new(|_, _| capabilities("two"));

    let err = Negotiator::new(&versions).negotiate(&server).await.unwrap_err();

    assert!(matches!(err, Error::VersionDetection(_)));
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_failing_server_tries_every_version_once() {
    let versions = standard();
    let server = ScriptedServer::new(|_, _| Err(Error::Transport("connection refused".into())));

    let err = Negotiator::new(&versions).negotiate(&server).await.unwrap_err();

    match err {
        Error::NegotiationExhausted { tried } => {
            let tried: Vec<String> = tried.iter().map(|v| v.to_string()).collect();
            assert_eq!(tried, vec!["2.0.0", "1.1.0", "1.0.0"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(server.requests(), vec!["2.0.0", "1.1.0", "1.0.0"]);
}

#[tokio::test]
async fn test_recovery_mode_after_exception_report() {
    let versions = standard();
    let report = include_bytes!("fixtures/exception_report.xml").to_vec();
    let server = ScriptedServer::new(move |_, v| {
        if *v == ProtocolVersion::new(2, 0, 0) {
            Ok(report.clone())
        } else {
            capabilities(&v.to_string())
        }
    });

    let negotiated = Negotiator::new(&versions).negotiate(&server).await.unwrap();

    assert_eq!(negotiated.version.to_string(), "1.1.0");
    assert_eq!(server.requests(), vec!["2.0.0", "1.1.0"]);
}

#[tokio::test]
async fn test_recovery_mode_after_broken_markup() {
    let versions = standard();
    let server = ScriptedServer::new(|i, v| match i {
        0 => Ok(b"<WFS_Capabilities version=\"2.0.0\"".to_vec()),
        _ => capabilities(&v.to_string()),
    });

    let negotiated = Negotiator::new(&versions).negotiate(&server).await.unwrap();
    assert_eq!(negotiated.version.to_string(), "1.1.0");
}

#[tokio::test]
async fn test_higher_declared_version_is_hard_failure() {
    let versions = standard();
    let server = ScriptedServer::new(|_, _| capabilities("2.1.0"));

    let err = Negotiator::new(&versions).negotiate(&server).await.unwrap_err();

    assert!(matches!(err, Error::Negotiation { .. }));
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_terminal_errors_from_fetcher_propagate() {
    let versions = standard();
    let server = ScriptedServer::new(|_, _| Err(Error::Config("bad".into())));

    let err = Negotiator::new(&versions).negotiate(&server).await.unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert_eq!(server.requests().len(), 1);
}

// ============================================================================
// Properties over arbitrary registries
// ============================================================================

#[derive(Debug, Clone)]
enum Behavior {
    Echo,
    Declare(ProtocolVersion),
    Fail,
    Garbage,
    NoVersion,
}

fn version_strategy() -> impl Strategy<Value = ProtocolVersion> {
    (0u64..4, 0u64..4, 0u64..4).prop_map(|(a, b, c)| ProtocolVersion::new(a, b, c))
}

fn registry_strategy() -> impl Strategy<Value = VersionSet> {
    prop::collection::vec(version_strategy(), 1..8)
        .prop_map(|versions| VersionSet::from_unordered(versions).unwrap())
}

fn behavior_strategy() -> impl Strategy<Value = Behavior> {
    prop_oneof![
        Just(Behavior::Echo),
        version_strategy().prop_map(Behavior::Declare),
        Just(Behavior::Fail),
        Just(Behavior::Garbage),
        Just(Behavior::NoVersion),
    ]
}

fn behaving_server(script: Vec<Behavior>) -> ScriptedServer {
    ScriptedServer::new(move |i, v| match &script[i % script.len()] {
        Behavior::Echo => capabilities(&v.to_string()),
        Behavior::Declare(d) => capabilities(&d.to_string()),
        Behavior::Fail => Err(Error::Transport("timed out".into())),
        Behavior::Garbage => Ok(b"<html><body>502</body></html>".to_vec()),
        Behavior::NoVersion => Ok(b"<WFS_Capabilities/>".to_vec()),
    })
}

proptest! {
    #[test]
    fn prop_echo_server_settles_on_highest(versions in registry_strategy()) {
        let server = behaving_server(vec![Behavior::Echo]);
        let negotiated = block_on(Negotiator::new(&versions).negotiate(&server)).unwrap();
        prop_assert_eq!(&negotiated.version, versions.highest());
        prop_assert_eq!(server.requests().len(), 1);
    }

    #[test]
    fn prop_known_lower_declaration_settles_in_one_request(
        versions in registry_strategy(),
        pick in any::<prop::sample::Index>(),
    ) {
        let all: Vec<ProtocolVersion> = versions.iter().cloned().collect();
        let declared = pick.get(&all).clone();
        let server = behaving_server(vec![Behavior::Declare(declared.clone())]);

        let negotiated = block_on(Negotiator::new(&versions).negotiate(&server)).unwrap();
        prop_assert_eq!(negotiated.version, declared);
        prop_assert_eq!(server.requests().len(), 1);
    }

    #[test]
    fn prop_failing_server_walks_the_whole_registry(versions in registry_strategy()) {
        let server = behaving_server(vec![Behavior::Fail]);
        let err = block_on(Negotiator::new(&versions).negotiate(&server)).unwrap_err();

        let expected: Vec<String> = versions.iter().map(|v| v.to_string()).collect();
        let exhausted = matches!(err, Error::NegotiationExhausted { .. });
        prop_assert!(exhausted, "expected exhaustion, got {}", err);
        prop_assert_eq!(server.requests(), expected);
    }

    #[test]
    fn prop_candidates_strictly_decrease(
        versions in registry_strategy(),
        script in prop::collection::vec(behavior_strategy(), 1..6),
    ) {
        let server = behaving_server(script);
        let result = block_on(Negotiator::new(&versions).negotiate(&server));

        let requests = server.requests.lock().unwrap().clone();
        prop_assert!(!requests.is_empty());
        prop_assert!(requests.len() <= versions.len());
        prop_assert!(requests.windows(2).all(|w| w[0] > w[1]));
        prop_assert!(requests.iter().all(|v| versions.contains(v)));

        match result {
            Ok(negotiated) => {
                prop_assert!(versions.contains(&negotiated.version));
                prop_assert_eq!(negotiated.tried, requests);
            }
            Err(Error::NegotiationExhausted { tried }) => prop_assert_eq!(tried, requests),
            Err(Error::VersionDetection(_)) | Err(Error::Negotiation { .. }) => {}
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }
}
