//! Tests for updating and deactivating an existing `did:cheqd` DID.

use credibil_cheqd::{Config, DidManager, Error, Wallet};
use serde_json::{Value, json};
use test_utils::Keyring;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DID: &str = "did:cheqd:testnet:1686a962-6e82-46f3-bde7-e6711d63958c";

fn config(server: &MockServer) -> Config {
    Config::new()
        .registrar_url(format!("{}/1.0/", server.uri()))
        .resolver_url(format!("{}/1.0/identifiers/", server.uri()))
}

fn kid() -> String {
    format!("{DID}#key-1")
}

fn document() -> Value {
    json!({
        "id": DID,
        "controller": [DID],
        "verificationMethod": [{
            "id": kid(),
            "type": "Ed25519VerificationKey2020",
            "controller": DID
        }],
        "authentication": [kid()],
        "service": [{
            "id": format!("{DID}#website"),
            "type": "LinkedDomains",
            "serviceEndpoint": ["https://example.com"]
        }]
    })
}

// A keyring already holding the DID's key.
async fn keyring() -> Keyring {
    let keyring = Keyring::new();
    let verkey = keyring.create_key(None).await.expect("should create key");
    keyring.assign_kid(&verkey, &kid()).await.expect("should bind kid");
    keyring
}

async fn mount_resolution(server: &MockServer, deactivated: bool) {
    Mock::given(method("GET"))
        .and(path(format!("/1.0/identifiers/{DID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "didDocument": {"id": DID},
            "didDocumentMetadata": {"created": "2024-01-01T00:00:00Z", "deactivated": deactivated}
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_job(server: &MockServer, endpoint: &str, first: Value) {
    Mock::given(method("POST"))
        .and(path(format!("/1.0/{endpoint}")))
        .and(body_partial_json(first))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobId": "MOCK_ID",
            "didState": {
                "state": "action",
                "signingRequest": [{"kid": kid(), "serializedPayload": "AQIDBA=="}]
            }
        })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/1.0/{endpoint}")))
        .and(body_partial_json(json!({"jobId": "MOCK_ID"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobId": "MOCK_ID",
            "didState": {"state": "finished", "did": DID, "didDocument": document()}
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn update_success() {
    let server = MockServer::start().await;
    mount_resolution(&server, false).await;
    mount_job(
        &server,
        "update",
        json!({
            "did": DID,
            "didDocumentOperation": ["setDidDocument"],
            "didDocument": [document()]
        }),
    )
    .await;

    let manager = DidManager::new(config(&server), keyring().await).expect("should create manager");
    let result = manager.update(DID, document()).await.expect("should update");

    assert_eq!(result.did, DID);
    assert_eq!(result.did_document, Some(document()));
    assert!(result.verkey.is_none());
    assert_eq!(manager.wallet().signed().len(), 1);
}

// A deactivated DID is rejected before the registrar is contacted.
#[tokio::test]
async fn update_deactivated() {
    let server = MockServer::start().await;
    mount_resolution(&server, true).await;
    Mock::given(method("POST"))
        .and(path("/1.0/update"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let manager = DidManager::new(config(&server), keyring().await).expect("should create manager");
    let err = manager.update(DID, document()).await.expect_err("should fail");

    assert!(matches!(err, Error::DidNotFound(_)));
    assert_eq!(err.to_string(), format!("DID is already deactivated or not found: {DID}"));
}

#[tokio::test]
async fn update_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/1.0/identifiers/{DID}")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

    let manager = DidManager::new(config(&server), keyring().await).expect("should create manager");
    let err = manager.update(DID, document()).await.expect_err("should fail");
    assert!(matches!(err, Error::DidNotFound(_)));
}

#[tokio::test]
async fn deactivate_success() {
    let server = MockServer::start().await;
    mount_resolution(&server, false).await;
    mount_job(&server, "deactivate", json!({"did": DID})).await;

    let manager = DidManager::new(config(&server), keyring().await).expect("should create manager");
    let result = manager.deactivate(DID).await.expect("should deactivate");

    assert_eq!(result.did, DID);
    assert_eq!(result.job_id.as_deref(), Some("MOCK_ID"));
}

#[tokio::test]
async fn deactivate_twice() {
    let server = MockServer::start().await;
    mount_resolution(&server, true).await;
    Mock::given(method("POST"))
        .and(path("/1.0/deactivate"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let manager = DidManager::new(config(&server), keyring().await).expect("should create manager");
    let err = manager.deactivate(DID).await.expect_err("should fail");
    assert!(matches!(err, Error::DidNotFound(_)));
}

// Signatures for a key the wallet does not hold fail the job.
#[tokio::test]
async fn update_unknown_key() {
    let server = MockServer::start().await;
    mount_resolution(&server, false).await;
    Mock::given(method("POST"))
        .and(path("/1.0/update"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobId": "MOCK_ID",
            "didState": {
                "state": "action",
                "signingRequest": [{"kid": format!("{DID}#key-2"), "serializedPayload": "AQIDBA=="}]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = DidManager::new(config(&server), keyring().await).expect("should create manager");
    let err = manager.update(DID, document()).await.expect_err("should fail");
    assert!(matches!(err, Error::Signing(_)));
}
