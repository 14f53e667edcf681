//! Tests for publishing and resolving `AnonCreds` objects as DID-linked
//! resources.

use credibil_cheqd::anoncreds::{
    AnonCredsRegistry, CredentialDefinition, RevListUpdate, RevocationRegistryDefinition,
    RevocationStatusList, Schema,
};
use credibil_cheqd::{Config, DidManager, Error};
use serde_json::{Value, json};
use test_utils::Keyring;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DID: &str = "did:cheqd:testnet:1686a962-6e82-46f3-bde7-e6711d63958c";
const SCHEMA_ID: &str = "02229804-b46a-4be9-a6f1-13869109c7ea";
const CRED_DEF_ID: &str = "5b1a5aab-0c4a-4e9d-8b6b-0b4a0c7ed111";
const REV_REG_DEF_ID: &str = "8c9d1b6f-6a4b-4f1e-9a7e-4d2f3c1b0a22";
const NEW_ID: &str = "e788d345-dd0c-427a-a74b-27faf1e608cd";

fn registry(server: &MockServer) -> AnonCredsRegistry<Keyring> {
    let config = Config::new()
        .registrar_url(format!("{}/1.0/", server.uri()))
        .resolver_url(format!("{}/1.0/identifiers/", server.uri()));
    let manager = DidManager::new(config, Keyring::new()).expect("should create manager");
    AnonCredsRegistry::new(manager)
}

fn resource_id(id: &str) -> String {
    format!("{DID}/resources/{id}")
}

fn finished() -> Value {
    json!({
        "jobId": "MOCK_ID",
        "didUrlState": {"state": "finished", "didUrl": resource_id(NEW_ID)}
    })
}

// Mount a resolvable resource, wrapped the way a universal resolver
// dereferences it.
async fn mount_resource(server: &MockServer, id: &str, content: Value, name: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/1.0/identifiers/{}", resource_id(id))))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contentStream": content,
            "contentMetadata": {"resourceName": name, "resourceId": id},
            "dereferencingMetadata": {"contentType": "application/json"}
        })))
        .mount(server)
        .await;
}

async fn mount_schema(server: &MockServer) {
    let content = json!({"attrNames": ["name", "age"], "name": "Example", "version": "1.0"});
    mount_resource(server, SCHEMA_ID, content, "Example").await;
}

async fn mount_cred_def(server: &MockServer) {
    let content = json!({
        "type": "CL",
        "tag": "default",
        "value": {"primary": {"n": "1"}},
        "schemaId": resource_id(SCHEMA_ID)
    });
    mount_resource(server, CRED_DEF_ID, content, "Example-default").await;
}

async fn mount_rev_reg_def(server: &MockServer) {
    let content = json!({
        "revocDefType": "CL_ACCUM",
        "tag": "rev1",
        "value": {"maxCredNum": 3},
        "credDefId": resource_id(CRED_DEF_ID)
    });
    mount_resource(server, REV_REG_DEF_ID, content, "Example-default-rev1").await;
}

async fn mount_create(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path("/1.0/createResource"))
        .and(body_partial_json(body))
        .respond_with(ResponseTemplate::new(201).set_body_json(finished()))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn register_schema() {
    let server = MockServer::start().await;
    mount_create(
        &server,
        json!({
            "did": DID,
            "name": "Example",
            "type": "anonCredsSchema",
            "version": "1.0",
            "data": {"attrNames": ["name", "age"], "name": "Example", "version": "1.0"},
            "options": {"network": "testnet"}
        }),
    )
    .await;

    let schema = Schema {
        issuer_id: DID.to_string(),
        attr_names: vec!["name".to_string(), "age".to_string()],
        name: "Example".to_string(),
        version: "1.0".to_string(),
    };
    let result = registry(&server).register_schema(schema.clone()).await.expect("should register");

    assert_eq!(result.state.id, resource_id(NEW_ID));
    assert_eq!(result.state.value, schema);
    assert_eq!(result.registration_metadata.resource_id, NEW_ID);
    assert_eq!(result.registration_metadata.resource_name, "Example");
    assert_eq!(result.registration_metadata.resource_type, "anonCredsSchema");
}

#[tokio::test]
async fn get_schema() {
    let server = MockServer::start().await;
    mount_schema(&server).await;

    let resolved =
        registry(&server).get_schema(&resource_id(SCHEMA_ID)).await.expect("should resolve");
    assert_eq!(resolved.id, resource_id(SCHEMA_ID));
    assert_eq!(resolved.value.issuer_id, DID);
    assert_eq!(resolved.value.attr_names, vec!["name", "age"]);
    assert_eq!(resolved.metadata.get("resourceName"), Some(&json!("Example")));
}

// Identifiers with extra path segments take the issuer from the first
// segment.
#[tokio::test]
async fn get_schema_legacy_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.0/identifiers/PART0/PART1/PART2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "attrNames": ["name"],
            "name": "Legacy",
            "version": "2.0"
        })))
        .mount(&server)
        .await;

    let resolved = registry(&server).get_schema("PART0/PART1/PART2").await.expect("should resolve");
    assert_eq!(resolved.value.issuer_id, "PART0");
    assert_eq!(resolved.value.name, "Legacy");
}

#[tokio::test]
async fn get_schema_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(404)).mount(&server).await;

    let err = registry(&server).get_schema(&resource_id(SCHEMA_ID)).await.expect_err("should fail");
    assert!(matches!(err, Error::ResourceNotFound(_)));
}

// A credential definition is named after its schema and tag.
#[tokio::test]
async fn register_credential_definition() {
    let server = MockServer::start().await;
    mount_schema(&server).await;
    mount_create(
        &server,
        json!({
            "name": "Example-default",
            "type": "anonCredsCredDef",
            "version": "default",
            "data": {"type": "CL", "tag": "default", "schemaId": resource_id(SCHEMA_ID)}
        }),
    )
    .await;

    let cred_def = CredentialDefinition {
        issuer_id: DID.to_string(),
        schema_id: resource_id(SCHEMA_ID),
        signature_type: "CL".to_string(),
        tag: "default".to_string(),
        value: json!({"primary": {"n": "1"}}),
    };
    let result =
        registry(&server).register_credential_definition(cred_def).await.expect("should register");

    assert_eq!(result.state.id, resource_id(NEW_ID));
    assert_eq!(result.registration_metadata.resource_name, "Example-default");
}

// A revocation registry definition is named after the credential definition's
// resource name and its own tag.
#[tokio::test]
async fn register_revocation_registry_definition() {
    let server = MockServer::start().await;
    mount_cred_def(&server).await;
    mount_create(
        &server,
        json!({
            "name": "Example-default-rev1",
            "type": "anonCredsRevocRegDef",
            "version": "rev1",
            "data": {"revocDefType": "CL_ACCUM", "credDefId": resource_id(CRED_DEF_ID)}
        }),
    )
    .await;

    let rev_reg_def = RevocationRegistryDefinition {
        issuer_id: DID.to_string(),
        revoc_def_type: "CL_ACCUM".to_string(),
        cred_def_id: resource_id(CRED_DEF_ID),
        tag: "rev1".to_string(),
        value: json!({"maxCredNum": 3}),
    };
    let result = registry(&server)
        .register_revocation_registry_definition(rev_reg_def)
        .await
        .expect("should register");

    assert_eq!(result.registration_metadata.resource_name, "Example-default-rev1");
    assert_eq!(result.registration_metadata.resource_type, "anonCredsRevocRegDef");
}

#[tokio::test]
async fn register_revocation_list() {
    let server = MockServer::start().await;
    mount_rev_reg_def(&server).await;
    mount_create(
        &server,
        json!({
            "name": "Example-default-rev1",
            "type": "anonCredsStatusList",
            "version": "1700000000",
            "data": {
                "revocationList": [0, 1, 0],
                "currentAccumulator": "MOCK_ACCUM",
                "timestamp": 1_700_000_000
            }
        }),
    )
    .await;

    let status_list = RevocationStatusList {
        issuer_id: DID.to_string(),
        rev_reg_def_id: resource_id(REV_REG_DEF_ID),
        revocation_list: vec![0, 1, 0],
        current_accumulator: "MOCK_ACCUM".to_string(),
        timestamp: Some(1_700_000_000),
    };
    let result =
        registry(&server).register_revocation_list(status_list).await.expect("should register");

    assert_eq!(result.state.value.revocation_list, vec![0, 1, 0]);
    assert_eq!(result.registration_metadata.resource_name, "Example-default-rev1");
}

// The list in force at a time is found by name, type and time.
#[tokio::test]
async fn get_revocation_list_at() {
    let server = MockServer::start().await;
    mount_rev_reg_def(&server).await;
    Mock::given(method("GET"))
        .and(path(format!("/1.0/identifiers/{DID}")))
        .and(query_param("resourceType", "anonCredsStatusList"))
        .and(query_param("resourceName", "Example-default-rev1"))
        .and(query_param("resourceTime", "2023-11-14T22:13:20Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contentStream": {
                "revocationList": [1, 0, 0],
                "currentAccumulator": "MOCK_ACCUM",
                "timestamp": 1_699_999_000
            },
            "contentMetadata": {"resourceName": "Example-default-rev1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resolved = registry(&server)
        .get_revocation_list(&resource_id(REV_REG_DEF_ID), Some(1_700_000_000))
        .await
        .expect("should resolve");

    assert_eq!(resolved.value.issuer_id, DID);
    assert_eq!(resolved.value.rev_reg_def_id, resource_id(REV_REG_DEF_ID));
    assert_eq!(resolved.value.revocation_list, vec![1, 0, 0]);
    assert_eq!(resolved.value.timestamp, Some(1_699_999_000));
}

// Revoking publishes a new version of the current list through the update
// endpoint.
#[tokio::test]
async fn update_revocation_list() {
    let server = MockServer::start().await;
    mount_rev_reg_def(&server).await;
    Mock::given(method("GET"))
        .and(path(format!("/1.0/identifiers/{DID}")))
        .and(query_param("resourceType", "anonCredsStatusList"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contentStream": {
                "revocationList": [0, 0, 0],
                "currentAccumulator": "MOCK_ACCUM",
                "timestamp": 1_700_000_000
            },
            "contentMetadata": {"resourceName": "Example-default-rev1"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/1.0/updateResource"))
        .and(body_partial_json(json!({
            "name": "Example-default-rev1",
            "type": "anonCredsStatusList",
            "data": {"revocationList": [0, 1, 0], "currentAccumulator": "MOCK_ACCUM_2"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(finished()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/1.0/createResource"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let update = RevListUpdate {
        revoked: vec![1],
        current_accumulator: "MOCK_ACCUM_2".to_string(),
    };
    let result = registry(&server)
        .update_revocation_list(&resource_id(REV_REG_DEF_ID), update)
        .await
        .expect("should update");

    let status_list = result.state.value;
    assert_eq!(status_list.revocation_list, vec![0, 1, 0]);
    assert_eq!(status_list.current_accumulator, "MOCK_ACCUM_2");
    let timestamp = status_list.timestamp.expect("should set timestamp");
    assert!(timestamp > 1_700_000_000);

    // the new version is the new timestamp
    let requests = server.received_requests().await.expect("should record requests");
    let update = requests
        .iter()
        .find(|r| r.url.path() == "/1.0/updateResource")
        .expect("should submit update");
    let body: Value = serde_json::from_slice(&update.body).expect("should be json");
    assert_eq!(body["version"], json!(timestamp.to_string()));
    assert_eq!(body["data"]["timestamp"], json!(timestamp));
    let version: i64 = body["version"].as_str().and_then(|v| v.parse().ok()).expect("should parse");
    assert!(version > 1_700_000_000);
    assert_eq!(result.registration_metadata.resource_type, "anonCredsStatusList");
}

#[tokio::test]
async fn update_revocation_list_out_of_range() {
    let server = MockServer::start().await;
    mount_rev_reg_def(&server).await;
    Mock::given(method("GET"))
        .and(path(format!("/1.0/identifiers/{DID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contentStream": {"revocationList": [0, 0, 0], "currentAccumulator": "MOCK_ACCUM"},
            "contentMetadata": {"resourceName": "Example-default-rev1"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

    let update = RevListUpdate {
        revoked: vec![3],
        current_accumulator: "MOCK_ACCUM_2".to_string(),
    };
    let err = registry(&server)
        .update_revocation_list(&resource_id(REV_REG_DEF_ID), update)
        .await
        .expect_err("should fail");
    assert!(matches!(err, Error::InvalidInput(_)));
}

// A published timestamp that cannot be advanced is rejected rather than
// wrapped.
#[tokio::test]
async fn update_revocation_list_timestamp_overflow() {
    let server = MockServer::start().await;
    mount_rev_reg_def(&server).await;
    Mock::given(method("GET"))
        .and(path(format!("/1.0/identifiers/{DID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contentStream": {
                "revocationList": [0, 0, 0],
                "currentAccumulator": "MOCK_ACCUM",
                "timestamp": i64::MAX
            },
            "contentMetadata": {"resourceName": "Example-default-rev1"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

    let update = RevListUpdate {
        revoked: vec![1],
        current_accumulator: "MOCK_ACCUM_2".to_string(),
    };
    let err = registry(&server)
        .update_revocation_list(&resource_id(REV_REG_DEF_ID), update)
        .await
        .expect_err("should fail");
    assert!(matches!(err, Error::InvalidResponse(_)));
}
