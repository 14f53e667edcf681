//! # Registrar Jobs
//!
//! Request envelopes and job responses exchanged with the registrar. A job is
//! created by the registrar's first response and carried forward by its
//! `jobId` until it reaches [`JobState::Finished`] or [`JobState::Error`].
//!
//! See <https://identity.foundation/did-registration/#didstate>.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::provider::{SigningRequest, SigningResponse};

/// Registrar response to a job submission.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    /// Opaque job token assigned by the registrar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,

    /// Job state. DID jobs report `didState`, resource jobs `didUrlState`.
    #[serde(rename = "didState", alias = "didUrlState")]
    pub state: JobState,
}

/// State of a registrar job.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum JobState {
    /// The registrar is waiting on signatures.
    Action {
        /// Payloads to sign.
        #[serde(default, rename = "signingRequest")]
        signing_requests: Vec<SigningRequest>,

        /// Optional human-readable description of the action.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },

    /// The job completed and the result was written to the ledger.
    Finished(Outcome),

    /// The job failed.
    Error {
        /// Reason reported by the registrar.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

/// Result of a finished job.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Outcome {
    /// The DID created or modified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did: Option<String>,

    /// The resulting DID document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did_document: Option<Value>,

    /// DID URL of a created resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did_url: Option<String>,

    /// Registrar-assigned resource ID, when reported directly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,

    /// Descriptor of a created resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceRef>,
}

impl Outcome {
    /// The registrar-assigned ID of the resource this job published, if any.
    #[must_use]
    pub fn resource_id(&self) -> Option<String> {
        if let Some(id) = self.resource.as_ref().and_then(|r| r.id.clone()) {
            return Some(id);
        }
        if let Some(id) = &self.resource_id {
            return Some(id.clone());
        }
        let did_url = self.did_url.as_ref()?;
        let (_, id) = did_url.rsplit_once('/')?;
        (!id.is_empty()).then(|| id.to_string())
    }
}

/// Resource descriptor returned by the registrar.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceRef {
    /// Resource ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Resource name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Resource type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    /// Resource version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Envelope for a DID creation request.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    /// Draft DID document.
    pub did_document: Value,

    /// Target network.
    pub network: String,
}

/// Operation applied by an update request.
pub const SET_DID_DOCUMENT: &str = "setDidDocument";

/// Envelope for a DID update request.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    /// The DID to update.
    pub did: String,

    /// Operations to apply, one per document.
    pub did_document_operation: Vec<String>,

    /// Documents the operations apply to.
    pub did_document: Vec<Value>,
}

impl UpdateRequest {
    /// Replace the document of `did` with `document`.
    #[must_use]
    pub fn set_document(did: impl Into<String>, document: Value) -> Self {
        Self {
            did: did.into(),
            did_document_operation: vec![SET_DID_DOCUMENT.to_string()],
            did_document: vec![document],
        }
    }
}

/// Envelope for a DID deactivation request.
#[derive(Clone, Debug, Serialize)]
pub struct DeactivateRequest {
    /// The DID to deactivate.
    pub did: String,
}

/// Envelope for a resource creation or update request.
#[derive(Clone, Debug, Serialize)]
pub struct ResourceRequest {
    /// DID the resource is published under.
    pub did: String,

    /// Resource name.
    pub name: String,

    /// Resource type.
    #[serde(rename = "type")]
    pub resource_type: String,

    /// Resource version.
    pub version: String,

    /// Resource content.
    pub data: Value,

    /// Method-specific options.
    pub options: NetworkOptions,
}

/// Method-specific request options.
#[derive(Clone, Debug, Serialize)]
pub struct NetworkOptions {
    /// Network the DID lives on.
    pub network: String,
}

/// Resubmission carrying signatures for a job in the `action` state.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSignature {
    /// Job being continued.
    pub job_id: String,

    /// Network, for DID creation jobs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    /// DID, for resource jobs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did: Option<String>,

    /// Method options, for resource jobs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<NetworkOptions>,

    /// Signatures over the requested payloads.
    pub secret: Secret,
}

/// Secret material returned to the registrar.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    /// One signature per signing request.
    pub signing_response: Vec<SigningResponse>,
}
