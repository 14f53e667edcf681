//! # Registrar Client
//!
//! Stateless HTTP client for the `did:cheqd` registrar's job endpoints. Every
//! call is a single request/response; driving a job to completion is the
//! responsibility of [`crate::DidManager`].

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config::{Config, base_url};
use crate::job::JobResponse;
use crate::{Error, Result, tracerr};

/// Query parameter value selecting UUID method-specific identifiers.
const METHOD_SPECIFIC_ID_ALGO: &str = "uuid";

/// Registrar job endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    /// Create a DID.
    Create,
    /// Update a DID document.
    Update,
    /// Deactivate a DID.
    Deactivate,
    /// Create a DID-linked resource.
    CreateResource,
    /// Update (publish a new version of) a DID-linked resource.
    UpdateResource,
}

impl Endpoint {
    /// Path of the endpoint relative to the registrar base URL.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Deactivate => "deactivate",
            Self::CreateResource => "createResource",
            Self::UpdateResource => "updateResource",
        }
    }

    // Statuses the registrar uses to acknowledge a submission.
    const fn accepts(self, status: StatusCode) -> bool {
        match self {
            Self::Create | Self::CreateResource => {
                matches!(status, StatusCode::OK | StatusCode::CREATED)
            }
            Self::Update | Self::Deactivate | Self::UpdateResource => {
                matches!(status, StatusCode::OK)
            }
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// HTTP client for a `did:cheqd` registrar.
#[derive(Clone, Debug)]
pub struct RegistrarClient {
    base_url: Url,
    http_client: Client,
}

impl RegistrarClient {
    /// Create a client for the registrar at `registrar_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(registrar_url: &str) -> Result<Self> {
        Self::with_config(&Config::new().registrar_url(registrar_url))
    }

    /// Create a client using the registrar URL and timeout from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn with_config(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http_client =
            Client::builder().default_headers(headers).timeout(config.timeout).build()?;

        Ok(Self {
            base_url: base_url(&config.registrar_url)?,
            http_client,
        })
    }

    /// The registrar base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Request a draft DID document for an Ed25519 public key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] carrying the status code for any response
    /// other than 200.
    pub async fn generate_did_doc(
        &self, network: &str, public_key_hex: &str, verification_method: &str,
    ) -> Result<Value> {
        let url = self.endpoint_url("did-document")?;
        tracing::debug!(%url, network, "requesting draft DID document");

        let res = self
            .http_client
            .get(url.clone())
            .query(&[
                ("methodSpecificIdAlgo", METHOD_SPECIFIC_ID_ALGO),
                ("network", network),
                ("publicKeyHex", public_key_hex),
                ("verificationMethod", verification_method),
            ])
            .send()
            .await?;

        if res.status() != StatusCode::OK {
            tracerr!(Error::Transport {
                url: url.to_string(),
                status: res.status().as_u16(),
            });
        }
        Ok(res.json().await?)
    }

    /// Submit a DID creation request or signatures for a creation job.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the registrar does not answer
    /// with 200 or 201.
    pub async fn create(&self, body: &impl Serialize) -> Result<JobResponse> {
        self.submit(Endpoint::Create, body).await
    }

    /// Submit a DID update request or signatures for an update job.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the registrar does not answer
    /// with 200.
    pub async fn update(&self, body: &impl Serialize) -> Result<JobResponse> {
        self.submit(Endpoint::Update, body).await
    }

    /// Submit a DID deactivation request or signatures for a deactivation job.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the registrar does not answer
    /// with 200.
    pub async fn deactivate(&self, body: &impl Serialize) -> Result<JobResponse> {
        self.submit(Endpoint::Deactivate, body).await
    }

    /// Submit a resource creation request or signatures for a resource job.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the registrar does not answer
    /// with 200 or 201.
    pub async fn create_resource(&self, body: &impl Serialize) -> Result<JobResponse> {
        self.submit(Endpoint::CreateResource, body).await
    }

    /// Submit a resource update request or signatures for a resource update job.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the registrar does not answer
    /// with 200.
    pub async fn update_resource(&self, body: &impl Serialize) -> Result<JobResponse> {
        self.submit(Endpoint::UpdateResource, body).await
    }

    /// Resources cannot be deactivated on `did:cheqd`.
    ///
    /// # Errors
    ///
    /// Always returns [`Error::NotSupported`].
    #[allow(clippy::unused_async)]
    pub async fn deactivate_resource(&self, _body: &impl Serialize) -> Result<JobResponse> {
        Err(Error::NotSupported("This method will not be implemented for did:cheqd.".to_string()))
    }

    /// Post `body` to `endpoint` and decode the job response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] for unexpected statuses and
    /// [`Error::InvalidResponse`] when the body is not a job response.
    pub async fn submit(&self, endpoint: Endpoint, body: &impl Serialize) -> Result<JobResponse> {
        let url = self.endpoint_url(endpoint.path())?;
        tracing::debug!(%url, "submitting registrar request");

        let res = self.http_client.post(url.clone()).json(body).send().await?;
        let status = res.status();
        if !endpoint.accepts(status) {
            tracerr!(Error::Transport {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = res.bytes().await?;
        match serde_json::from_slice(&bytes) {
            Ok(job) => Ok(job),
            Err(e) => tracerr!(
                Error::InvalidResponse(format!("{endpoint} response: {e}")),
                "decoding registrar response"
            ),
        }
    }

    fn endpoint_url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| Error::Config(format!("invalid endpoint {path}: {e}")))
    }
}
