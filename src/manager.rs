//! # DID Manager
//!
//! Drives registrar jobs to completion. Each operation submits an envelope,
//! then loops on the job state: `action` rounds are answered with signatures
//! from the [`Wallet`], `finished` returns the result and `error` fails. Every
//! round-trip is sequential and job state never outlives the call.
//!
//! Dropping an operation's future abandons the job. The registrar may be left
//! holding a job in the `action` state; no compensating call is made.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifier;
use crate::job::{
    CreateRequest, DeactivateRequest, JobResponse, JobState, NetworkOptions, Outcome,
    ResourceRequest, Secret, SubmitSignature, UpdateRequest,
};
use crate::provider::{SigningRequest, SigningResponse, Wallet};
use crate::registrar::{Endpoint, RegistrarClient};
use crate::resolver::{Resolver, ResolverClient};
use crate::{Config, Error, Result, tracerr};

// Reported when the registrar's error state carries no reason.
const NO_REASON: &str = "no reason given";

/// Options for creating a DID.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOptions {
    /// Network to create the DID on. Defaults to the configured network.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    /// Seed to derive the DID key from. Only permitted when the configuration
    /// allows insecure seeds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
}

/// Result of a DID create, update or deactivate job.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DidResult {
    /// The DID.
    pub did: String,

    /// Hex-encoded public key of the DID's key, for newly created DIDs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verkey: Option<String>,

    /// The DID document reported by the registrar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did_document: Option<Value>,

    /// The registrar job that performed the operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

/// A typed DID-linked resource payload.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ResourcePayload {
    /// Resource name.
    pub name: String,

    /// Resource type.
    #[serde(rename = "type")]
    pub resource_type: String,

    /// Resource version.
    pub version: String,

    /// Resource content.
    pub data: Value,
}

/// A resource published by a finished job.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedResource {
    /// The registrar job that published the resource.
    pub job_id: Option<String>,

    /// Registrar-assigned resource ID.
    pub resource_id: String,

    /// DID URL of the resource, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did_url: Option<String>,
}

/// A finished registrar job.
#[derive(Clone, Debug)]
pub struct CompletedJob {
    /// Job ID assigned by the registrar.
    pub job_id: Option<String>,

    /// What the job produced.
    pub outcome: Outcome,
}

/// Orchestrates DID and resource registration against a registrar.
#[derive(Clone, Debug)]
pub struct DidManager<W, R = ResolverClient> {
    config: Config,
    registrar: RegistrarClient,
    resolver: R,
    wallet: W,
}

impl<W: Wallet> DidManager<W> {
    /// Create a manager using HTTP registrar and resolver clients configured
    /// by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: Config, wallet: W) -> Result<Self> {
        let resolver = ResolverClient::with_config(&config)?;
        Self::with_resolver(config, wallet, resolver)
    }
}

impl<W: Wallet, R: Resolver> DidManager<W, R> {
    /// Create a manager with a host-supplied resolver.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_resolver(config: Config, wallet: W, resolver: R) -> Result<Self> {
        config.validate()?;
        let registrar = RegistrarClient::with_config(&config)?;
        Ok(Self {
            config,
            registrar,
            resolver,
            wallet,
        })
    }

    /// The manager's configuration.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The registrar client.
    pub const fn registrar(&self) -> &RegistrarClient {
        &self.registrar
    }

    /// The resolver.
    pub const fn resolver(&self) -> &R {
        &self.resolver
    }

    /// The wallet.
    pub const fn wallet(&self) -> &W {
        &self.wallet
    }

    /// Create a new DID.
    ///
    /// A key is created in the wallet, a draft DID document is generated for
    /// it by the registrar and then registered, with the new key answering the
    /// registrar's signing requests.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyPolicy`] if a seed is supplied but not allowed,
    /// [`Error::DocumentConstruction`] if no usable draft is returned, and any
    /// job error: no signing requests, signing failure, registrar error state,
    /// or too many signing rounds.
    pub async fn create(&self, options: CreateOptions) -> Result<DidResult> {
        if options.seed.is_some() && !self.config.allow_insecure_seed {
            tracerr!(Error::KeyPolicy);
        }
        let network = options.network.unwrap_or_else(|| self.config.network.clone());

        let verkey = match self.wallet.create_key(options.seed.as_deref()).await {
            Ok(verkey) => verkey,
            Err(e) => tracerr!(Error::Wallet(e.to_string()), "creating DID key"),
        };
        let public_key_hex = hex::encode(&verkey);

        let draft = self
            .registrar
            .generate_did_doc(&network, &public_key_hex, &self.config.verification_method)
            .await?;
        let Some(did_document) = draft_document(draft) else {
            tracerr!(Error::DocumentConstruction);
        };
        let did = did_document.get("id").and_then(Value::as_str).unwrap_or_default().to_string();
        tracing::debug!(%did, %network, "registering DID");

        let request = CreateRequest {
            did_document,
            network: network.clone(),
        };
        let job = Job {
            endpoint: Endpoint::Create,
            operation: "create",
            network: Some(network),
            did: None,
            options: None,
            bind_key: Some(verkey.as_slice()),
        };
        let completed = self.run_job(&job, &request).await?;
        tracing::info!(%did, job_id = ?completed.job_id, "DID created");

        Ok(DidResult {
            did: completed.outcome.did.unwrap_or(did),
            verkey: Some(public_key_hex),
            did_document: completed.outcome.did_document,
            job_id: completed.job_id,
        })
    }

    /// Replace the DID document of an existing, active DID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DidNotFound`] without contacting the registrar if the
    /// DID cannot be resolved or is deactivated, and any job error.
    pub async fn update(&self, did: &str, document: Value) -> Result<DidResult> {
        self.ensure_active(did).await?;

        let request = UpdateRequest::set_document(did, document);
        let job = Job::new(Endpoint::Update, "update");
        let completed = self.run_job(&job, &request).await?;
        tracing::info!(did, job_id = ?completed.job_id, "DID updated");

        Ok(DidResult {
            did: did.to_string(),
            verkey: None,
            did_document: completed.outcome.did_document,
            job_id: completed.job_id,
        })
    }

    /// Deactivate an existing, active DID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DidNotFound`] without contacting the registrar if the
    /// DID cannot be resolved or is already deactivated, and any job error.
    pub async fn deactivate(&self, did: &str) -> Result<DidResult> {
        self.ensure_active(did).await?;

        let request = DeactivateRequest { did: did.to_string() };
        let job = Job::new(Endpoint::Deactivate, "deactivate");
        let completed = self.run_job(&job, &request).await?;
        tracing::info!(did, job_id = ?completed.job_id, "DID deactivated");

        Ok(DidResult {
            did: did.to_string(),
            verkey: None,
            did_document: completed.outcome.did_document,
            job_id: completed.job_id,
        })
    }

    /// Publish a new DID-linked resource under `did`.
    ///
    /// # Errors
    ///
    /// Returns an error if `did` is not a `did:cheqd` DID, any job error, or
    /// [`Error::InvalidResponse`] if the finished job does not identify the
    /// resource.
    pub async fn create_resource(
        &self, did: &str, payload: &ResourcePayload,
    ) -> Result<PublishedResource> {
        self.publish(Endpoint::CreateResource, did, payload).await
    }

    /// Publish a new version of a DID-linked resource under `did`.
    ///
    /// # Errors
    ///
    /// As for [`DidManager::create_resource`].
    pub async fn update_resource(
        &self, did: &str, payload: &ResourcePayload,
    ) -> Result<PublishedResource> {
        self.publish(Endpoint::UpdateResource, did, payload).await
    }

    /// Resources cannot be deactivated on `did:cheqd`.
    ///
    /// # Errors
    ///
    /// Always returns [`Error::NotSupported`].
    pub async fn deactivate_resource(&self, did: &str, resource_id: &str) -> Result<()> {
        tracing::debug!(did, resource_id, "resource deactivation requested");
        self.registrar
            .deactivate_resource(&serde_json::json!({"did": did, "resourceId": resource_id}))
            .await
            .map(|_| ())
    }

    async fn publish(
        &self, endpoint: Endpoint, did: &str, payload: &ResourcePayload,
    ) -> Result<PublishedResource> {
        let options = NetworkOptions {
            network: identifier::network(did)?.to_string(),
        };
        let request = ResourceRequest {
            did: did.to_string(),
            name: payload.name.clone(),
            resource_type: payload.resource_type.clone(),
            version: payload.version.clone(),
            data: payload.data.clone(),
            options: options.clone(),
        };
        tracing::debug!(
            did,
            name = %payload.name,
            resource_type = %payload.resource_type,
            "publishing resource"
        );

        let job = Job {
            endpoint,
            operation: endpoint.path(),
            network: None,
            did: Some(did),
            options: Some(options),
            bind_key: None,
        };
        let completed = self.run_job(&job, &request).await?;

        let Some(resource_id) = completed.outcome.resource_id() else {
            tracerr!(Error::InvalidResponse(
                "finished resource job did not report a resource ID".to_string()
            ));
        };
        tracing::info!(did, %resource_id, job_id = ?completed.job_id, "resource published");

        Ok(PublishedResource {
            job_id: completed.job_id,
            resource_id,
            did_url: completed.outcome.did_url,
        })
    }

    async fn ensure_active(&self, did: &str) -> Result<()> {
        let resolution = self.resolver.resolve(did).await?;
        if !resolution.is_some_and(|r| r.is_active()) {
            tracerr!(Error::DidNotFound(did.to_string()));
        }
        Ok(())
    }

    /// Submit `request` and answer `action` rounds until the job finishes.
    ///
    /// # Errors
    ///
    /// - [`Error::NoSigningRequests`] if an `action` state has nothing to sign.
    /// - [`Error::Signing`] if the wallet fails or returns mismatched signatures.
    /// - [`Error::Registration`] if the registrar reports an error state.
    /// - [`Error::ProtocolExhausted`] after `max_rounds` signing rounds.
    /// - Transport errors from the registrar client.
    pub(crate) async fn run_job(
        &self, job: &Job<'_>, request: &impl Serialize,
    ) -> Result<CompletedJob> {
        let mut response = self.registrar.submit(job.endpoint, request).await?;
        let mut rounds = 0;

        loop {
            let JobResponse { job_id, state } = response;

            let signing_requests = match state {
                JobState::Finished(outcome) => return Ok(CompletedJob { job_id, outcome }),
                JobState::Error { reason } => {
                    tracerr!(Error::Registration {
                        operation: job.operation.to_string(),
                        job_id,
                        reason: reason.unwrap_or_else(|| NO_REASON.to_string()),
                    })
                }
                JobState::Action { signing_requests, .. } => signing_requests,
            };

            if signing_requests.is_empty() {
                tracerr!(Error::NoSigningRequests {
                    operation: job.operation.to_string(),
                });
            }
            let Some(job_id) = job_id else {
                tracerr!(Error::InvalidResponse("action state without a job ID".to_string()));
            };
            if rounds >= self.config.max_rounds {
                tracerr!(Error::ProtocolExhausted { job_id, rounds });
            }
            rounds += 1;
            tracing::debug!(%job_id, round = rounds, requests = signing_requests.len(), "signing");

            if let Some(verkey) = job.bind_key {
                for kid in signing_requests.iter().map(|r| r.kid.as_str()) {
                    if let Err(e) = self.wallet.assign_kid(verkey, kid).await {
                        tracerr!(Error::Wallet(e.to_string()), "assigning {kid}");
                    }
                }
            }
            let signing_response = self.sign(&signing_requests).await?;

            let submission = SubmitSignature {
                job_id,
                network: job.network.clone(),
                did: job.did.map(ToString::to_string),
                options: job.options.clone(),
                secret: Secret { signing_response },
            };
            response = self.registrar.submit(job.endpoint, &submission).await?;
        }
    }

    // Sign a batch and check there is exactly one signature per requested key.
    async fn sign(&self, requests: &[SigningRequest]) -> Result<Vec<SigningResponse>> {
        let responses = match self.wallet.sign(requests).await {
            Ok(responses) => responses,
            Err(e) => tracerr!(Error::Signing(e.to_string())),
        };

        if responses.len() != requests.len() {
            tracerr!(Error::Signing(format!(
                "expected {} signatures, received {}",
                requests.len(),
                responses.len()
            )));
        }
        // counts match, so every request is answered once if no kid is overdrawn
        let mut outstanding: HashMap<&str, usize> = HashMap::new();
        for req in requests {
            *outstanding.entry(req.kid.as_str()).or_default() += 1;
        }
        for res in &responses {
            match outstanding.get_mut(res.kid.as_str()) {
                Some(count) if *count > 0 => *count -= 1,
                Some(_) => tracerr!(Error::Signing(format!("duplicate signature for {}", res.kid))),
                None => tracerr!(Error::Signing(format!("unexpected signature for {}", res.kid))),
            }
        }
        Ok(responses)
    }
}

/// Parameters for driving a single registrar job.
#[derive(Debug)]
pub(crate) struct Job<'a> {
    endpoint: Endpoint,
    operation: &'static str,
    network: Option<String>,
    did: Option<&'a str>,
    options: Option<NetworkOptions>,
    bind_key: Option<&'a [u8]>,
}

impl Job<'_> {
    const fn new(endpoint: Endpoint, operation: &'static str) -> Self {
        Self {
            endpoint,
            operation,
            network: None,
            did: None,
            options: None,
            bind_key: None,
        }
    }
}

// The registrar wraps the draft in `didDoc`; accept a bare document too. The
// draft must be a non-empty object with a string `id`.
fn draft_document(draft: Value) -> Option<Value> {
    let doc = match draft {
        Value::Object(mut obj) if obj.contains_key("didDoc") => obj.remove("didDoc")?,
        other => other,
    };
    let obj = doc.as_object()?;
    if obj.is_empty() || !obj.get("id").is_some_and(Value::is_string) {
        return None;
    }
    Some(doc)
}
