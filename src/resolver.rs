//! # Resolver
//!
//! Resolution of `did:cheqd` DIDs and DID-linked resources. [`ResolverClient`]
//! talks to a universal-resolver style HTTP endpoint; hosts with their own
//! resolution (or caching) can implement [`Resolver`] directly.

use std::future::Future;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::config::{Config, base_url};
use crate::{Error, Result, tracerr};

const DID_RESOLUTION: &str = r#"application/ld+json;profile="https://w3id.org/did-resolution""#;
const DID_URL_DEREFERENCING: &str =
    r#"application/ld+json;profile="https://w3id.org/did-url-dereferencing""#;

/// Metadata associated with a DID document.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// The time the document was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    /// The time the document was last updated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,

    /// Set to `true` once the DID has been deactivated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deactivated: Option<bool>,

    /// Version of the resolved document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

/// Return type from a DID resolution.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DidResolution {
    /// The DID document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did_document: Option<Value>,

    /// Metadata associated with the document.
    #[serde(default)]
    pub did_document_metadata: DocumentMetadata,
}

impl DidResolution {
    /// Whether the resolved DID can still be updated: a document was returned
    /// and the DID has not been deactivated.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.did_document.is_some() && self.did_document_metadata.deactivated != Some(true)
    }
}

/// A dereferenced DID-linked resource.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ResolvedResource {
    /// Resource content.
    pub resource: Value,

    /// Resolver-reported metadata (`resourceName`, `resourceType`, ...).
    pub metadata: Map<String, Value>,
}

/// [`Resolver`] fetches previously published DID documents and resources.
pub trait Resolver: Send + Sync {
    /// Resolve a DID. Returns `None` when the DID is unknown.
    fn resolve(&self, did: &str) -> impl Future<Output = Result<Option<DidResolution>>> + Send;

    /// Dereference a DID URL identifying a resource. Returns `None` when no
    /// resource exists at the URL.
    fn resolve_resource(
        &self, did_url: &str,
    ) -> impl Future<Output = Result<Option<ResolvedResource>>> + Send;
}

/// HTTP client for a DID resolver.
#[derive(Clone, Debug)]
pub struct ResolverClient {
    base_url: Url,
    http_client: Client,
}

impl ResolverClient {
    /// Create a client for the resolver at `resolver_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(resolver_url: &str) -> Result<Self> {
        Self::with_config(&Config::new().resolver_url(resolver_url))
    }

    /// Create a client using the resolver URL and timeout from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn with_config(config: &Config) -> Result<Self> {
        let http_client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            base_url: base_url(&config.resolver_url)?,
            http_client,
        })
    }

    // Fetch `id` from the resolver, returning `None` on 404.
    async fn fetch(&self, id: &str, accept: &'static str) -> Result<Option<Value>> {
        let url = Url::parse(&format!("{}{id}", self.base_url))
            .map_err(|e| Error::InvalidIdentifier(format!("{id}: {e}")))?;
        tracing::debug!(%url, "resolving");

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
        let res = self.http_client.get(url.clone()).headers(headers).send().await?;

        match res.status() {
            StatusCode::NOT_FOUND | StatusCode::GONE => Ok(None),
            status if status.is_success() => Ok(Some(res.json().await?)),
            status => tracerr!(Error::Transport {
                url: url.to_string(),
                status: status.as_u16(),
            }),
        }
    }
}

impl Resolver for ResolverClient {
    async fn resolve(&self, did: &str) -> Result<Option<DidResolution>> {
        let Some(body) = self.fetch(did, DID_RESOLUTION).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_value(body)?))
    }

    async fn resolve_resource(&self, did_url: &str) -> Result<Option<ResolvedResource>> {
        let Some(body) = self.fetch(did_url, DID_URL_DEREFERENCING).await? else {
            return Ok(None);
        };
        Ok(Some(dereferenced(body)))
    }
}

// Split a dereferencing result into content and metadata. Resolvers that
// return the raw resource body yield empty metadata.
fn dereferenced(body: Value) -> ResolvedResource {
    match body {
        Value::Object(mut obj) if obj.contains_key("contentStream") => {
            let resource = obj.remove("contentStream").unwrap_or_default();
            let metadata = match obj.remove("contentMetadata") {
                Some(Value::Object(metadata)) => metadata,
                _ => Map::new(),
            };
            ResolvedResource { resource, metadata }
        }
        resource => ResolvedResource {
            resource,
            metadata: Map::new(),
        },
    }
}
