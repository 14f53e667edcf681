//! # `AnonCreds` Resources
//!
//! Maps `AnonCreds` objects onto `did:cheqd` DID-linked resources. Every kind
//! is published through the same resource job; kinds differ only in how the
//! resource name, version and content are derived:
//!
//! | Kind | Name | Type | Version |
//! |------|------|------|---------|
//! | Schema | schema name | `anonCredsSchema` | schema version |
//! | Credential definition | `<schema name>-<tag>` | `anonCredsCredDef` | tag |
//! | Revocation registry definition | `<cred def resource name>-<tag>` | `anonCredsRevocRegDef` | tag |
//! | Revocation status list | rev reg def resource name | `anonCredsStatusList` | epoch seconds |
//!
//! See <https://docs.cheqd.io/product/advanced/anoncreds>.

mod credential_definition;
mod revocation_registry;
mod schema;
mod status_list;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use self::credential_definition::CredentialDefinition;
pub use self::revocation_registry::RevocationRegistryDefinition;
pub use self::schema::Schema;
pub use self::status_list::{RevListUpdate, RevocationStatusList};
use crate::identifier;
use crate::manager::{DidManager, ResourcePayload};
use crate::provider::Wallet;
use crate::resolver::{Resolver, ResolverClient};
use crate::{Error, Result, tracerr};

/// Resource types used for `AnonCreds` objects.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum ResourceType {
    /// A credential schema.
    #[serde(rename = "anonCredsSchema")]
    Schema,

    /// A credential definition.
    #[serde(rename = "anonCredsCredDef")]
    CredentialDefinition,

    /// A revocation registry definition.
    #[serde(rename = "anonCredsRevocRegDef")]
    RevocationRegistryDefinition,

    /// A revocation status list.
    #[serde(rename = "anonCredsStatusList")]
    StatusList,
}

impl ResourceType {
    /// The resource type tag published on the ledger.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Schema => "anonCredsSchema",
            Self::CredentialDefinition => "anonCredsCredDef",
            Self::RevocationRegistryDefinition => "anonCredsRevocRegDef",
            Self::StatusList => "anonCredsStatusList",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An `AnonCreds` object stored as the content of a DID-linked resource.
pub trait ResourceContent: Sized {
    /// Resource type of the object.
    const RESOURCE_TYPE: ResourceType;

    /// DID of the object's issuer.
    fn issuer_id(&self) -> &str;

    /// Resource content published to the ledger.
    fn content(&self) -> Value;

    /// Rebuild the object from resolved resource content.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not of the expected shape.
    fn from_content(issuer_id: &str, content: Value) -> Result<Self>;
}

/// Terminal state of a registration.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationState {
    /// The object was published.
    #[default]
    Finished,
}

/// State of a published object.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ObjectState<T> {
    /// Registration state.
    pub state: RegistrationState,

    /// Identifier of the published object: `<issuer>/resources/<resource ID>`.
    pub id: String,

    /// The published object.
    pub value: T,
}

/// Metadata describing how an object was registered.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct RegistrationMetadata {
    /// Registrar-assigned resource ID.
    pub resource_id: String,

    /// Name the resource was published with.
    pub resource_name: String,

    /// Type the resource was published with.
    pub resource_type: String,
}

/// Result of registering an `AnonCreds` object.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RegistrationResult<T> {
    /// The registrar job that published the object.
    pub job_id: Option<String>,

    /// State of the published object.
    pub state: ObjectState<T>,

    /// Registration details.
    pub registration_metadata: RegistrationMetadata,
}

/// A resolved `AnonCreds` object.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Resolved<T> {
    /// Identifier the object was resolved from.
    pub id: String,

    /// The object.
    pub value: T,

    /// Resolver-reported resource metadata.
    pub metadata: Map<String, Value>,
}

#[derive(Clone, Copy, Debug)]
enum Publish {
    Create,
    Update,
}

/// Registry of `AnonCreds` objects published as `did:cheqd` resources.
#[derive(Clone, Debug)]
pub struct AnonCredsRegistry<W, R = ResolverClient> {
    manager: DidManager<W, R>,
}

impl<W: Wallet, R: Resolver> AnonCredsRegistry<W, R> {
    /// Create a registry publishing through `manager`.
    pub const fn new(manager: DidManager<W, R>) -> Self {
        Self { manager }
    }

    /// The manager used to publish resources.
    pub const fn manager(&self) -> &DidManager<W, R> {
        &self.manager
    }

    // Publish `value` as a resource with the given name and version.
    async fn publish<T: ResourceContent>(
        &self, mode: Publish, name: String, version: String, value: T,
    ) -> Result<RegistrationResult<T>> {
        let issuer_id = value.issuer_id().to_string();
        let payload = ResourcePayload {
            name,
            resource_type: T::RESOURCE_TYPE.to_string(),
            version,
            data: value.content(),
        };

        let published = match mode {
            Publish::Create => self.manager.create_resource(&issuer_id, &payload).await?,
            Publish::Update => self.manager.update_resource(&issuer_id, &payload).await?,
        };

        Ok(RegistrationResult {
            job_id: published.job_id,
            state: ObjectState {
                state: RegistrationState::Finished,
                id: identifier::compose(&issuer_id, &published.resource_id),
                value,
            },
            registration_metadata: RegistrationMetadata {
                resource_id: published.resource_id,
                resource_name: payload.name,
                resource_type: payload.resource_type,
            },
        })
    }

    // Resolve `did_url` and rebuild the object it holds.
    async fn resolve<T: ResourceContent>(
        &self, did_url: &str, issuer_id: &str,
    ) -> Result<Resolved<T>> {
        let resolved = match self.manager.resolver().resolve_resource(did_url).await? {
            Some(resolved) if !resolved.resource.is_null() => resolved,
            _ => tracerr!(Error::ResourceNotFound(did_url.to_string())),
        };
        let value = T::from_content(issuer_id, resolved.resource)?;

        Ok(Resolved {
            id: did_url.to_string(),
            value,
            metadata: resolved.metadata,
        })
    }

    // Resolve an object by its `<issuer>/resources/<id>` identifier.
    async fn get<T: ResourceContent>(&self, id: &str) -> Result<Resolved<T>> {
        let (issuer_id, _) = identifier::split(id)?;
        self.resolve(id, &issuer_id).await
    }
}

// The resource name recorded in resolver metadata.
fn resource_name(metadata: &Map<String, Value>, id: &str) -> Result<String> {
    match metadata.get("resourceName").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(Error::InvalidResponse(format!("no resource name in metadata for {id}"))),
    }
}

// Deserialize resource content, naming the resource type on failure.
fn parse_content<T: serde::de::DeserializeOwned>(
    resource_type: ResourceType, content: Value,
) -> Result<T> {
    serde_json::from_value(content)
        .map_err(|e| Error::InvalidResponse(format!("{resource_type} content: {e}")))
}
