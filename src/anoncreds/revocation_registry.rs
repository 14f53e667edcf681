//! # Revocation Registry Definitions

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{
    AnonCredsRegistry, Publish, RegistrationResult, Resolved, ResourceContent, ResourceType,
    parse_content, resource_name,
};
use crate::Result;
use crate::provider::Wallet;
use crate::resolver::Resolver;

/// An `AnonCreds` revocation registry definition.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRegistryDefinition {
    /// DID of the issuer.
    pub issuer_id: String,

    /// Registry type, typically `CL_ACCUM`.
    pub revoc_def_type: String,

    /// Identifier of the credential definition the registry belongs to.
    pub cred_def_id: String,

    /// Tag distinguishing registries for the same credential definition.
    pub tag: String,

    /// Registry parameters (public keys, size, tails location).
    pub value: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    revoc_def_type: String,
    cred_def_id: String,
    tag: String,
    value: Value,
}

impl ResourceContent for RevocationRegistryDefinition {
    const RESOURCE_TYPE: ResourceType = ResourceType::RevocationRegistryDefinition;

    fn issuer_id(&self) -> &str {
        &self.issuer_id
    }

    fn content(&self) -> Value {
        json!({
            "revocDefType": self.revoc_def_type,
            "tag": self.tag,
            "value": self.value,
            "credDefId": self.cred_def_id,
        })
    }

    fn from_content(issuer_id: &str, content: Value) -> Result<Self> {
        let Content {
            revoc_def_type,
            cred_def_id,
            tag,
            value,
        } = parse_content(Self::RESOURCE_TYPE, content)?;
        Ok(Self {
            issuer_id: issuer_id.to_string(),
            revoc_def_type,
            cred_def_id,
            tag,
            value,
        })
    }
}

impl<W: Wallet, R: Resolver> AnonCredsRegistry<W, R> {
    /// Publish a revocation registry definition under its issuer's DID.
    ///
    /// The resource is named `<credential definition resource name>-<tag>`,
    /// using the name the credential definition was published with.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential definition cannot be resolved, its
    /// metadata has no resource name, or the resource cannot be published.
    pub async fn register_revocation_registry_definition(
        &self, rev_reg_def: RevocationRegistryDefinition,
    ) -> Result<RegistrationResult<RevocationRegistryDefinition>> {
        let cred_def = self.get_credential_definition(&rev_reg_def.cred_def_id).await?;
        let cred_def_name = resource_name(&cred_def.metadata, &cred_def.id)?;
        let name = format!("{cred_def_name}-{}", rev_reg_def.tag);
        let version = rev_reg_def.tag.clone();
        self.publish(Publish::Create, name, version, rev_reg_def).await
    }

    /// Resolve a revocation registry definition by its resource identifier.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ResourceNotFound`] if no definition exists at
    /// `rev_reg_def_id`.
    pub async fn get_revocation_registry_definition(
        &self, rev_reg_def_id: &str,
    ) -> Result<Resolved<RevocationRegistryDefinition>> {
        self.get(rev_reg_def_id).await
    }
}
