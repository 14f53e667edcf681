//! # Credential Definitions

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{
    AnonCredsRegistry, Publish, RegistrationResult, Resolved, ResourceContent, ResourceType,
    parse_content,
};
use crate::Result;
use crate::provider::Wallet;
use crate::resolver::Resolver;

/// An `AnonCreds` credential definition.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDefinition {
    /// DID of the issuer.
    pub issuer_id: String,

    /// Identifier of the schema the definition is for.
    pub schema_id: String,

    /// Signature type, typically `CL`.
    #[serde(rename = "type")]
    pub signature_type: String,

    /// Tag distinguishing definitions for the same schema.
    pub tag: String,

    /// Public key material of the definition.
    pub value: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    schema_id: String,
    #[serde(rename = "type")]
    signature_type: String,
    tag: String,
    value: Value,
}

impl ResourceContent for CredentialDefinition {
    const RESOURCE_TYPE: ResourceType = ResourceType::CredentialDefinition;

    fn issuer_id(&self) -> &str {
        &self.issuer_id
    }

    fn content(&self) -> Value {
        json!({
            "type": self.signature_type,
            "tag": self.tag,
            "value": self.value,
            "schemaId": self.schema_id,
        })
    }

    fn from_content(issuer_id: &str, content: Value) -> Result<Self> {
        let Content {
            schema_id,
            signature_type,
            tag,
            value,
        } = parse_content(Self::RESOURCE_TYPE, content)?;
        Ok(Self {
            issuer_id: issuer_id.to_string(),
            schema_id,
            signature_type,
            tag,
            value,
        })
    }
}

impl<W: Wallet, R: Resolver> AnonCredsRegistry<W, R> {
    /// Publish a credential definition under its issuer's DID.
    ///
    /// The resource is named `<schema name>-<tag>`, so the referenced schema is
    /// resolved first.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be resolved or the resource
    /// cannot be published.
    pub async fn register_credential_definition(
        &self, cred_def: CredentialDefinition,
    ) -> Result<RegistrationResult<CredentialDefinition>> {
        let schema = self.get_schema(&cred_def.schema_id).await?;
        let name = format!("{}-{}", schema.value.name, cred_def.tag);
        let version = cred_def.tag.clone();
        self.publish(Publish::Create, name, version, cred_def).await
    }

    /// Resolve a credential definition by its resource identifier.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ResourceNotFound`] if no credential definition
    /// exists at `cred_def_id`.
    pub async fn get_credential_definition(
        &self, cred_def_id: &str,
    ) -> Result<Resolved<CredentialDefinition>> {
        self.get(cred_def_id).await
    }
}
