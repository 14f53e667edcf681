//! # Schemas

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{
    AnonCredsRegistry, Publish, RegistrationResult, Resolved, ResourceContent, ResourceType,
    parse_content,
};
use crate::Result;
use crate::provider::Wallet;
use crate::resolver::Resolver;

/// An `AnonCreds` credential schema.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// DID of the schema issuer.
    pub issuer_id: String,

    /// Attribute names.
    pub attr_names: Vec<String>,

    /// Schema name.
    pub name: String,

    /// Schema version.
    pub version: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    attr_names: Vec<String>,
    name: String,
    version: String,
}

impl ResourceContent for Schema {
    const RESOURCE_TYPE: ResourceType = ResourceType::Schema;

    fn issuer_id(&self) -> &str {
        &self.issuer_id
    }

    fn content(&self) -> Value {
        json!({
            "attrNames": self.attr_names,
            "name": self.name,
            "version": self.version,
        })
    }

    fn from_content(issuer_id: &str, content: Value) -> Result<Self> {
        let Content {
            attr_names,
            name,
            version,
        } = parse_content(Self::RESOURCE_TYPE, content)?;
        Ok(Self {
            issuer_id: issuer_id.to_string(),
            attr_names,
            name,
            version,
        })
    }
}

impl<W: Wallet, R: Resolver> AnonCredsRegistry<W, R> {
    /// Publish a schema under its issuer's DID.
    ///
    /// # Errors
    ///
    /// Returns any error raised while publishing the resource.
    pub async fn register_schema(&self, schema: Schema) -> Result<RegistrationResult<Schema>> {
        let name = schema.name.clone();
        let version = schema.version.clone();
        self.publish(Publish::Create, name, version, schema).await
    }

    /// Resolve a schema by its resource identifier.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ResourceNotFound`] if no schema exists at
    /// `schema_id`.
    pub async fn get_schema(&self, schema_id: &str) -> Result<Resolved<Schema>> {
        self.get(schema_id).await
    }
}
