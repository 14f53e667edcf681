//! # Revocation Status Lists
//!
//! A status list is published as a new version of a single resource each time
//! it changes. All versions share the revocation registry definition's resource
//! name, so the list in force at a point in time is found by querying the
//! issuer's resources by name, type and time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{
    AnonCredsRegistry, Publish, RegistrationResult, Resolved, ResourceContent, ResourceType,
    parse_content, resource_name,
};
use crate::provider::Wallet;
use crate::resolver::Resolver;
use crate::{Error, Result, identifier, tracerr};

/// An `AnonCreds` revocation status list.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RevocationStatusList {
    /// DID of the issuer.
    pub issuer_id: String,

    /// Identifier of the revocation registry definition the list belongs to.
    pub rev_reg_def_id: String,

    /// One entry per credential index: `1` when revoked, `0` otherwise.
    pub revocation_list: Vec<u8>,

    /// Accumulator value for the list.
    pub current_accumulator: String,

    /// Epoch seconds at which the list took effect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Changes to apply to the current revocation status list.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RevListUpdate {
    /// Credential indexes to mark as revoked.
    pub revoked: Vec<u32>,

    /// Accumulator value after the revocations are applied.
    pub current_accumulator: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    revocation_list: Vec<u8>,
    current_accumulator: String,
    #[serde(default)]
    timestamp: Option<i64>,
}

impl ResourceContent for RevocationStatusList {
    const RESOURCE_TYPE: ResourceType = ResourceType::StatusList;

    fn issuer_id(&self) -> &str {
        &self.issuer_id
    }

    fn content(&self) -> Value {
        json!({
            "revocationList": self.revocation_list,
            "currentAccumulator": self.current_accumulator,
            "timestamp": self.timestamp,
        })
    }

    fn from_content(issuer_id: &str, content: Value) -> Result<Self> {
        let Content {
            revocation_list,
            current_accumulator,
            timestamp,
        } = parse_content(Self::RESOURCE_TYPE, content)?;
        // content does not name its registry; the resolving caller sets it
        Ok(Self {
            issuer_id: issuer_id.to_string(),
            rev_reg_def_id: String::new(),
            revocation_list,
            current_accumulator,
            timestamp,
        })
    }
}

impl RevocationStatusList {
    // Mark each index in `revoked` as revoked. The list is left untouched if
    // any index is out of range.
    fn revoke(&mut self, revoked: &[u32]) -> Result<()> {
        let size = self.revocation_list.len();
        let mut indexes = Vec::with_capacity(revoked.len());
        for &index in revoked {
            match usize::try_from(index) {
                Ok(i) if i < size => indexes.push(i),
                _ => {
                    return Err(Error::InvalidInput(format!(
                        "credential index {index} is outside a list of {size}"
                    )));
                }
            }
        }
        for i in indexes {
            self.revocation_list[i] = 1;
        }
        Ok(())
    }
}

impl<W: Wallet, R: Resolver> AnonCredsRegistry<W, R> {
    /// Publish the initial revocation status list for a revocation registry.
    ///
    /// The list is published under the registry definition's resource name
    /// and versioned by its timestamp, which defaults to now.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry definition cannot be resolved, its
    /// metadata has no resource name, or the resource cannot be published.
    pub async fn register_revocation_list(
        &self, mut status_list: RevocationStatusList,
    ) -> Result<RegistrationResult<RevocationStatusList>> {
        let rev_reg_def = self.get_revocation_registry_definition(&status_list.rev_reg_def_id).await?;
        let name = resource_name(&rev_reg_def.metadata, &rev_reg_def.id)?;

        let timestamp = *status_list.timestamp.get_or_insert_with(|| Utc::now().timestamp());
        self.publish(Publish::Create, name, timestamp.to_string(), status_list).await
    }

    /// Resolve the revocation status list in force at `timestamp` (epoch
    /// seconds), or the latest list when no timestamp is given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceNotFound`] if no list exists for the registry
    /// at that time, and any error resolving the registry definition.
    pub async fn get_revocation_list(
        &self, rev_reg_def_id: &str, timestamp: Option<i64>,
    ) -> Result<Resolved<RevocationStatusList>> {
        let (_, resolved) = self.status_list_at(rev_reg_def_id, timestamp).await?;
        Ok(resolved)
    }

    /// Revoke credentials by publishing a new version of the registry's
    /// current status list.
    ///
    /// The new version's timestamp is now, or one second after the current
    /// list's timestamp if that is later.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if an index is outside the list, and
    /// any error resolving the current list or publishing the new version.
    pub async fn update_revocation_list(
        &self, rev_reg_def_id: &str, update: RevListUpdate,
    ) -> Result<RegistrationResult<RevocationStatusList>> {
        let (name, current) = self.status_list_at(rev_reg_def_id, None).await?;

        let mut status_list = current.value;
        if let Err(e) = status_list.revoke(&update.revoked) {
            tracerr!(e, "revoking in {rev_reg_def_id}");
        }
        status_list.current_accumulator = update.current_accumulator;

        let now = Utc::now().timestamp();
        let timestamp = match status_list.timestamp {
            None => now,
            Some(prev) => {
                let Some(next) = prev.checked_add(1) else {
                    tracerr!(Error::InvalidResponse(format!(
                        "status list timestamp {prev} cannot be advanced"
                    )));
                };
                now.max(next)
            }
        };
        status_list.timestamp = Some(timestamp);
        tracing::debug!(rev_reg_def_id, timestamp, revoked = update.revoked.len(), "updating status list");

        self.publish(Publish::Update, name, timestamp.to_string(), status_list).await
    }

    // Resolve the status list in force at `timestamp`, returning it with the
    // resource name its versions share.
    async fn status_list_at(
        &self, rev_reg_def_id: &str, timestamp: Option<i64>,
    ) -> Result<(String, Resolved<RevocationStatusList>)> {
        let rev_reg_def = self.get_revocation_registry_definition(rev_reg_def_id).await?;
        let name = resource_name(&rev_reg_def.metadata, &rev_reg_def.id)?;
        let (issuer_id, _) = identifier::split(rev_reg_def_id)?;

        let epoch = timestamp.unwrap_or_else(|| Utc::now().timestamp());
        let Some(at) = DateTime::<Utc>::from_timestamp(epoch, 0) else {
            tracerr!(Error::InvalidInput(format!("timestamp {epoch} is out of range")));
        };
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("resourceType", ResourceType::StatusList.as_str())
            .append_pair("resourceName", &name)
            .append_pair("resourceTime", &at.format("%Y-%m-%dT%H:%M:%SZ").to_string())
            .finish();
        let did_url = format!("{issuer_id}?{query}");

        let mut resolved: Resolved<RevocationStatusList> = self.resolve(&did_url, &issuer_id).await?;
        resolved.value.rev_reg_def_id = rev_reg_def_id.to_string();
        if resolved.value.timestamp.is_none() {
            resolved.value.timestamp = Some(epoch);
        }
        Ok((name, resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_list(entries: Vec<u8>) -> RevocationStatusList {
        RevocationStatusList {
            issuer_id: "did:cheqd:testnet:123".to_string(),
            rev_reg_def_id: "did:cheqd:testnet:123/resources/456".to_string(),
            revocation_list: entries,
            current_accumulator: "21 124C59".to_string(),
            timestamp: Some(1_666_666_666),
        }
    }

    #[test]
    fn content_omits_ids() {
        let content = status_list(vec![0, 1, 0]).content();
        assert_eq!(
            content,
            json!({
                "revocationList": [0, 1, 0],
                "currentAccumulator": "21 124C59",
                "timestamp": 1_666_666_666,
            })
        );
    }

    #[test]
    fn revoke_sets_entries() {
        let mut list = status_list(vec![0, 0, 0, 0]);
        list.revoke(&[1, 3]).expect("should revoke");
        assert_eq!(list.revocation_list, vec![0, 1, 0, 1]);

        // revoking twice is a no-op
        list.revoke(&[1]).expect("should revoke");
        assert_eq!(list.revocation_list, vec![0, 1, 0, 1]);
    }

    #[test]
    fn revoke_out_of_range() {
        let mut list = status_list(vec![0, 0, 0]);
        let err = list.revoke(&[3]).expect_err("should fail");
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(list.revocation_list, vec![0, 0, 0]);
    }
}
