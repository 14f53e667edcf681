//! # Identifiers
//!
//! A DID-linked resource is addressed as `<issuer DID>/resources/<resource ID>`.
//! The resource ID alone is meaningless outside its issuer's namespace.

use std::sync::LazyLock;

use regex::Regex;

use crate::{Error, Result};

/// Path segment separating an issuer DID from a resource ID.
pub const RESOURCES_PATH: &str = "/resources/";

const DID_PREFIX: &str = "did:cheqd:";

static SUPPORTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^did:cheqd:(testnet|mainnet):",
        r"([a-zA-Z0-9]{21,22}|[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})",
        r"(/resources/[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})?",
        r"(\?.+)?$"
    ))
    .unwrap_or_else(|e| panic!("invalid identifier pattern: {e}"))
});

/// Compose the identifier of a resource published under `issuer_id`.
#[must_use]
pub fn compose(issuer_id: &str, resource_id: &str) -> String {
    format!("{issuer_id}{RESOURCES_PATH}{resource_id}")
}

/// Split a resource identifier into issuer DID and resource ID.
///
/// The issuer is the first `/`-separated segment and the resource ID the last;
/// any segments between are discarded.
///
/// # Errors
///
/// Returns [`Error::InvalidIdentifier`] if the identifier has no path segments
/// or either part is empty.
pub fn split(full_id: &str) -> Result<(String, String)> {
    let mut parts = full_id.split('/');
    let issuer = parts.next().unwrap_or_default();
    let Some(resource) = parts.next_back() else {
        return Err(Error::InvalidIdentifier(full_id.to_string()));
    };
    if issuer.is_empty() || resource.is_empty() {
        return Err(Error::InvalidIdentifier(full_id.to_string()));
    }
    Ok((issuer.to_string(), resource.to_string()))
}

/// The network segment of a `did:cheqd` DID or DID URL.
///
/// # Errors
///
/// Returns [`Error::InvalidIdentifier`] if `did` is not a `did:cheqd` DID.
pub fn network(did: &str) -> Result<&str> {
    let Some(rest) = did.strip_prefix(DID_PREFIX) else {
        return Err(Error::InvalidIdentifier(format!("{did} is not a did:cheqd DID")));
    };
    match rest.split_once(':') {
        Some((network, _)) if !network.is_empty() => Ok(network),
        _ => Err(Error::InvalidIdentifier(format!("{did} has no network"))),
    }
}

/// Whether `id` is a DID, resource identifier or DID URL this crate handles.
#[must_use]
pub fn is_supported(id: &str) -> bool {
    SUPPORTED.is_match(id)
}
