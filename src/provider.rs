//! # Provider Traits
//!
//! Key management is external to this crate. A host supplies a [`Wallet`] that
//! creates keys and signs the payloads the registrar asks for, and optionally
//! its own [`Resolver`](crate::Resolver) implementation.

use std::future::Future;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A payload the registrar requires a signature over before it will proceed.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SigningRequest {
    /// Key ID (DID URL) of the key that must sign.
    pub kid: String,

    /// Payload to sign, as supplied by the registrar. Signers must sign the
    /// decoded bytes exactly as received.
    pub serialized_payload: String,
}

/// A signature produced for a [`SigningRequest`].
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct SigningResponse {
    /// Key ID of the key that signed.
    pub kid: String,

    /// Encoded signature.
    pub signature: String,
}

/// [`Signer`] signs batches of registrar signing requests using locally held
/// key material, independent of key algorithm.
pub trait Signer: Send + Sync {
    /// Sign each request with the key it names, returning one response per
    /// request.
    fn sign(
        &self, requests: &[SigningRequest],
    ) -> impl Future<Output = Result<Vec<SigningResponse>>> + Send;
}

/// [`Wallet`] extends [`Signer`] with the key management needed to create a
/// new DID.
pub trait Wallet: Signer {
    /// Create an Ed25519 key, optionally derived from `seed`, returning the raw
    /// public key bytes.
    fn create_key(&self, seed: Option<&str>) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Bind a registrar-assigned key ID to a key created with
    /// [`Wallet::create_key`].
    fn assign_kid(&self, verkey: &[u8], kid: &str) -> impl Future<Output = Result<()>> + Send;
}
