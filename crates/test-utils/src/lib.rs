//! Key management

use std::sync::Mutex;

use anyhow::{anyhow, bail};
use base64ct::{Base64, Encoding};
use credibil_cheqd::{Signer, SigningRequest, SigningResponse, Wallet};
use dashmap::DashMap;
use ed25519_dalek::{Signer as _, SigningKey};
use rand::rngs::OsRng;

/// An in-memory [`Wallet`] holding Ed25519 keys.
#[derive(Debug, Default)]
pub struct Keyring {
    // signing keys by hex-encoded verkey
    keys: DashMap<String, SigningKey>,
    // verkeys by registrar-assigned key ID
    kids: DashMap<String, String>,
    signed: Mutex<Vec<SigningRequest>>,
    unavailable: bool,
}

impl Keyring {
    /// Create an empty keyring.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a keyring whose signer always fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Requests signed so far, in the order received.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    #[must_use]
    pub fn signed(&self) -> Vec<SigningRequest> {
        self.signed.lock().expect("should lock").clone()
    }

    /// Hex-encoded verkey bound to `kid`, if any.
    #[must_use]
    pub fn verkey(&self, kid: &str) -> Option<String> {
        self.kids.get(kid).map(|v| v.value().clone())
    }

    fn signing_key(&self, kid: &str) -> anyhow::Result<SigningKey> {
        let verkey = self.kids.get(kid).ok_or_else(|| anyhow!("no key bound to {kid}"))?;
        let key = self.keys.get(verkey.value()).ok_or_else(|| anyhow!("key not found"))?;
        Ok(key.value().clone())
    }
}

impl Signer for Keyring {
    async fn sign(&self, requests: &[SigningRequest]) -> anyhow::Result<Vec<SigningResponse>> {
        if self.unavailable {
            bail!("signer unavailable");
        }
        self.signed.lock().map_err(|_| anyhow!("lock poisoned"))?.extend_from_slice(requests);

        let mut responses = Vec::with_capacity(requests.len());
        for req in requests {
            let signing_key = self.signing_key(&req.kid)?;
            // registrars send base64 payloads; fall back to the raw string
            let msg = Base64::decode_vec(&req.serialized_payload)
                .unwrap_or_else(|_| req.serialized_payload.as_bytes().to_vec());
            let signature = signing_key.sign(&msg);
            responses.push(SigningResponse {
                kid: req.kid.clone(),
                signature: Base64::encode_string(&signature.to_bytes()),
            });
        }
        Ok(responses)
    }
}

impl Wallet for Keyring {
    async fn create_key(&self, seed: Option<&str>) -> anyhow::Result<Vec<u8>> {
        let signing_key = match seed {
            Some(seed) => {
                let secret: ed25519_dalek::SecretKey = seed
                    .as_bytes()
                    .try_into()
                    .map_err(|_| anyhow!("seed must be 32 bytes"))?;
                SigningKey::from_bytes(&secret)
            }
            None => SigningKey::generate(&mut OsRng),
        };
        let verkey = signing_key.verifying_key().as_bytes().to_vec();
        self.keys.insert(hex::encode(&verkey), signing_key);
        Ok(verkey)
    }

    async fn assign_kid(&self, verkey: &[u8], kid: &str) -> anyhow::Result<()> {
        let verkey = hex::encode(verkey);
        if !self.keys.contains_key(&verkey) {
            bail!("key not found");
        }
        self.kids.insert(kid.to_string(), verkey);
        Ok(())
    }
}
