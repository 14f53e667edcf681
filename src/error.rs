//! # Registration Errors
//!
//! This module defines the error type returned by every registrar, resolver and resource
//! registry operation. No operation retries internally: each error surfaces to the immediate
//! caller with the context (reason, job ID, status code) needed to decide whether to try again.

use thiserror::Error;

/// Log an error with tracing and return it from the enclosing function.
///
/// # Example
/// ```
/// use credibil_cheqd::{tracerr, Error, Result};
///
/// fn not_found(did: &str) -> Result<()> {
///     tracerr!(Error::DidNotFound(did.to_string()))
/// }
///
/// fn with_msg(did: &str) -> Result<()> {
///     tracerr!(Error::DidNotFound(did.to_string()), "resolving {did}")
/// }
/// ```
#[macro_export]
macro_rules! tracerr {
    // with context
    ($err:expr, $($msg:tt)*) => {
        {
        let err: $crate::Error = $err;
        $crate::__private::tracing::error!(error = %err, $($msg)*);
        return Err(err);
        }
    };
    // no context
    ($err:expr) => {
        {
        let err: $crate::Error = $err;
        $crate::__private::tracing::error!("{err}");
        return Err(err);
        }
    }
}

/// Errors raised while orchestrating DID and resource registration.
#[derive(Error, Debug)]
pub enum Error {
    /// The registrar did not return a usable draft DID document.
    #[error("Error constructing DID Document")]
    DocumentConstruction,

    /// Key material was supplied in a way the configuration does not allow.
    #[error("Insecure seed is not allowed")]
    KeyPolicy,

    /// The registrar asked for action but supplied nothing to sign.
    #[error("No signing requests available for {operation}.")]
    NoSigningRequests {
        /// The operation being performed (`create`, `update`, ...).
        operation: String,
    },

    /// The wallet failed to sign one or more signing requests.
    #[error("signing failed: {0}")]
    Signing(String),

    /// The wallet failed to create or bind key material.
    #[error("wallet error: {0}")]
    Wallet(String),

    /// The registrar reported a terminal error state for the job.
    #[error("registrar {operation} job failed: {reason}")]
    Registration {
        /// The operation being performed.
        operation: String,
        /// The registrar job ID, when one was assigned.
        job_id: Option<String>,
        /// Reason reported by the registrar, verbatim.
        reason: String,
    },

    /// The DID is deactivated or could not be resolved.
    #[error("DID is already deactivated or not found: {0}")]
    DidNotFound(String),

    /// The DID-linked resource could not be resolved.
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// A collaborator returned a non-success HTTP status.
    #[error("request to {url} failed with status {status}")]
    Transport {
        /// The URL requested.
        url: String,
        /// The HTTP status code returned.
        status: u16,
    },

    /// A request could not be sent or its response could not be read.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The registrar kept asking for signatures beyond the configured limit.
    #[error("job {job_id} still awaiting action after {rounds} signing rounds")]
    ProtocolExhausted {
        /// The registrar job ID.
        job_id: String,
        /// The number of signing rounds completed.
        rounds: usize,
    },

    /// The operation is not supported for `did:cheqd`.
    #[error("{0}")]
    NotSupported(String),

    /// An identifier was not of the expected form.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A caller-supplied value is out of range or inconsistent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A collaborator response could not be interpreted.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration could not be loaded or is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Short machine-readable code for the error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DocumentConstruction => "document_construction_error",
            Self::KeyPolicy => "key_policy_error",
            Self::NoSigningRequests { .. } => "no_signing_requests",
            Self::Signing(_) => "signing_error",
            Self::Wallet(_) => "wallet_error",
            Self::Registration { .. } => "registration_error",
            Self::DidNotFound(_) => "did_not_found",
            Self::ResourceNotFound(_) => "resource_not_found",
            Self::Transport { .. } | Self::Request(_) => "transport_error",
            Self::ProtocolExhausted { .. } => "protocol_exhausted",
            Self::NotSupported(_) => "not_supported",
            Self::InvalidIdentifier(_) => "invalid_identifier",
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidResponse(_) => "invalid_response",
            Self::Config(_) => "invalid_config",
            Self::Serialization(_) => "serialization_error",
        }
    }

    /// Whether the error originates with the caller's key material or wallet.
    ///
    /// A route layer maps these to a client-error status and everything else to a
    /// server-error status.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::KeyPolicy | Self::Signing(_) | Self::Wallet(_))
    }

    /// The registrar job ID associated with the error, if any.
    #[must_use]
    pub fn job_id(&self) -> Option<&str> {
        match self {
            Self::Registration { job_id, .. } => job_id.as_deref(),
            Self::ProtocolExhausted { job_id, .. } => Some(job_id),
            _ => None,
        }
    }

    /// Transfer the error to `OAuth2` compatible format.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.code(),
            "error_description": self.to_string(),
        })
    }
}
