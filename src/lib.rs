//! # `did:cheqd` Registration
//!
//! Registers `did:cheqd` DIDs and DID-linked resources through a remote
//! [DID registrar](https://identity.foundation/did-registration/). The registrar
//! assembles and broadcasts ledger transactions; signatures over the payloads it
//! requests are produced locally by a [`Wallet`] so private keys never leave the
//! caller.
//!
//! Each operation is a job: the registrar answers with `action` (sign these
//! payloads), `finished`, or `error`. [`DidManager`] drives that loop for DID
//! documents and resources, and [`anoncreds::AnonCredsRegistry`] maps `AnonCreds`
//! objects onto resource jobs.

pub mod anoncreds;
mod config;
mod error;
pub mod identifier;
pub mod job;
mod manager;
mod provider;
mod registrar;
mod resolver;

pub use self::config::*;
pub use self::error::Error;
pub use self::manager::*;
pub use self::provider::*;
pub use self::registrar::*;
pub use self::resolver::*;

/// Result type for registration operations.
pub type Result<T, E = Error> = core::result::Result<T, E>;

#[doc(hidden)]
pub mod __private {
    pub use tracing;
}
