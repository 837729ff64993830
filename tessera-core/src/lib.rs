//! Tessera Core - Server-side passkey (WebAuthn) ceremony validation
//!
//! This crate implements the Relying Party side of WebAuthn: generating
//! ceremony options, validating attestation and assertion responses from the
//! browser, and managing the stored credentials they produce.
//!
//! # Features
//!
//! - Registration (attestation) and authentication (assertion) ceremonies
//! - ES256 (ECDSA P-256) and Ed25519 credential keys
//! - "none" and "packed" self-attestation statement formats
//! - Signature-counter regression detection against cloned authenticators
//! - Single-use, expiring pending-ceremony state
//! - Pluggable credential storage with an in-memory reference store
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tessera_core::{MemoryCredentialStore, RelyingParty, Tessera, UserHandle};
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let origin = Url::parse("https://example.com")?;
//! let rp = RelyingParty::new("example.com", &origin, "Example App")?;
//! let engine = Tessera::new(rp, Arc::new(MemoryCredentialStore::new()));
//!
//! let user = UserHandle {
//!     id: b"user-1".to_vec(),
//!     name: "ada@example.com".into(),
//!     display_name: "Ada Lovelace".into(),
//! };
//!
//! // Hand `started.options` to navigator.credentials.create() in the
//! // browser, then finish with the JSON credential it returns.
//! let started = engine.start_registration(&user)?;
//! let record = engine
//!     .finish_registration(&started.ceremony_token, "<browser json>", None)
//!     .await?;
//! println!("registered credential {}", record.credential_id_hex());
//! # Ok(())
//! # }
//! ```

pub mod attestation;
pub mod authenticator_data;
pub mod ceremony;
pub mod challenge;
pub mod config;
pub mod cose;
pub mod engine;
pub mod error;
pub mod pending;
pub mod signature;
pub mod store;

// Re-export main types for convenience
pub use attestation::{AttestationFormat, AttestationObject};
pub use authenticator_data::{AttestedCredentialData, AuthenticatorData};
pub use ceremony::{
    verify_authentication, verify_registration, AuthenticationOutcome, RegistrationOutcome,
};
pub use challenge::{
    authentication_options, generate_challenge, registration_options, OptionsError, UserHandle,
    CHALLENGE_LEN, MAX_USER_HANDLE_LEN,
};
pub use config::{ConfigError, RelyingParty, RelyingPartyBuilder, DEFAULT_TIMEOUT_MS};
pub use cose::{CoseAlgorithm, CoseKey};
pub use engine::{AuthenticatedPasskey, StartedAuthentication, StartedRegistration, Tessera};
pub use error::{CeremonyError, Result};
pub use pending::{PendingCeremonies, PENDING_EXPIRY_SECS};
pub use store::{CredentialRecord, CredentialStore, MemoryCredentialStore, StoreError};

/// Wire types, re-exported so downstream crates need only one dependency.
pub use tessera_proto as proto;
