//! Credential storage.
//!
//! Registered credentials outlive server restarts, so they sit behind the
//! [`CredentialStore`] trait and the embedding application picks the backend.
//! The crate ships [`MemoryCredentialStore`] as the reference implementation
//! and development fallback.

mod memory;

pub use memory::MemoryCredentialStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attestation::AttestationFormat;
use crate::cose::CoseAlgorithm;

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record with this credential ID already exists.
    #[error("Credential ID already registered")]
    Conflict,

    /// No record with this credential ID.
    #[error("Credential not found")]
    NotFound,

    /// Compare-and-set lost: the stored counter moved underneath the caller.
    #[error("Stale sign count: stored {stored}, expected {expected}")]
    StaleCounter { stored: u32, expected: u32 },

    /// Backend unreachable or failing; safe to retry.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// A registered credential as persisted.
///
/// Serializes cleanly with serde, so durable backends can keep the whole
/// record as a JSON column keyed by `credential_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Raw credential ID, the unique lookup key.
    pub credential_id: Vec<u8>,
    /// Opaque account reference this credential belongs to.
    pub owner_user_id: Vec<u8>,
    /// COSE_Key bytes, verbatim from registration.
    pub public_key: Vec<u8>,
    pub algorithm: CoseAlgorithm,
    pub sign_count: u32,
    pub transports: Vec<String>,
    pub attestation_format: AttestationFormat,
    pub aaguid: Uuid,
    pub backup_eligible: bool,
    pub backup_state: bool,
    /// Whether the user was verified when the credential was registered.
    pub user_verified: bool,
    /// Demand the UV flag on every assertion with this credential.
    pub require_user_verification: bool,
    /// Display label chosen by the user ("Pixel 9", "YubiKey 5C", ...).
    pub friendly_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl CredentialRecord {
    /// Hex form of the credential ID for logs.
    pub fn credential_id_hex(&self) -> String {
        hex::encode(&self.credential_id)
    }
}

/// Persistence contract for registered credentials.
///
/// `save` and `update_sign_count` must be atomic: of two concurrent saves of
/// the same ID exactly one succeeds, and the counter update is a
/// compare-and-set against the previously read value, never a blind
/// overwrite. A failed operation must leave no partial state.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a credential by its raw ID.
    async fn find_by_credential_id(
        &self,
        credential_id: &[u8],
    ) -> Result<Option<CredentialRecord>, StoreError>;

    /// Persist a newly registered credential.
    ///
    /// Returns [`StoreError::Conflict`] when the ID is already taken.
    async fn save(&self, record: CredentialRecord) -> Result<(), StoreError>;

    /// Compare-and-set the signature counter, refreshing `last_used_at`.
    ///
    /// Fails with [`StoreError::StaleCounter`] when the stored counter no
    /// longer equals `previous` (a concurrent assertion won the race).
    async fn update_sign_count(
        &self,
        credential_id: &[u8],
        previous: u32,
        new: u32,
    ) -> Result<(), StoreError>;

    /// All credentials registered to one account.
    async fn find_by_owner(
        &self,
        owner_user_id: &[u8],
    ) -> Result<Vec<CredentialRecord>, StoreError>;

    /// Remove a credential. Returns whether anything was deleted.
    async fn delete(&self, credential_id: &[u8]) -> Result<bool, StoreError>;
}
