//! In-memory credential store.
//!
//! Reference implementation and development fallback; records are lost on
//! restart. Durable deployments implement [`CredentialStore`] over their
//! database instead.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{CredentialRecord, CredentialStore, StoreError};

/// Credentials keyed by raw credential ID.
#[derive(Default)]
pub struct MemoryCredentialStore {
    records: DashMap<Vec<u8>, CredentialRecord>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored credentials
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_credential_id(
        &self,
        credential_id: &[u8],
    ) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self
            .records
            .get(credential_id)
            .map(|entry| entry.value().clone()))
    }

    async fn save(&self, record: CredentialRecord) -> Result<(), StoreError> {
        match self.records.entry(record.credential_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn update_sign_count(
        &self,
        credential_id: &[u8],
        previous: u32,
        new: u32,
    ) -> Result<(), StoreError> {
        // get_mut holds the shard write lock, making the compare-and-set atomic
        let mut record = self
            .records
            .get_mut(credential_id)
            .ok_or(StoreError::NotFound)?;
        if record.sign_count != previous {
            return Err(StoreError::StaleCounter {
                stored: record.sign_count,
                expected: previous,
            });
        }
        record.sign_count = new;
        record.last_used_at = Some(Utc::now());
        Ok(())
    }

    async fn find_by_owner(
        &self,
        owner_user_id: &[u8],
    ) -> Result<Vec<CredentialRecord>, StoreError> {
        Ok(self
            .records
            .iter()
            .filter(|entry| entry.owner_user_id == owner_user_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn delete(&self, credential_id: &[u8]) -> Result<bool, StoreError> {
        Ok(self.records.remove(credential_id).is_some())
    }
}

impl std::fmt::Debug for MemoryCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCredentialStore")
            .field("records", &self.records.len())
            .finish()
    }
}
