//! Ceremony engine.
//!
//! [`Tessera`] ties the pieces together: it owns the Relying Party
//! configuration, the pending-ceremony store, and a credential store, and
//! exposes start/finish pairs for both ceremonies plus credential
//! management. Start mints options and a correlation token; finish consumes
//! the token (exactly once, success or failure), validates the submission,
//! and persists the result.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use tessera_proto::{
    CreationChallengeResponse, PublicKeyCredential, PublicKeyCredentialDescriptor,
    RequestChallengeResponse,
};

use crate::ceremony::{verify_authentication, verify_registration};
use crate::challenge::{authentication_options, registration_options, OptionsError, UserHandle};
use crate::config::RelyingParty;
use crate::error::CeremonyError;
use crate::pending::PendingCeremonies;
use crate::store::{CredentialRecord, CredentialStore, MemoryCredentialStore, StoreError};

/// A freshly started registration ceremony.
#[derive(Debug, Clone)]
pub struct StartedRegistration {
    /// Correlation token the client must echo when finishing.
    pub ceremony_token: String,
    /// Options to hand to `navigator.credentials.create()`.
    pub options: CreationChallengeResponse,
}

/// A freshly started authentication ceremony.
#[derive(Debug, Clone)]
pub struct StartedAuthentication {
    pub ceremony_token: String,
    /// Options to hand to `navigator.credentials.get()`.
    pub options: RequestChallengeResponse,
}

/// A finished authentication: whose passkey signed in.
#[derive(Debug, Clone)]
pub struct AuthenticatedPasskey {
    pub owner_user_id: Vec<u8>,
    pub credential_id: Vec<u8>,
    pub sign_count: u32,
    pub user_verified: bool,
}

/// Passkey ceremony engine.
pub struct Tessera {
    rp: RelyingParty,
    pending: PendingCeremonies,
    store: Arc<dyn CredentialStore>,
}

impl Tessera {
    pub fn new(rp: RelyingParty, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            rp,
            pending: PendingCeremonies::new(),
            store,
        }
    }

    /// Engine backed by [`MemoryCredentialStore`], for tests and single-node
    /// deployments that accept losing credentials on restart.
    pub fn in_memory(rp: RelyingParty) -> Self {
        Self::new(rp, Arc::new(MemoryCredentialStore::new()))
    }

    pub fn relying_party(&self) -> &RelyingParty {
        &self.rp
    }

    /// Mint creation options for `user` and stash them under a fresh
    /// ceremony token.
    pub fn start_registration(
        &self,
        user: &UserHandle,
    ) -> Result<StartedRegistration, OptionsError> {
        let options = registration_options(&self.rp, user, Vec::new())?;
        let ceremony_token = Uuid::new_v4().to_string();
        self.pending
            .store_registration(ceremony_token.clone(), options.clone());

        tracing::info!(
            ceremony = %ceremony_token,
            user = %hex::encode(&user.id),
            "Registration ceremony started"
        );

        Ok(StartedRegistration {
            ceremony_token,
            options: CreationChallengeResponse {
                public_key: options,
            },
        })
    }

    /// Validate an attestation submission and persist the new credential.
    ///
    /// `submission` is the JSON credential from the browser; the pending
    /// ceremony under `ceremony_token` is consumed whether or not validation
    /// succeeds, so a rejected attempt cannot be replayed.
    pub async fn finish_registration(
        &self,
        ceremony_token: &str,
        submission: &str,
        friendly_name: Option<String>,
    ) -> Result<CredentialRecord, CeremonyError> {
        let result = self
            .finish_registration_inner(ceremony_token, submission, friendly_name)
            .await;
        if let Err(err) = &result {
            log_rejection("registration", ceremony_token, err);
        }
        result
    }

    async fn finish_registration_inner(
        &self,
        ceremony_token: &str,
        submission: &str,
        friendly_name: Option<String>,
    ) -> Result<CredentialRecord, CeremonyError> {
        let options = self
            .pending
            .take_registration(ceremony_token)
            .ok_or(CeremonyError::ChallengeMismatch)?;

        let credential = PublicKeyCredential::from_json(submission)?;
        let outcome = verify_registration(&self.rp, &options, &credential)?;

        let record = CredentialRecord {
            credential_id: outcome.credential_id,
            owner_user_id: options.user.id.into_inner(),
            public_key: outcome.public_key_bytes,
            algorithm: outcome.algorithm,
            sign_count: outcome.sign_count,
            transports: outcome.transports,
            attestation_format: outcome.attestation_format,
            aaguid: outcome.aaguid,
            backup_eligible: outcome.backup_eligible,
            backup_state: outcome.backup_state,
            user_verified: outcome.user_verified,
            require_user_verification: self.rp.user_verification_required(),
            friendly_name,
            created_at: Utc::now(),
            last_used_at: None,
        };

        self.store
            .save(record.clone())
            .await
            .map_err(|err| match err {
                StoreError::Conflict => CeremonyError::DuplicateCredential,
                other => CeremonyError::StoreUnavailable(other.to_string()),
            })?;

        tracing::info!(
            credential_id = %record.credential_id_hex(),
            owner = %hex::encode(&record.owner_user_id),
            "Registration ceremony completed"
        );

        Ok(record)
    }

    /// Mint request options and stash them under a fresh ceremony token.
    ///
    /// An empty `allow` list starts a username-less ceremony: the browser
    /// offers any discoverable credential for this RP.
    pub fn start_authentication(
        &self,
        allow: Vec<PublicKeyCredentialDescriptor>,
    ) -> StartedAuthentication {
        let options = authentication_options(&self.rp, allow);
        let ceremony_token = Uuid::new_v4().to_string();
        self.pending
            .store_authentication(ceremony_token.clone(), options.clone());

        tracing::info!(ceremony = %ceremony_token, "Authentication ceremony started");

        StartedAuthentication {
            ceremony_token,
            options: RequestChallengeResponse {
                public_key: options,
            },
        }
    }

    /// Validate an assertion submission and advance the stored counter.
    ///
    /// The pending ceremony is consumed either way. The counter update is
    /// compare-and-set against the counter read for validation, so two
    /// concurrent submissions of the same assertion cannot both win.
    pub async fn finish_authentication(
        &self,
        ceremony_token: &str,
        submission: &str,
    ) -> Result<AuthenticatedPasskey, CeremonyError> {
        let result = self
            .finish_authentication_inner(ceremony_token, submission)
            .await;
        if let Err(err) = &result {
            log_rejection("authentication", ceremony_token, err);
        }
        result
    }

    async fn finish_authentication_inner(
        &self,
        ceremony_token: &str,
        submission: &str,
    ) -> Result<AuthenticatedPasskey, CeremonyError> {
        let options = self
            .pending
            .take_authentication(ceremony_token)
            .ok_or(CeremonyError::ChallengeMismatch)?;

        let credential = PublicKeyCredential::from_json(submission)?;

        let record = self
            .store
            .find_by_credential_id(&credential.raw_id)
            .await
            .map_err(|err| CeremonyError::StoreUnavailable(err.to_string()))?
            .ok_or(CeremonyError::UnknownCredential)?;

        let outcome = verify_authentication(&self.rp, &options, &credential, &record)?;

        self.store
            .update_sign_count(&outcome.credential_id, record.sign_count, outcome.sign_count)
            .await
            .map_err(|err| match err {
                StoreError::NotFound => CeremonyError::UnknownCredential,
                StoreError::StaleCounter { stored, .. } => CeremonyError::PossibleCloning {
                    stored,
                    asserted: outcome.sign_count,
                },
                other => CeremonyError::StoreUnavailable(other.to_string()),
            })?;

        tracing::info!(
            credential_id = %record.credential_id_hex(),
            sign_count = outcome.sign_count,
            "Authentication ceremony completed"
        );

        Ok(AuthenticatedPasskey {
            owner_user_id: outcome.owner_user_id,
            credential_id: outcome.credential_id,
            sign_count: outcome.sign_count,
            user_verified: outcome.user_verified,
        })
    }

    /// All credentials registered to `owner_user_id`, for profile listings.
    pub async fn credentials_for_user(
        &self,
        owner_user_id: &[u8],
    ) -> Result<Vec<CredentialRecord>, CeremonyError> {
        self.store
            .find_by_owner(owner_user_id)
            .await
            .map_err(|err| CeremonyError::StoreUnavailable(err.to_string()))
    }

    /// Delete a credential, but only for its owner.
    ///
    /// Returns `false` when nothing was deleted: unknown credential ID, or a
    /// requester who does not own it. The two are indistinguishable on
    /// purpose.
    pub async fn remove_credential(
        &self,
        owner_user_id: &[u8],
        credential_id: &[u8],
    ) -> Result<bool, CeremonyError> {
        let record = self
            .store
            .find_by_credential_id(credential_id)
            .await
            .map_err(|err| CeremonyError::StoreUnavailable(err.to_string()))?;

        let Some(record) = record else {
            return Ok(false);
        };

        if record.owner_user_id != owner_user_id {
            tracing::warn!(
                credential_id = %record.credential_id_hex(),
                "Credential deletion refused, requester does not own it"
            );
            return Ok(false);
        }

        self.store
            .delete(credential_id)
            .await
            .map_err(|err| CeremonyError::StoreUnavailable(err.to_string()))
    }

    /// Drop expired pending ceremonies. Expired entries also vanish lazily
    /// when a finish call looks them up; this reclaims the ones nobody
    /// finishes.
    pub fn cleanup_expired(&self) {
        self.pending.cleanup_expired();
    }

    pub fn pending_count(&self) -> usize {
        self.pending.registration_count() + self.pending.authentication_count()
    }
}

/// One log line per rejected finish call: store faults at error, everything
/// else at warn with its stable code.
fn log_rejection(flow: &str, ceremony_token: &str, err: &CeremonyError) {
    if err.is_retryable() {
        tracing::error!(
            ceremony = %ceremony_token,
            flow,
            error = %err,
            "Ceremony store fault"
        );
    } else {
        tracing::warn!(
            ceremony = %ceremony_token,
            flow,
            code = err.code(),
            error = %err,
            "Ceremony rejected"
        );
    }
}

impl fmt::Debug for Tessera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tessera")
            .field("rp_id", &self.rp.id())
            .field("pending", &self.pending)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn engine() -> Tessera {
        let origin = Url::parse("https://example.com").unwrap();
        let rp = RelyingParty::new("example.com", &origin, "Example").unwrap();
        Tessera::in_memory(rp)
    }

    fn user() -> UserHandle {
        UserHandle {
            id: b"user-1".to_vec(),
            name: "ada@example.com".into(),
            display_name: "Ada Lovelace".into(),
        }
    }

    #[test]
    fn test_start_registration_mints_unique_tokens_and_challenges() {
        let engine = engine();
        let first = engine.start_registration(&user()).unwrap();
        let second = engine.start_registration(&user()).unwrap();

        assert_ne!(first.ceremony_token, second.ceremony_token);
        assert_ne!(
            first.options.public_key.challenge.as_bytes(),
            second.options.public_key.challenge.as_bytes()
        );
        assert_eq!(engine.pending_count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_ceremony_token_is_challenge_mismatch() {
        let engine = engine();
        let err = engine
            .finish_registration("no-such-token", "{}", None)
            .await
            .unwrap_err();
        assert!(matches!(err, CeremonyError::ChallengeMismatch));

        let err = engine
            .finish_authentication("no-such-token", "{}")
            .await
            .unwrap_err();
        assert!(matches!(err, CeremonyError::ChallengeMismatch));
    }

    #[tokio::test]
    async fn test_ceremony_token_is_consumed_even_on_failure() {
        let engine = engine();
        let started = engine.start_registration(&user()).unwrap();

        // First attempt gets past the token lookup and dies on decode.
        let err = engine
            .finish_registration(&started.ceremony_token, "not json", None)
            .await
            .unwrap_err();
        assert!(matches!(err, CeremonyError::Decode(_)));

        // Second attempt finds nothing pending: the token was spent.
        let err = engine
            .finish_registration(&started.ceremony_token, "not json", None)
            .await
            .unwrap_err();
        assert!(matches!(err, CeremonyError::ChallengeMismatch));
        assert_eq!(engine.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_remove_unknown_credential_reports_false() {
        let engine = engine();
        let removed = engine
            .remove_credential(b"user-1", b"no-such-credential")
            .await
            .unwrap();
        assert!(!removed);
    }
}
