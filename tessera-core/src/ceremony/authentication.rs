//! Authentication (assertion) ceremony validation.

use sha2::{Digest, Sha256};

use tessera_proto::{
    AuthenticatorResponse, CollectedClientData, PublicKeyCredential,
    PublicKeyCredentialRequestOptions, UserVerificationPolicy, CLIENT_DATA_TYPE_GET,
};

use crate::authenticator_data::AuthenticatorData;
use crate::config::RelyingParty;
use crate::cose::CoseKey;
use crate::error::{CeremonyError, Result};
use crate::signature;
use crate::store::CredentialRecord;

use super::{check_client_data, check_rp_id_hash, check_user_flags};

/// Accepted assertion: who signed in, and the counter to persist.
#[derive(Debug, Clone)]
pub struct AuthenticationOutcome {
    pub credential_id: Vec<u8>,
    pub owner_user_id: Vec<u8>,
    pub sign_count: u32,
    pub user_verified: bool,
    pub backup_state: bool,
}

/// Validate an assertion submission against the pending request options and
/// the stored credential it claims to be.
///
/// The caller has already resolved `record` by the submission's credential
/// ID; everything here is pure validation. Signature faults of any kind
/// reject, never accept.
pub fn verify_authentication(
    rp: &RelyingParty,
    options: &PublicKeyCredentialRequestOptions,
    credential: &PublicKeyCredential,
    record: &CredentialRecord,
) -> Result<AuthenticationOutcome> {
    let response = match &credential.response {
        AuthenticatorResponse::Assertion(response) => response,
        AuthenticatorResponse::Attestation(_) => {
            return Err(CeremonyError::WrongCeremonyType {
                expected: "assertion response",
                got: "attestation response".into(),
            });
        }
    };

    if !options.allow_credentials.is_empty() {
        let allowed = options
            .allow_credentials
            .iter()
            .any(|descriptor| descriptor.id.as_bytes() == credential.raw_id.as_bytes());
        if !allowed {
            return Err(CeremonyError::UnknownCredential);
        }
    }

    let client_data = CollectedClientData::parse(response.client_data_json.as_bytes())?;
    check_client_data(
        &client_data,
        CLIENT_DATA_TYPE_GET,
        options.challenge.as_bytes(),
        rp,
    )?;

    let auth_data = AuthenticatorData::parse(response.authenticator_data.as_bytes())?;
    check_rp_id_hash(&auth_data, rp)?;

    let require_user_verification = record.require_user_verification
        || options.user_verification == UserVerificationPolicy::Required;
    check_user_flags(&auth_data, require_user_verification)?;

    // A userHandle, when present, must name the account that owns the
    // credential; anything else smells like a spliced response.
    if let Some(handle) = &response.user_handle {
        if handle.as_bytes() != record.owner_user_id.as_slice() {
            return Err(CeremonyError::UnknownCredential);
        }
    }

    // The stored key was validated at registration; failure to reparse it
    // means corruption, and corruption fails closed.
    let public_key =
        CoseKey::from_bytes(&record.public_key).map_err(|_| CeremonyError::InvalidSignature)?;

    let client_data_hash = Sha256::digest(response.client_data_json.as_bytes());
    let mut message = Vec::with_capacity(response.authenticator_data.len() + 32);
    message.extend_from_slice(response.authenticator_data.as_bytes());
    message.extend_from_slice(&client_data_hash);
    signature::verify(&public_key, &message, response.signature.as_bytes())?;

    check_sign_count(record.sign_count, auth_data.sign_count, &record.credential_id)?;

    tracing::debug!(
        credential_id = %record.credential_id_hex(),
        sign_count = auth_data.sign_count,
        user_verified = auth_data.user_verified(),
        "Assertion accepted"
    );

    Ok(AuthenticationOutcome {
        credential_id: record.credential_id.clone(),
        owner_user_id: record.owner_user_id.clone(),
        sign_count: auth_data.sign_count,
        user_verified: auth_data.user_verified(),
        backup_state: auth_data.backup_state(),
    })
}

/// Require a strictly increasing counter, except when both sides report
/// zero (authenticators without a counter always send zero).
fn check_sign_count(stored: u32, asserted: u32, credential_id: &[u8]) -> Result<()> {
    if stored == 0 && asserted == 0 {
        tracing::warn!(
            credential_id = %hex::encode(credential_id),
            "Authenticator reports no signature counter, cloning detection unavailable"
        );
        return Ok(());
    }
    if asserted <= stored {
        return Err(CeremonyError::PossibleCloning { stored, asserted });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_count_must_strictly_increase() {
        assert!(check_sign_count(5, 6, b"cred").is_ok());
        assert!(matches!(
            check_sign_count(5, 5, b"cred"),
            Err(CeremonyError::PossibleCloning { stored: 5, asserted: 5 })
        ));
        assert!(matches!(
            check_sign_count(5, 3, b"cred"),
            Err(CeremonyError::PossibleCloning { stored: 5, asserted: 3 })
        ));
    }

    #[test]
    fn test_sign_count_zero_pair_is_tolerated() {
        assert!(check_sign_count(0, 0, b"cred").is_ok());
        // A counter that was ever nonzero must keep increasing.
        assert!(check_sign_count(3, 0, b"cred").is_err());
        assert!(check_sign_count(0, 1, b"cred").is_ok());
    }
}
