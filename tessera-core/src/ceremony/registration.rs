//! Registration (attestation) ceremony validation.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use tessera_proto::{
    AuthenticatorResponse, CollectedClientData, PublicKeyCredential,
    PublicKeyCredentialCreationOptions, CLIENT_DATA_TYPE_CREATE,
};

use crate::attestation::{AttestationFormat, AttestationObject};
use crate::config::RelyingParty;
use crate::cose::{CoseAlgorithm, CoseKey};
use crate::error::{CeremonyError, Result};

use super::{check_client_data, check_rp_id_hash, check_user_flags, ct_eq};

/// Accepted attestation, ready to be persisted as a credential record.
#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub credential_id: Vec<u8>,
    /// Raw COSE key bytes, stored verbatim so assertions verify against
    /// exactly what the authenticator attested.
    pub public_key_bytes: Vec<u8>,
    pub algorithm: CoseAlgorithm,
    pub sign_count: u32,
    pub aaguid: Uuid,
    pub transports: Vec<String>,
    pub attestation_format: AttestationFormat,
    pub backup_eligible: bool,
    pub backup_state: bool,
    pub user_verified: bool,
}

/// Validate an attestation submission against the pending creation options.
///
/// Checks run in this order: response variant, client data (type, challenge,
/// origin), rpIdHash, user presence/verification flags, attested credential
/// data and its COSE key, credential ID binding, attestation statement.
/// The first failure rejects the ceremony.
pub fn verify_registration(
    rp: &RelyingParty,
    options: &PublicKeyCredentialCreationOptions,
    credential: &PublicKeyCredential,
) -> Result<RegistrationOutcome> {
    let response = match &credential.response {
        AuthenticatorResponse::Attestation(response) => response,
        AuthenticatorResponse::Assertion(_) => {
            return Err(CeremonyError::WrongCeremonyType {
                expected: "attestation response",
                got: "assertion response".into(),
            });
        }
    };

    let client_data = CollectedClientData::parse(response.client_data_json.as_bytes())?;
    check_client_data(
        &client_data,
        CLIENT_DATA_TYPE_CREATE,
        options.challenge.as_bytes(),
        rp,
    )?;

    let attestation = AttestationObject::parse(response.attestation_object.as_bytes())?;
    check_rp_id_hash(&attestation.auth_data, rp)?;
    check_user_flags(&attestation.auth_data, rp.user_verification_required())?;

    let attested = attestation.auth_data.attested_credential.as_ref().ok_or(
        CeremonyError::InvalidAttestation("attested credential data missing".into()),
    )?;

    // Unsupported key types are an attestation problem, not a decode problem:
    // the payload is well-formed, we just refuse to register the key.
    let public_key = CoseKey::from_bytes(&attested.public_key_bytes)
        .map_err(|err| CeremonyError::InvalidAttestation(err.to_string()))?;

    let algorithm = public_key.algorithm();
    let offered = options
        .pub_key_cred_params
        .iter()
        .any(|param| param.alg == algorithm.cose_value());
    if !offered {
        return Err(CeremonyError::InvalidAttestation(format!(
            "credential algorithm {algorithm} was not offered"
        )));
    }

    if !ct_eq(&attested.credential_id, &credential.raw_id) {
        return Err(CeremonyError::InvalidAttestation(
            "rawId does not match the attested credential ID".into(),
        ));
    }

    let client_data_hash: [u8; 32] = Sha256::digest(response.client_data_json.as_bytes()).into();
    let attestation_format = attestation.verify_statement(&client_data_hash, &public_key)?;

    tracing::debug!(
        credential_id = %hex::encode(&attested.credential_id),
        algorithm = %algorithm,
        format = ?attestation_format,
        sign_count = attestation.auth_data.sign_count,
        "Attestation accepted"
    );

    Ok(RegistrationOutcome {
        credential_id: attested.credential_id.clone(),
        public_key_bytes: attested.public_key_bytes.clone(),
        algorithm,
        sign_count: attestation.auth_data.sign_count,
        aaguid: Uuid::from_bytes(attested.aaguid),
        transports: response.transports.clone(),
        attestation_format,
        backup_eligible: attestation.auth_data.backup_eligible(),
        backup_state: attestation.auth_data.backup_state(),
        user_verified: attestation.auth_data.user_verified(),
    })
}
