//! Assertion signature verification.
//!
//! The signed message is `authenticatorData || SHA-256(clientDataJSON)`.
//! ES256 signatures arrive ASN.1 DER encoded; Ed25519 signatures are raw
//! 64 bytes. Every fault on this path is a rejection; nothing degrades to
//! acceptance.

use p256::ecdsa::signature::Verifier;

use crate::cose::CoseKey;
use crate::error::CeremonyError;

/// Verify `sig` over `message` with a credential public key.
pub fn verify(key: &CoseKey, message: &[u8], sig: &[u8]) -> Result<(), CeremonyError> {
    match key {
        CoseKey::Ec2 { x, y } => verify_es256(x, y, message, sig),
        CoseKey::Okp { x } => verify_ed25519(x, message, sig),
    }
}

fn verify_es256(
    x: &[u8; 32],
    y: &[u8; 32],
    message: &[u8],
    sig: &[u8],
) -> Result<(), CeremonyError> {
    let point = p256::EncodedPoint::from_affine_coordinates(
        p256::FieldBytes::from_slice(x),
        p256::FieldBytes::from_slice(y),
        false,
    );
    let verifying_key = p256::ecdsa::VerifyingKey::from_encoded_point(&point)
        .map_err(|_| CeremonyError::InvalidSignature)?;
    let signature =
        p256::ecdsa::Signature::from_der(sig).map_err(|_| CeremonyError::InvalidSignature)?;
    verifying_key
        .verify(message, &signature)
        .map_err(|_| CeremonyError::InvalidSignature)
}

fn verify_ed25519(x: &[u8; 32], message: &[u8], sig: &[u8]) -> Result<(), CeremonyError> {
    let verifying_key =
        ed25519_dalek::VerifyingKey::from_bytes(x).map_err(|_| CeremonyError::InvalidSignature)?;
    let sig_bytes: &[u8; 64] = sig
        .try_into()
        .map_err(|_| CeremonyError::InvalidSignature)?;
    let signature = ed25519_dalek::Signature::from_bytes(sig_bytes);
    verifying_key
        .verify_strict(message, &signature)
        .map_err(|_| CeremonyError::InvalidSignature)
}
