//! Ceremony validation.
//!
//! Pure validators: given a decoded submission, the pending options it
//! answers, and Relying Party context, accept or reject. Nothing here
//! touches storage; the engine wires stores around these checks.
//!
//! Both flows run the same gauntlet over the collected client data
//! (ceremony type, challenge, origin) before any cryptography, and both
//! compare secrets in constant time.

mod authentication;
mod registration;

pub use authentication::{verify_authentication, AuthenticationOutcome};
pub use registration::{verify_registration, RegistrationOutcome};

use subtle::ConstantTimeEq;

use tessera_proto::CollectedClientData;

use crate::authenticator_data::AuthenticatorData;
use crate::config::RelyingParty;
use crate::error::CeremonyError;

/// Constant-time byte comparison; unequal lengths compare unequal.
fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).unwrap_u8() == 1
}

/// Type, challenge, and origin checks shared by both ceremonies, run in
/// that order.
fn check_client_data(
    client_data: &CollectedClientData,
    expected_type: &'static str,
    challenge: &[u8],
    rp: &RelyingParty,
) -> Result<(), CeremonyError> {
    if client_data.type_ != expected_type {
        return Err(CeremonyError::WrongCeremonyType {
            expected: expected_type,
            got: client_data.type_.clone(),
        });
    }
    if !ct_eq(client_data.challenge.as_bytes(), challenge) {
        return Err(CeremonyError::ChallengeMismatch);
    }
    if !rp.origin_matches(&client_data.origin) {
        return Err(CeremonyError::OriginMismatch(client_data.origin.clone()));
    }
    Ok(())
}

/// The authenticator's rpIdHash must be SHA-256 of our RP ID.
fn check_rp_id_hash(
    auth_data: &AuthenticatorData,
    rp: &RelyingParty,
) -> Result<(), CeremonyError> {
    if !ct_eq(&auth_data.rp_id_hash, &rp.rp_id_hash()) {
        return Err(CeremonyError::OriginMismatch(format!(
            "authenticator rpIdHash is not for {:?}",
            rp.id()
        )));
    }
    Ok(())
}

/// User presence is always required; user verification when policy says so.
fn check_user_flags(
    auth_data: &AuthenticatorData,
    require_user_verification: bool,
) -> Result<(), CeremonyError> {
    if !auth_data.user_present() {
        return Err(CeremonyError::UserNotVerified);
    }
    if require_user_verification && !auth_data.user_verified() {
        return Err(CeremonyError::UserNotVerified);
    }
    Ok(())
}
