//! Challenge generation and ceremony option bundles.
//!
//! Challenges are 32 bytes from the OS CSPRNG, unique per ceremony and
//! single-use; consumption is enforced by the pending-ceremony store, not
//! here. These functions are pure apart from drawing randomness.

use rand::rngs::OsRng;
use rand::RngCore;

use tessera_proto::{
    AttestationConveyancePreference, AuthenticatorSelectionCriteria, Base64UrlBytes,
    PubKeyCredParams, PublicKeyCredentialCreationOptions, PublicKeyCredentialDescriptor,
    PublicKeyCredentialRequestOptions, RelyingPartyEntity, ResidentKeyRequirement, UserEntity,
};

use crate::config::RelyingParty;

/// Challenge length in bytes (256 bits).
pub const CHALLENGE_LEN: usize = 32;

/// Maximum user handle length per WebAuthn.
pub const MAX_USER_HANDLE_LEN: usize = 64;

/// Errors building option bundles.
#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("User handle must be 1..={MAX_USER_HANDLE_LEN} bytes, got {0}")]
    UserHandleLength(usize),
    #[error("User name must not be empty")]
    EmptyUserName,
}

/// Account identity presented to the authenticator at registration.
///
/// `id` is an opaque, stable, non-PII byte handle (1..=64 bytes); it is what
/// discoverable credentials hand back as `userHandle` during authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserHandle {
    pub id: Vec<u8>,
    /// Account name shown in credential pickers, typically the email.
    pub name: String,
    pub display_name: String,
}

/// Generate a fresh ceremony challenge from OS entropy.
///
/// A failure to obtain secure randomness aborts the process; it is never
/// downgraded to a weaker source.
pub fn generate_challenge() -> [u8; CHALLENGE_LEN] {
    let mut bytes = [0u8; CHALLENGE_LEN];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Build registration options for one account.
///
/// `exclude` lists credentials the browser must not re-register.
pub fn registration_options(
    rp: &RelyingParty,
    user: &UserHandle,
    exclude: Vec<PublicKeyCredentialDescriptor>,
) -> Result<PublicKeyCredentialCreationOptions, OptionsError> {
    if user.id.is_empty() || user.id.len() > MAX_USER_HANDLE_LEN {
        return Err(OptionsError::UserHandleLength(user.id.len()));
    }
    if user.name.is_empty() {
        return Err(OptionsError::EmptyUserName);
    }

    Ok(PublicKeyCredentialCreationOptions {
        rp: RelyingPartyEntity {
            name: rp.name().to_string(),
            id: rp.id().to_string(),
        },
        user: UserEntity {
            id: Base64UrlBytes::new(user.id.clone()),
            name: user.name.clone(),
            display_name: user.display_name.clone(),
        },
        challenge: Base64UrlBytes::new(generate_challenge().to_vec()),
        pub_key_cred_params: vec![PubKeyCredParams::es256(), PubKeyCredParams::eddsa()],
        timeout: Some(rp.timeout_ms()),
        authenticator_selection: AuthenticatorSelectionCriteria {
            authenticator_attachment: rp.authenticator_attachment(),
            resident_key: rp.resident_key(),
            require_resident_key: rp.resident_key() == ResidentKeyRequirement::Required,
            user_verification: rp.user_verification(),
        },
        attestation: AttestationConveyancePreference::None,
        exclude_credentials: exclude,
    })
}

/// Build authentication options.
///
/// With an empty `allow` list the browser offers any discoverable credential
/// for this RP (username-less flow).
pub fn authentication_options(
    rp: &RelyingParty,
    allow: Vec<PublicKeyCredentialDescriptor>,
) -> PublicKeyCredentialRequestOptions {
    PublicKeyCredentialRequestOptions {
        challenge: Base64UrlBytes::new(generate_challenge().to_vec()),
        timeout: Some(rp.timeout_ms()),
        rp_id: rp.id().to_string(),
        allow_credentials: allow,
        user_verification: rp.user_verification(),
    }
}
