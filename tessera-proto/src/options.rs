//! Challenge option bundles.
//!
//! The JSON structures handed to `navigator.credentials.create()` and
//! `navigator.credentials.get()`. Field names follow the WebAuthn Level 2
//! dictionary definitions; byte fields are base64url strings on the wire.

use serde::{Deserialize, Serialize};

use crate::base64url::Base64UrlBytes;

/// COSE algorithm identifier for ECDSA w/ SHA-256 on P-256.
pub const COSE_ALG_ES256: i64 = -7;

/// COSE algorithm identifier for EdDSA over Ed25519.
pub const COSE_ALG_EDDSA: i64 = -8;

/// Relying Party identity as presented to the authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelyingPartyEntity {
    pub name: String,
    pub id: String,
}

/// Account identity as presented to the authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    /// Opaque user handle, 1..=64 bytes. Returned by discoverable
    /// credentials as `userHandle` during authentication.
    pub id: Base64UrlBytes,
    pub name: String,
    pub display_name: String,
}

/// One acceptable credential algorithm, in preference order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubKeyCredParams {
    #[serde(rename = "type")]
    pub type_: String,
    pub alg: i64,
}

impl PubKeyCredParams {
    pub fn es256() -> Self {
        Self {
            type_: "public-key".to_string(),
            alg: COSE_ALG_ES256,
        }
    }

    pub fn eddsa() -> Self {
        Self {
            type_: "public-key".to_string(),
            alg: COSE_ALG_EDDSA,
        }
    }
}

/// How strongly the authenticator must verify the user (PIN, biometric).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserVerificationPolicy {
    Required,
    Preferred,
    Discouraged,
}

impl Default for UserVerificationPolicy {
    fn default() -> Self {
        Self::Preferred
    }
}

/// Whether the credential must be discoverable (resident) on the
/// authenticator. `Required` enables username-less login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResidentKeyRequirement {
    Discouraged,
    Preferred,
    Required,
}

/// Platform (built-in) vs. cross-platform (roaming) authenticator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthenticatorAttachment {
    Platform,
    CrossPlatform,
}

/// Registration-time authenticator requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelectionCriteria {
    /// Absent means no preference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<AuthenticatorAttachment>,
    pub resident_key: ResidentKeyRequirement,
    /// Legacy mirror of `resident_key == Required` for older clients.
    pub require_resident_key: bool,
    pub user_verification: UserVerificationPolicy,
}

/// How much attestation the Relying Party asks the client to convey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttestationConveyancePreference {
    None,
    Indirect,
    Direct,
}

/// Reference to an existing credential (allow and exclude lists).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyCredentialDescriptor {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: Base64UrlBytes,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transports: Vec<String>,
}

impl PublicKeyCredentialDescriptor {
    pub fn new(credential_id: Vec<u8>) -> Self {
        Self {
            type_: "public-key".to_string(),
            id: Base64UrlBytes::new(credential_id),
            transports: Vec::new(),
        }
    }
}

/// Options for `navigator.credentials.create()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialCreationOptions {
    pub rp: RelyingPartyEntity,
    pub user: UserEntity,
    pub challenge: Base64UrlBytes,
    pub pub_key_cred_params: Vec<PubKeyCredParams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    pub authenticator_selection: AuthenticatorSelectionCriteria,
    pub attestation: AttestationConveyancePreference,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_credentials: Vec<PublicKeyCredentialDescriptor>,
}

/// Options for `navigator.credentials.get()`.
///
/// An empty `allow_credentials` list (omitted on the wire) tells the browser
/// to offer any discoverable credential scoped to `rp_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialRequestOptions {
    pub challenge: Base64UrlBytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    pub rp_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow_credentials: Vec<PublicKeyCredentialDescriptor>,
    pub user_verification: UserVerificationPolicy,
}

/// Wire envelope for creation options: `{"publicKey": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationChallengeResponse {
    pub public_key: PublicKeyCredentialCreationOptions,
}

/// Wire envelope for request options: `{"publicKey": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestChallengeResponse {
    pub public_key: PublicKeyCredentialRequestOptions,
}

impl CreationChallengeResponse {
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl RequestChallengeResponse {
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
