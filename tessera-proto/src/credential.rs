//! Credential submissions.
//!
//! What `navigator.credentials.create()` / `.get()` resolve to, posted back
//! by the browser. The response is a tagged union: registration carries an
//! attestation response, authentication an assertion response, and every
//! ceremony entry point matches on the variant before doing anything else.

use serde::{Deserialize, Serialize};

use crate::base64url::Base64UrlBytes;
use crate::error::{DecodeError, Result};

/// Registration response: attestation object plus client data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationResponse {
    #[serde(rename = "attestationObject")]
    pub attestation_object: Base64UrlBytes,
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: Base64UrlBytes,
    /// Transports the authenticator reported (`internal`, `usb`, `hybrid`, ...).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transports: Vec<String>,
}

/// Authentication response: signed authenticator data plus client data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionResponse {
    #[serde(rename = "authenticatorData")]
    pub authenticator_data: Base64UrlBytes,
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: Base64UrlBytes,
    pub signature: Base64UrlBytes,
    /// User handle for discoverable credentials; absent in allow-list flows.
    #[serde(
        rename = "userHandle",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub user_handle: Option<Base64UrlBytes>,
}

/// The two response shapes a credential submission can carry.
///
/// Untagged: the field set decides the variant. Attestation is tried first;
/// an assertion payload lacks `attestationObject` and falls through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuthenticatorResponse {
    Attestation(AttestationResponse),
    Assertion(AssertionResponse),
}

/// A credential submission as posted by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredential {
    /// Base64url form of `raw_id`.
    pub id: String,
    pub raw_id: Base64UrlBytes,
    pub response: AuthenticatorResponse,
    #[serde(rename = "type")]
    pub type_: String,
}

impl PublicKeyCredential {
    /// Parse a submission from its wire JSON.
    ///
    /// Only structure is checked here: required fields, valid base64url,
    /// `type == "public-key"`. Ceremony checks come later.
    pub fn from_json(json: &str) -> Result<Self> {
        let credential: Self = serde_json::from_str(json)?;
        if credential.type_ != "public-key" {
            return Err(DecodeError::CredentialType(credential.type_));
        }
        Ok(credential)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn is_attestation(&self) -> bool {
        matches!(self.response, AuthenticatorResponse::Attestation(_))
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self.response, AuthenticatorResponse::Assertion(_))
    }
}
