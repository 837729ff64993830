//! Tessera Proto - WebAuthn wire-format types
//!
//! The JSON shapes exchanged with the browser's `navigator.credentials` API:
//! challenge option bundles going out, signed credential submissions coming
//! back, and the collected client data embedded in them.
//!
//! Parsing here is structural only. A payload that decodes is not yet
//! trusted; ceremony validation (challenge, origin, signatures, counters)
//! lives in `tessera-core`.

pub mod base64url;
pub mod client_data;
pub mod credential;
pub mod error;
pub mod options;

// Re-export main types for convenience
pub use base64url::Base64UrlBytes;
pub use client_data::{CollectedClientData, CLIENT_DATA_TYPE_CREATE, CLIENT_DATA_TYPE_GET};
pub use credential::{
    AssertionResponse, AttestationResponse, AuthenticatorResponse, PublicKeyCredential,
};
pub use error::{DecodeError, Result};
pub use options::{
    AttestationConveyancePreference, AuthenticatorAttachment, AuthenticatorSelectionCriteria,
    CreationChallengeResponse, PubKeyCredParams, PublicKeyCredentialCreationOptions,
    PublicKeyCredentialDescriptor, PublicKeyCredentialRequestOptions, RelyingPartyEntity,
    RequestChallengeResponse, ResidentKeyRequirement, UserEntity, UserVerificationPolicy,
    COSE_ALG_EDDSA, COSE_ALG_ES256,
};
