//! Ceremony error taxonomy.
//!
//! Every way a ceremony can be rejected is a variant here. All variants are
//! terminal for the attempt (the pending challenge is consumed either way);
//! only [`CeremonyError::StoreUnavailable`] marks a transient fault worth
//! retrying with a fresh ceremony.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CeremonyError {
    /// Payload failed structural decoding before any ceremony check ran.
    #[error("Decode error: {0}")]
    Decode(#[from] tessera_proto::DecodeError),

    /// An assertion was submitted to the registration flow, or vice versa.
    #[error("Wrong ceremony type: expected {expected}, got {got}")]
    WrongCeremonyType { expected: &'static str, got: String },

    /// Signed challenge does not match the pending ceremony (or nothing is
    /// pending under the presented token).
    #[error("Challenge mismatch")]
    ChallengeMismatch,

    /// Client data origin or authenticator rpIdHash does not belong to this
    /// Relying Party.
    #[error("Origin mismatch: {0}")]
    OriginMismatch(String),

    /// User presence or verification flags do not satisfy policy.
    #[error("User not verified")]
    UserNotVerified,

    /// Attestation statement malformed, unsupported, or failed verification.
    #[error("Invalid attestation: {0}")]
    InvalidAttestation(String),

    /// No stored credential matches the asserted credential ID.
    #[error("Unknown credential")]
    UnknownCredential,

    /// Assertion signature did not verify against the stored public key.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Signature counter went backwards; the credential may be cloned.
    #[error("Possible cloning: stored counter {stored}, asserted {asserted}")]
    PossibleCloning { stored: u32, asserted: u32 },

    /// A credential with this ID is already registered.
    #[error("Duplicate credential")]
    DuplicateCredential,

    /// Credential store is temporarily unreachable.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl CeremonyError {
    /// Whether retrying (with a fresh ceremony) could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    /// Whether this rejection is security-relevant rather than malformed input.
    pub fn is_security_rejection(&self) -> bool {
        matches!(
            self,
            Self::ChallengeMismatch
                | Self::OriginMismatch(_)
                | Self::UserNotVerified
                | Self::InvalidAttestation(_)
                | Self::UnknownCredential
                | Self::InvalidSignature
                | Self::PossibleCloning { .. }
        )
    }

    /// Sanitized message for client responses.
    ///
    /// Security-relevant rejections collapse into one generic message so a
    /// response never reveals which check failed; logs keep the specific
    /// variant.
    pub fn generic_message(&self) -> &'static str {
        match self {
            Self::Decode(_) => "Malformed credential payload",
            Self::WrongCeremonyType { .. } => "Wrong ceremony type",
            Self::DuplicateCredential => "Credential already registered",
            Self::StoreUnavailable(_) => "Service temporarily unavailable, try again",
            _ => "The passkey could not be verified",
        }
    }

    /// Stable code for structured logs and programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "DECODE_ERROR",
            Self::WrongCeremonyType { .. } => "WRONG_CEREMONY_TYPE",
            Self::ChallengeMismatch => "CHALLENGE_MISMATCH",
            Self::OriginMismatch(_) => "ORIGIN_MISMATCH",
            Self::UserNotVerified => "USER_NOT_VERIFIED",
            Self::InvalidAttestation(_) => "INVALID_ATTESTATION",
            Self::UnknownCredential => "UNKNOWN_CREDENTIAL",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::PossibleCloning { .. } => "POSSIBLE_CLONING",
            Self::DuplicateCredential => "DUPLICATE_CREDENTIAL",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }
}

pub type Result<T> = std::result::Result<T, CeremonyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_store_unavailable_is_retryable() {
        assert!(CeremonyError::StoreUnavailable("down".into()).is_retryable());
        assert!(!CeremonyError::ChallengeMismatch.is_retryable());
        assert!(!CeremonyError::DuplicateCredential.is_retryable());
        assert!(!CeremonyError::PossibleCloning { stored: 5, asserted: 3 }.is_retryable());
    }

    #[test]
    fn test_security_rejections_share_one_client_message() {
        let rejections = [
            CeremonyError::ChallengeMismatch,
            CeremonyError::OriginMismatch("https://evil.example".into()),
            CeremonyError::UserNotVerified,
            CeremonyError::InvalidAttestation("bad".into()),
            CeremonyError::UnknownCredential,
            CeremonyError::InvalidSignature,
            CeremonyError::PossibleCloning { stored: 9, asserted: 1 },
        ];
        for err in &rejections {
            assert!(err.is_security_rejection(), "{} must be security-relevant", err.code());
            assert_eq!(
                err.generic_message(),
                "The passkey could not be verified",
                "client must not learn which check failed ({})",
                err.code()
            );
        }
    }

    #[test]
    fn test_decode_errors_are_not_security_rejections() {
        let err = CeremonyError::Decode(tessera_proto::DecodeError::MissingField("signature"));
        assert!(!err.is_security_rejection());
        assert_eq!(err.code(), "DECODE_ERROR");
    }
}
