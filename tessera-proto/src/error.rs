use thiserror::Error;

/// Structural decode failures.
///
/// Anything here means the payload never reached ceremony validation: a
/// malformed submission is rejected on shape alone.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid CBOR: {0}")]
    Cbor(String),

    #[error("Unsupported credential type: {0:?}")]
    CredentialType(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Truncated {0}")]
    Truncated(&'static str),

    #[error("Malformed {0}: {1}")]
    Malformed(&'static str, String),
}

pub type Result<T> = std::result::Result<T, DecodeError>;
