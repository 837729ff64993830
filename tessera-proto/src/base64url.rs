//! Base64url byte fields.
//!
//! WebAuthn carries every binary field (challenges, credential IDs, client
//! data, signatures) as unpadded base64url strings in JSON. [`Base64UrlBytes`]
//! holds the decoded bytes and does the wire conversion in its serde impls.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Byte field carried as unpadded base64url on the wire.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Base64UrlBytes(Vec<u8>);

impl Base64UrlBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Decode from a base64url string. Padding is tolerated on input;
    /// output never carries it.
    pub fn from_encoded(s: &str) -> Result<Self, base64::DecodeError> {
        URL_SAFE_NO_PAD.decode(s.trim_end_matches('=')).map(Self)
    }

    /// Unpadded base64url form.
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl std::ops::Deref for Base64UrlBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Base64UrlBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Base64UrlBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Base64UrlBytes {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl std::fmt::Display for Base64UrlBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

impl std::fmt::Debug for Base64UrlBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Base64UrlBytes").field(&self.encode()).finish()
    }
}

impl Serialize for Base64UrlBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Base64UrlBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_encoded(&s).map_err(serde::de::Error::custom)
    }
}
