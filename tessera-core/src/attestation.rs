//! Attestation object parsing and statement verification.
//!
//! Accepted statement formats are `"none"` and `"packed"` self-attestation.
//! Certificate-chain attestation (packed with `x5c`, `fido-u2f`, `tpm`,
//! `android-key`, ...) is out of policy and rejected outright rather than
//! half-verified.

use ciborium::Value;
use serde::{Deserialize, Serialize};

use tessera_proto::DecodeError;

use crate::authenticator_data::AuthenticatorData;
use crate::cose::{CoseAlgorithm, CoseKey};
use crate::error::CeremonyError;
use crate::signature;

/// Statement format of an accepted registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttestationFormat {
    None,
    Packed,
}

/// Decoded attestation object: `{fmt, attStmt, authData}`.
pub struct AttestationObject {
    pub format: String,
    pub statement: Vec<(Value, Value)>,
    pub auth_data: AuthenticatorData,
    /// Raw authenticator data bytes; packed self-attestation signs over them.
    pub auth_data_bytes: Vec<u8>,
}

impl AttestationObject {
    /// Parse the outer CBOR structure.
    pub fn parse(bytes: &[u8]) -> Result<Self, DecodeError> {
        let value: Value =
            ciborium::de::from_reader(bytes).map_err(|e| DecodeError::Cbor(e.to_string()))?;
        let map = value
            .as_map()
            .ok_or_else(|| DecodeError::Malformed("attestation object", "not a map".to_string()))?;

        let format = text_entry(map, "fmt")?;
        let statement = map_entry(map, "attStmt")?;
        let auth_data_bytes = bytes_entry(map, "authData")?;
        let auth_data = AuthenticatorData::parse(&auth_data_bytes)?;

        Ok(Self {
            format,
            statement,
            auth_data,
            auth_data_bytes,
        })
    }

    /// Check the attestation statement against policy.
    ///
    /// `client_data_hash` is SHA-256 of the raw clientDataJSON; `key` is the
    /// credential key from the attested credential data.
    pub fn verify_statement(
        &self,
        client_data_hash: &[u8; 32],
        key: &CoseKey,
    ) -> Result<AttestationFormat, CeremonyError> {
        match self.format.as_str() {
            "none" => {
                if !self.statement.is_empty() {
                    return Err(CeremonyError::InvalidAttestation(
                        "non-empty attStmt for fmt \"none\"".to_string(),
                    ));
                }
                Ok(AttestationFormat::None)
            }
            "packed" => {
                self.verify_packed_self(client_data_hash, key)?;
                Ok(AttestationFormat::Packed)
            }
            other => Err(CeremonyError::InvalidAttestation(format!(
                "unsupported format {:?}",
                other
            ))),
        }
    }

    /// Packed self-attestation: the credential key itself signs
    /// `authData || clientDataHash`. No certificate chain.
    fn verify_packed_self(
        &self,
        client_data_hash: &[u8; 32],
        key: &CoseKey,
    ) -> Result<(), CeremonyError> {
        if entry(&self.statement, "x5c").is_some() {
            return Err(CeremonyError::InvalidAttestation(
                "certificate chain attestation not supported".to_string(),
            ));
        }
        if entry(&self.statement, "ecdaaKeyId").is_some() {
            return Err(CeremonyError::InvalidAttestation(
                "ECDAA attestation not supported".to_string(),
            ));
        }

        let alg = int_entry(&self.statement, "alg")
            .map_err(|_| CeremonyError::InvalidAttestation("attStmt missing alg".to_string()))?;
        let sig = bytes_entry(&self.statement, "sig")
            .map_err(|_| CeremonyError::InvalidAttestation("attStmt missing sig".to_string()))?;

        let declared = CoseAlgorithm::from_cose(alg).ok_or_else(|| {
            CeremonyError::InvalidAttestation(format!("unsupported attStmt alg {}", alg))
        })?;
        if declared != key.algorithm() {
            return Err(CeremonyError::InvalidAttestation(format!(
                "attStmt alg {} does not match credential key {}",
                declared,
                key.algorithm()
            )));
        }

        let mut message = Vec::with_capacity(self.auth_data_bytes.len() + client_data_hash.len());
        message.extend_from_slice(&self.auth_data_bytes);
        message.extend_from_slice(client_data_hash);

        signature::verify(key, &message, &sig).map_err(|_| {
            CeremonyError::InvalidAttestation("self-attestation signature invalid".to_string())
        })
    }
}

fn entry<'a>(map: &'a [(Value, Value)], key: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| k.as_text() == Some(key))
        .map(|(_, v)| v)
}

fn text_entry(map: &[(Value, Value)], key: &'static str) -> Result<String, DecodeError> {
    entry(map, key)
        .and_then(Value::as_text)
        .map(ToOwned::to_owned)
        .ok_or(DecodeError::MissingField(key))
}

fn bytes_entry(map: &[(Value, Value)], key: &'static str) -> Result<Vec<u8>, DecodeError> {
    entry(map, key)
        .and_then(Value::as_bytes)
        .cloned()
        .ok_or(DecodeError::MissingField(key))
}

fn map_entry(map: &[(Value, Value)], key: &'static str) -> Result<Vec<(Value, Value)>, DecodeError> {
    entry(map, key)
        .and_then(Value::as_map)
        .cloned()
        .ok_or(DecodeError::MissingField(key))
}

fn int_entry(map: &[(Value, Value)], key: &'static str) -> Result<i64, DecodeError> {
    let value = entry(map, key)
        .and_then(Value::as_integer)
        .ok_or(DecodeError::MissingField(key))?;
    i64::try_from(value).map_err(|_| DecodeError::Malformed(key, "out of range".to_string()))
}
