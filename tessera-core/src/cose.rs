//! COSE public key parsing.
//!
//! Credential public keys arrive as COSE_Key maps (RFC 9052 §7) inside the
//! attested credential data, and are persisted in that raw CBOR form.
//! Supported key types: EC2 on P-256 (ES256) and OKP Ed25519 (EdDSA).

use ciborium::Value;
use serde::{Deserialize, Serialize};

use tessera_proto::DecodeError;

// COSE_Key labels
const LABEL_KTY: i64 = 1;
const LABEL_ALG: i64 = 3;
const LABEL_CRV: i64 = -1;
const LABEL_X: i64 = -2;
const LABEL_Y: i64 = -3;

/// Signature algorithms accepted for credential keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoseAlgorithm {
    /// ECDSA w/ SHA-256 on P-256 (COSE alg -7)
    Es256,
    /// EdDSA over Ed25519 (COSE alg -8)
    EdDsa,
}

impl CoseAlgorithm {
    pub fn from_cose(alg: i64) -> Option<Self> {
        match alg {
            -7 => Some(Self::Es256),
            -8 => Some(Self::EdDsa),
            _ => None,
        }
    }

    /// The COSE registry value.
    pub fn cose_value(self) -> i64 {
        match self {
            Self::Es256 => -7,
            Self::EdDsa => -8,
        }
    }
}

impl std::fmt::Display for CoseAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Es256 => f.write_str("ES256"),
            Self::EdDsa => f.write_str("EdDSA"),
        }
    }
}

/// A parsed credential public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoseKey {
    /// EC2 key on P-256, uncompressed affine coordinates.
    Ec2 { x: [u8; 32], y: [u8; 32] },
    /// OKP Ed25519 public key.
    Okp { x: [u8; 32] },
}

impl CoseKey {
    pub fn algorithm(&self) -> CoseAlgorithm {
        match self {
            Self::Ec2 { .. } => CoseAlgorithm::Es256,
            Self::Okp { .. } => CoseAlgorithm::EdDsa,
        }
    }

    /// Parse from raw CBOR bytes (the stored wire form).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let value: Value =
            ciborium::de::from_reader(bytes).map_err(|e| DecodeError::Cbor(e.to_string()))?;
        Self::from_cbor(&value)
    }

    /// Parse a COSE_Key map, enforcing kty/alg/crv consistency.
    pub fn from_cbor(value: &Value) -> Result<Self, DecodeError> {
        let map = value
            .as_map()
            .ok_or_else(|| DecodeError::Malformed("COSE key", "not a map".to_string()))?;

        let kty = int_label(map, LABEL_KTY, "COSE kty")?;
        let alg = int_label(map, LABEL_ALG, "COSE alg")?;

        match (kty, alg) {
            // EC2 / ES256 on P-256 (crv 1)
            (2, -7) => {
                let crv = int_label(map, LABEL_CRV, "COSE crv")?;
                if crv != 1 {
                    return Err(DecodeError::Malformed(
                        "COSE key",
                        format!("EC2 curve {} is not P-256", crv),
                    ));
                }
                Ok(Self::Ec2 {
                    x: coordinate(map, LABEL_X, "COSE x")?,
                    y: coordinate(map, LABEL_Y, "COSE y")?,
                })
            }
            // OKP / EdDSA on Ed25519 (crv 6)
            (1, -8) => {
                let crv = int_label(map, LABEL_CRV, "COSE crv")?;
                if crv != 6 {
                    return Err(DecodeError::Malformed(
                        "COSE key",
                        format!("OKP curve {} is not Ed25519", crv),
                    ));
                }
                Ok(Self::Okp {
                    x: coordinate(map, LABEL_X, "COSE x")?,
                })
            }
            _ => Err(DecodeError::Malformed(
                "COSE key",
                format!("unsupported kty {} alg {}", kty, alg),
            )),
        }
    }
}

fn label<'a>(map: &'a [(Value, Value)], key: i64) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| k.as_integer() == Some(key.into()))
        .map(|(_, v)| v)
}

fn int_label(map: &[(Value, Value)], key: i64, name: &'static str) -> Result<i64, DecodeError> {
    let value = label(map, key)
        .and_then(Value::as_integer)
        .ok_or(DecodeError::MissingField(name))?;
    i64::try_from(value).map_err(|_| DecodeError::Malformed(name, "out of range".to_string()))
}

fn coordinate(
    map: &[(Value, Value)],
    key: i64,
    name: &'static str,
) -> Result<[u8; 32], DecodeError> {
    let bytes = label(map, key)
        .and_then(Value::as_bytes)
        .ok_or(DecodeError::MissingField(name))?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| DecodeError::Malformed(name, format!("{} bytes", bytes.len())))
}
