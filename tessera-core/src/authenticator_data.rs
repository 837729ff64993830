//! Authenticator data parsing.
//!
//! Binary layout per WebAuthn §6.1:
//!
//! ```text
//! rpIdHash[32] || flags[1] || signCount[4] || [attestedCredentialData] || [extensions]
//! attestedCredentialData = aaguid[16] || credIdLen[2] || credId || cosePublicKey
//! ```
//!
//! The COSE key is kept as raw bytes here; interpreting it is a ceremony
//! concern with its own error class.

use tessera_proto::DecodeError;

/// Flag bits in the authenticator data flags byte.
pub mod flags {
    /// User present (UP)
    pub const USER_PRESENT: u8 = 0x01;
    /// User verified (UV)
    pub const USER_VERIFIED: u8 = 0x04;
    /// Backup eligible (BE)
    pub const BACKUP_ELIGIBLE: u8 = 0x08;
    /// Backup state (BS)
    pub const BACKUP_STATE: u8 = 0x10;
    /// Attested credential data included (AT)
    pub const ATTESTED_CREDENTIAL_DATA: u8 = 0x40;
    /// Extension data included (ED)
    pub const EXTENSION_DATA: u8 = 0x80;
}

const FIXED_LEN: usize = 37;
const MAX_CREDENTIAL_ID_LEN: usize = 1023;

/// Credential material carried when the AT flag is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestedCredentialData {
    pub aaguid: [u8; 16],
    pub credential_id: Vec<u8>,
    /// COSE_Key bytes exactly as they appeared on the wire.
    pub public_key_bytes: Vec<u8>,
}

/// Parsed authenticator data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatorData {
    pub rp_id_hash: [u8; 32],
    pub flags: u8,
    pub sign_count: u32,
    pub attested_credential: Option<AttestedCredentialData>,
}

impl AuthenticatorData {
    /// Parse authenticator data from its binary form.
    pub fn parse(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < FIXED_LEN {
            return Err(DecodeError::Truncated("authenticator data"));
        }

        let mut rp_id_hash = [0u8; 32];
        rp_id_hash.copy_from_slice(&bytes[..32]);
        let flags = bytes[32];
        let sign_count = u32::from_be_bytes([bytes[33], bytes[34], bytes[35], bytes[36]]);

        let mut rest = &bytes[FIXED_LEN..];
        let attested_credential = if flags & flags::ATTESTED_CREDENTIAL_DATA != 0 {
            let (attested, remaining) = parse_attested_credential(rest)?;
            rest = remaining;
            Some(attested)
        } else {
            None
        };

        // Whatever follows must be extension CBOR, which requires the ED flag.
        if flags & flags::EXTENSION_DATA == 0 && !rest.is_empty() {
            return Err(DecodeError::Malformed(
                "authenticator data",
                format!("{} trailing bytes without extension flag", rest.len()),
            ));
        }

        Ok(Self {
            rp_id_hash,
            flags,
            sign_count,
            attested_credential,
        })
    }

    pub fn user_present(&self) -> bool {
        self.flags & flags::USER_PRESENT != 0
    }

    pub fn user_verified(&self) -> bool {
        self.flags & flags::USER_VERIFIED != 0
    }

    pub fn backup_eligible(&self) -> bool {
        self.flags & flags::BACKUP_ELIGIBLE != 0
    }

    pub fn backup_state(&self) -> bool {
        self.flags & flags::BACKUP_STATE != 0
    }
}

fn parse_attested_credential(
    bytes: &[u8],
) -> Result<(AttestedCredentialData, &[u8]), DecodeError> {
    if bytes.len() < 18 {
        return Err(DecodeError::Truncated("attested credential data"));
    }
    let mut aaguid = [0u8; 16];
    aaguid.copy_from_slice(&bytes[..16]);

    let id_len = u16::from_be_bytes([bytes[16], bytes[17]]) as usize;
    if id_len == 0 || id_len > MAX_CREDENTIAL_ID_LEN {
        return Err(DecodeError::Malformed(
            "credential ID",
            format!("length {}", id_len),
        ));
    }
    let rest = &bytes[18..];
    if rest.len() < id_len {
        return Err(DecodeError::Truncated("credential ID"));
    }
    let credential_id = rest[..id_len].to_vec();
    let key_bytes = &rest[id_len..];

    // Read exactly one CBOR value to find where the key ends; extensions may
    // follow it.
    let mut cursor = std::io::Cursor::new(key_bytes);
    let _: ciborium::Value = ciborium::de::from_reader(&mut cursor)
        .map_err(|e| DecodeError::Cbor(e.to_string()))?;
    let consumed = cursor.position() as usize;

    Ok((
        AttestedCredentialData {
            aaguid,
            credential_id,
            public_key_bytes: key_bytes[..consumed].to_vec(),
        },
        &key_bytes[consumed..],
    ))
}
