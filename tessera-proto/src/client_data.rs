//! Collected client data.
//!
//! The browser serializes what it saw during the ceremony (type, challenge,
//! origin) into `clientDataJSON`. The authenticator signs over its hash, so
//! these fields are the tamper-evident record of where the ceremony ran.

use serde::{Deserialize, Serialize};

use crate::base64url::Base64UrlBytes;
use crate::error::Result;

/// `type` value the browser writes for registration ceremonies.
pub const CLIENT_DATA_TYPE_CREATE: &str = "webauthn.create";

/// `type` value the browser writes for authentication ceremonies.
pub const CLIENT_DATA_TYPE_GET: &str = "webauthn.get";

/// Parsed `clientDataJSON` contents.
///
/// Unknown fields (`tokenBinding`, `topOrigin`, vendor extras) are ignored;
/// only the fields checked by the ceremony are modeled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedClientData {
    #[serde(rename = "type")]
    pub type_: String,
    /// Challenge bytes echoed back by the browser.
    pub challenge: Base64UrlBytes,
    /// Origin the browser performed the ceremony on, e.g. `https://example.com`.
    pub origin: String,
    #[serde(rename = "crossOrigin", default)]
    pub cross_origin: bool,
}

impl CollectedClientData {
    /// Parse the decoded `clientDataJSON` bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
