//! Relying Party configuration.
//!
//! Identity of the verifying server (RP ID, origin, display name) plus the
//! ceremony policy knobs. The RP ID must be the effective domain of the
//! origin; construction enforces this so a misconfigured deployment fails at
//! startup instead of rejecting every ceremony.

use sha2::{Digest, Sha256};
use url::Url;

use tessera_proto::{AuthenticatorAttachment, ResidentKeyRequirement, UserVerificationPolicy};

/// Default ceremony timeout handed to the browser (milliseconds).
pub const DEFAULT_TIMEOUT_MS: u32 = 60_000;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid origin URL: {0}")]
    InvalidOrigin(String),
    #[error("Origin host {host:?} does not match RP ID {rp_id:?}")]
    OriginRpIdMismatch { host: String, rp_id: String },
    #[error("RP ID must not be empty")]
    EmptyRpId,
}

/// Relying Party identity and ceremony policy.
#[derive(Debug, Clone)]
pub struct RelyingParty {
    name: String,
    id: String,
    origin: Url,
    allow_subdomains: bool,
    user_verification: UserVerificationPolicy,
    resident_key: ResidentKeyRequirement,
    authenticator_attachment: Option<AuthenticatorAttachment>,
    timeout_ms: u32,
}

/// Builder for [`RelyingParty`].
pub struct RelyingPartyBuilder {
    name: Option<String>,
    id: String,
    origin: Url,
    allow_subdomains: bool,
    user_verification: UserVerificationPolicy,
    resident_key: ResidentKeyRequirement,
    authenticator_attachment: Option<AuthenticatorAttachment>,
    timeout_ms: u32,
}

impl RelyingPartyBuilder {
    /// Human-readable name shown by the browser (defaults to the RP ID).
    pub fn rp_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Accept origins on subdomains of the RP ID (default: off).
    pub fn allow_subdomains(mut self, allow: bool) -> Self {
        self.allow_subdomains = allow;
        self
    }

    pub fn user_verification(mut self, policy: UserVerificationPolicy) -> Self {
        self.user_verification = policy;
        self
    }

    pub fn resident_key(mut self, requirement: ResidentKeyRequirement) -> Self {
        self.resident_key = requirement;
        self
    }

    pub fn authenticator_attachment(
        mut self,
        attachment: Option<AuthenticatorAttachment>,
    ) -> Self {
        self.authenticator_attachment = attachment;
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Validate the origin against the RP ID and produce the configuration.
    pub fn build(self) -> Result<RelyingParty, ConfigError> {
        if self.id.is_empty() {
            return Err(ConfigError::EmptyRpId);
        }
        let host = self
            .origin
            .host_str()
            .ok_or_else(|| ConfigError::InvalidOrigin(self.origin.to_string()))?;
        let suffix = format!(".{}", self.id);
        let host_ok = host == self.id || (self.allow_subdomains && host.ends_with(&suffix));
        if !host_ok {
            return Err(ConfigError::OriginRpIdMismatch {
                host: host.to_string(),
                rp_id: self.id,
            });
        }

        Ok(RelyingParty {
            name: self.name.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            origin: self.origin,
            allow_subdomains: self.allow_subdomains,
            user_verification: self.user_verification,
            resident_key: self.resident_key,
            authenticator_attachment: self.authenticator_attachment,
            timeout_ms: self.timeout_ms,
        })
    }
}

impl RelyingParty {
    /// Start building a configuration.
    ///
    /// # Arguments
    ///
    /// * `rp_id` - Relying Party ID (typically the domain name)
    /// * `rp_origin` - Relying Party origin URL
    pub fn builder(rp_id: &str, rp_origin: &Url) -> RelyingPartyBuilder {
        RelyingPartyBuilder {
            name: None,
            id: rp_id.to_string(),
            origin: rp_origin.clone(),
            allow_subdomains: false,
            user_verification: UserVerificationPolicy::Preferred,
            resident_key: ResidentKeyRequirement::Required,
            authenticator_attachment: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Configuration with default policy (preferred UV, resident keys
    /// required for username-less login, no attachment preference).
    pub fn new(rp_id: &str, rp_origin: &Url, rp_name: &str) -> Result<Self, ConfigError> {
        Self::builder(rp_id, rp_origin).rp_name(rp_name).build()
    }

    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `TESSERA_RP_ID` - Relying Party ID (default: "localhost")
    /// - `TESSERA_RP_ORIGIN` - RP origin URL (default: "http://localhost:3000")
    /// - `TESSERA_RP_NAME` - RP display name (default: "Tessera")
    pub fn from_env() -> Result<Self, ConfigError> {
        let rp_id = std::env::var("TESSERA_RP_ID").unwrap_or_else(|_| "localhost".to_string());
        let rp_origin = std::env::var("TESSERA_RP_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        let rp_name = std::env::var("TESSERA_RP_NAME").unwrap_or_else(|_| "Tessera".to_string());

        let origin =
            Url::parse(&rp_origin).map_err(|e| ConfigError::InvalidOrigin(format!("{}", e)))?;

        Self::new(&rp_id, &origin, &rp_name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn user_verification(&self) -> UserVerificationPolicy {
        self.user_verification
    }

    /// Whether policy demands the UV flag on every ceremony.
    pub fn user_verification_required(&self) -> bool {
        self.user_verification == UserVerificationPolicy::Required
    }

    pub fn resident_key(&self) -> ResidentKeyRequirement {
        self.resident_key
    }

    pub fn authenticator_attachment(&self) -> Option<AuthenticatorAttachment> {
        self.authenticator_attachment
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// SHA-256 of the RP ID, as authenticators bind it into their data.
    pub fn rp_id_hash(&self) -> [u8; 32] {
        Sha256::digest(self.id.as_bytes()).into()
    }

    /// Whether a client-reported origin belongs to this Relying Party.
    ///
    /// Scheme and port must match the configured origin; the host must be the
    /// configured host, or any subdomain of the RP ID when subdomains are
    /// allowed.
    pub(crate) fn origin_matches(&self, candidate: &str) -> bool {
        let Ok(url) = Url::parse(candidate) else {
            return false;
        };
        if url.scheme() != self.origin.scheme()
            || url.port_or_known_default() != self.origin.port_or_known_default()
        {
            return false;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        if self.allow_subdomains {
            host == self.id || host.ends_with(&format!(".{}", self.id))
        } else {
            host == self.origin.host_str().unwrap_or_default()
        }
    }
}
