//! Pending ceremony state.
//!
//! Options handed to a browser stay pending until the finish call arrives or
//! they expire (5 minutes). They are keyed by a random ceremony token and
//! removed on read, so a second submission under the same token finds
//! nothing. Short-lived state like this lives in process memory, not in the
//! credential store.

use dashmap::DashMap;
use std::time::{Duration, Instant};

use tessera_proto::{PublicKeyCredentialCreationOptions, PublicKeyCredentialRequestOptions};

/// Maximum age for a pending ceremony (5 minutes)
pub const PENDING_EXPIRY_SECS: u64 = 300;

struct Entry<T> {
    options: T,
    expires_at: Instant,
}

impl<T> Entry<T> {
    fn new(options: T) -> Self {
        Self {
            options,
            expires_at: Instant::now() + Duration::from_secs(PENDING_EXPIRY_SECS),
        }
    }
}

/// Ceremonies that have been started but not finished.
#[derive(Default)]
pub struct PendingCeremonies {
    /// Pending registrations (ceremony token -> creation options)
    registrations: DashMap<String, Entry<PublicKeyCredentialCreationOptions>>,
    /// Pending authentications (ceremony token -> request options)
    authentications: DashMap<String, Entry<PublicKeyCredentialRequestOptions>>,
}

impl PendingCeremonies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stash creation options under a ceremony token.
    pub fn store_registration(&self, token: String, options: PublicKeyCredentialCreationOptions) {
        self.registrations.insert(token, Entry::new(options));
    }

    /// Retrieve and remove pending creation options.
    ///
    /// Removal is atomic: concurrent duplicate submissions cannot both
    /// observe the options. Expired entries read as absent.
    pub fn take_registration(&self, token: &str) -> Option<PublicKeyCredentialCreationOptions> {
        let (_, entry) = self.registrations.remove(token)?;
        if entry.expires_at > Instant::now() {
            Some(entry.options)
        } else {
            None // Expired
        }
    }

    /// Stash request options under a ceremony token.
    pub fn store_authentication(&self, token: String, options: PublicKeyCredentialRequestOptions) {
        self.authentications.insert(token, Entry::new(options));
    }

    /// Retrieve and remove pending request options.
    pub fn take_authentication(&self, token: &str) -> Option<PublicKeyCredentialRequestOptions> {
        let (_, entry) = self.authentications.remove(token)?;
        if entry.expires_at > Instant::now() {
            Some(entry.options)
        } else {
            None // Expired
        }
    }

    /// Remove expired entries (called periodically).
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        self.registrations.retain(|_, entry| entry.expires_at > now);
        self.authentications
            .retain(|_, entry| entry.expires_at > now);
    }

    /// Number of pending registrations
    pub fn registration_count(&self) -> usize {
        self.registrations.len()
    }

    /// Number of pending authentications
    pub fn authentication_count(&self) -> usize {
        self.authentications.len()
    }
}

impl std::fmt::Debug for PendingCeremonies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCeremonies")
            .field("registrations", &self.registrations.len())
            .field("authentications", &self.authentications.len())
            .finish()
    }
}
