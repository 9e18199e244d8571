use std::{sync::Arc, time::Duration};

use folio_types::{
    Identity, config::{DEFAULT_OWNER_EMAIL, DEFAULT_ROLE_TIMEOUT, SessionConfig}
};
use tracing::{debug, warn};

use crate::{
    provider::RoleLookup, race::{Settled, first_settled}
};

/// Decides whether an identity holds the admin role.
///
/// The backend lookup is raced against `timeout`. A definite record decides;
/// a failed, empty or late lookup falls back to comparing the identity's
/// email with the designated owner address. Never errors.
#[derive(Clone)]
pub struct RoleResolver {
    lookup: Arc<dyn RoleLookup>,
    owner_email: String,
    timeout: Duration,
}

impl RoleResolver {
    pub fn new(lookup: Arc<dyn RoleLookup>) -> Self {
        Self {
            lookup,
            owner_email: DEFAULT_OWNER_EMAIL.to_string(),
            timeout: DEFAULT_ROLE_TIMEOUT,
        }
    }

    pub fn from_config(lookup: Arc<dyn RoleLookup>, config: &SessionConfig) -> Self {
        Self::new(lookup)
            .with_owner_email(config.owner_email.clone())
            .with_timeout(config.role_timeout)
    }

    pub fn with_owner_email(mut self, email: impl Into<String>) -> Self {
        self.owner_email = email.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn owner_email(&self) -> &str {
        &self.owner_email
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn resolve(&self, identity: &Identity) -> bool {
        match first_settled(self.lookup.fetch_role(&identity.id), self.timeout).await {
            Settled::Completed(Ok(Some(record))) => {
                debug!(identity = %identity.id, is_admin = record.is_admin, "role lookup settled");
                record.is_admin
            }
            Settled::Completed(Ok(None)) => {
                warn!(identity = %identity.id, "no role record, using owner email fallback");
                self.owner_fallback(identity)
            }
            Settled::Completed(Err(e)) => {
                warn!(identity = %identity.id, error = %e, "role lookup failed, using owner email fallback");
                self.owner_fallback(identity)
            }
            Settled::TimedOut => {
                warn!(
                    identity = %identity.id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "role lookup timed out, using owner email fallback"
                );
                self.owner_fallback(identity)
            }
        }
    }

    /// Exact, case-sensitive comparison with the owner address.
    pub fn owner_fallback(&self, identity: &Identity) -> bool {
        identity.email == self.owner_email
    }
}

impl std::fmt::Debug for RoleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleResolver")
            .field("owner_email", &self.owner_email)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
