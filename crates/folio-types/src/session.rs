use serde::{Deserialize, Serialize};

use crate::auth::Identity;

/// Snapshot of "who is signed in and are they an admin".
///
/// Identity and role always travel together: a snapshot never pairs an
/// identity with a role computed for a different identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub identity: Option<Identity>,
    /// Whether `is_admin` has been computed for `identity`.
    pub role_resolved: bool,
    is_admin: bool,
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}

impl SessionState {
    /// State before the first bootstrap completes.
    pub fn initial() -> Self {
        Self {
            identity: None,
            role_resolved: false,
            is_admin: false,
            loading: true,
        }
    }

    pub fn logged_out() -> Self {
        Self {
            identity: None,
            role_resolved: true,
            is_admin: false,
            loading: false,
        }
    }

    /// Identity confirmed, role not yet known.
    pub fn resolving(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            role_resolved: false,
            is_admin: false,
            loading: true,
        }
    }

    pub fn authenticated(identity: Identity, is_admin: bool) -> Self {
        Self {
            identity: Some(identity),
            role_resolved: true,
            is_admin,
            loading: false,
        }
    }

    /// Admin flag; always false without an identity or before resolution.
    pub fn is_admin(&self) -> bool {
        self.identity.is_some() && self.role_resolved && self.is_admin
    }

    pub fn identity_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.id.as_str())
    }

    pub fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }
}
