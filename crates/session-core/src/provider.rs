//! Boundaries to the hosted auth service and the role/profile table.
//!
//! The session store only ever talks to these traits, which keeps it
//! independent of the concrete backend (see [`crate::supabase`]) and lets the
//! tests drive it with in-memory fakes.

use async_trait::async_trait;
use folio_types::{AuthChange, Identity, LoginRequest, RoleRecord};
use tokio::sync::broadcast;

use crate::error::SessionResult;

/// Authentication provider consumed by [`crate::SessionStore`].
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Current persisted session, if any.
    async fn current_session(&self) -> SessionResult<Option<Identity>>;

    /// Verify credentials. Bad credentials come back as
    /// [`crate::SessionError::Credentials`].
    async fn sign_in_with_password(&self, request: &LoginRequest) -> SessionResult<Identity>;

    async fn sign_out(&self) -> SessionResult<()>;

    /// Push channel of out-of-band auth state changes.
    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;
}

/// Lookup of the role/profile record for an identity.
#[async_trait]
pub trait RoleLookup: Send + Sync {
    /// `Ok(None)` when no record exists for `identity_id`.
    async fn fetch_role(&self, identity_id: &str) -> SessionResult<Option<RoleRecord>>;
}
