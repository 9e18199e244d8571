//! In-memory fakes for the provider traits.
//!
//! Used by the unit and integration tests to script provider outcomes
//! (failing session reads, failing sign-out, slow or hanging role lookups)
//! without a hosted backend.

use std::{
    collections::HashMap, sync::{
        Mutex, atomic::{AtomicBool, AtomicUsize, Ordering}
    }, time::Duration
};

use async_trait::async_trait;
use folio_types::{AuthChange, AuthErrorDescriptor, AuthEventKind, Identity, LoginRequest, RoleRecord};
use secrecy::ExposeSecret;
use tokio::sync::broadcast;

use crate::{
    error::{SessionError, SessionResult}, provider::{AuthProvider, RoleLookup}
};

/// Buffer size of [`MemoryAuthProvider`]'s notification channel.
pub const EVENT_CAPACITY: usize = 32;

/// Auth provider backed by a map of accounts.
pub struct MemoryAuthProvider {
    accounts: Mutex<HashMap<String, (String, Identity)>>,
    session: Mutex<Option<Identity>>,
    fail_session: AtomicBool,
    session_reads: AtomicUsize,
    fail_sign_out: AtomicBool,
    events: broadcast::Sender<AuthChange>,
}

impl Default for MemoryAuthProvider {
    fn default() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            accounts: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
            fail_session: AtomicBool::new(false),
            session_reads: AtomicUsize::new(0),
            fail_sign_out: AtomicBool::new(false),
            events,
        }
    }
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, identity: Identity, password: &str) -> Self {
        self.lock_accounts()
            .insert(identity.email.clone(), (password.to_string(), identity));
        self
    }

    /// Start with `identity` already persisted, as after a page reload.
    pub fn with_session(self, identity: Identity) -> Self {
        *self.lock_session() = Some(identity);
        self
    }

    pub fn fail_session_reads(&self, fail: bool) {
        self.fail_session.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    /// Number of `current_session` calls so far.
    pub fn session_reads(&self) -> usize {
        self.session_reads.load(Ordering::SeqCst)
    }

    pub fn persisted(&self) -> Option<Identity> {
        self.lock_session().clone()
    }

    /// Push a notification as if it came from another tab or a token refresh.
    pub fn emit(&self, kind: AuthEventKind, identity: Option<Identity>) {
        *self.lock_session() = identity.clone();
        let _ = self.events.send(AuthChange::new(kind, identity));
    }

    fn lock_accounts(&self) -> std::sync::MutexGuard<'_, HashMap<String, (String, Identity)>> {
        self.accounts.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_session(&self) -> std::sync::MutexGuard<'_, Option<Identity>> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn current_session(&self) -> SessionResult<Option<Identity>> {
        self.session_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_session.load(Ordering::SeqCst) {
            return Err(SessionError::unavailable("session storage unreachable"));
        }
        Ok(self.persisted())
    }

    async fn sign_in_with_password(&self, request: &LoginRequest) -> SessionResult<Identity> {
        let identity = {
            let accounts = self.lock_accounts();
            match accounts.get(&request.email) {
                Some((password, identity)) if password == request.password.expose_secret() => identity.clone(),
                _ => {
                    return Err(SessionError::Credentials(
                        AuthErrorDescriptor::new("Invalid login credentials").with_status(400),
                    ));
                }
            }
        };
        self.emit(AuthEventKind::SignedIn, Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> SessionResult<()> {
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(SessionError::unavailable("sign-out request failed"));
        }
        self.emit(AuthEventKind::SignedOut, None);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }
}

/// Scripted outcome of a role lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleScript {
    Admin(bool),
    Missing,
    Fail,
    /// Never settles.
    Hang,
    /// Settles with the flag after the delay.
    Delayed(Duration, bool),
}

/// Role lookup whose outcome is scripted per identity id.
pub struct ScriptedRoleLookup {
    default: RoleScript,
    per_identity: Mutex<HashMap<String, RoleScript>>,
    calls: AtomicUsize,
}

impl ScriptedRoleLookup {
    pub fn new(default: RoleScript) -> Self {
        Self {
            default,
            per_identity: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(self, identity_id: &str, script: RoleScript) -> Self {
        self.set(identity_id, script);
        self
    }

    pub fn set(&self, identity_id: &str, script: RoleScript) {
        self.per_identity
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(identity_id.to_string(), script);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn script_for(&self, identity_id: &str) -> RoleScript {
        self.per_identity
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(identity_id)
            .copied()
            .unwrap_or(self.default)
    }
}

#[async_trait]
impl RoleLookup for ScriptedRoleLookup {
    async fn fetch_role(&self, identity_id: &str) -> SessionResult<Option<RoleRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script_for(identity_id) {
            RoleScript::Admin(is_admin) => Ok(Some(RoleRecord { is_admin })),
            RoleScript::Missing => Ok(None),
            RoleScript::Fail => Err(SessionError::lookup("profiles table unreachable")),
            RoleScript::Hang => std::future::pending().await,
            RoleScript::Delayed(delay, is_admin) => {
                tokio::time::sleep(delay).await;
                Ok(Some(RoleRecord { is_admin }))
            }
        }
    }
}
