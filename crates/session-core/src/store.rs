//! Session store: who is signed in, and are they an admin.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use folio_types::{AuthChange, AuthErrorDescriptor, AuthEventKind, Identity, LoginRequest, SessionState};
use tokio::{
    sync::{broadcast::error::RecvError, watch}, task::JoinHandle
};
use tracing::{debug, error, info, warn};

use crate::{
    provider::AuthProvider, race::{Epoch, ResolutionTag}, role::RoleResolver
};

/// Owns the [`SessionState`] and every transition applied to it.
///
/// Transitions come from [`bootstrap`](Self::bootstrap), provider
/// notifications, [`sign_in`](Self::sign_in) and [`sign_out`](Self::sign_out).
/// Each one advances an epoch; role results computed under an older epoch are
/// dropped, so subscribers never see an identity paired with another
/// identity's role.
pub struct SessionStore {
    provider: Arc<dyn AuthProvider>,
    resolver: RoleResolver,
    state_tx: watch::Sender<SessionState>,
    epoch: Mutex<Epoch>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionStore {
    pub fn new(provider: Arc<dyn AuthProvider>, resolver: RoleResolver) -> Arc<Self> {
        let (state_tx, _) = watch::channel(SessionState::initial());
        Arc::new(Self {
            provider,
            resolver,
            state_tx,
            epoch: Mutex::new(Epoch::default()),
            listener: Mutex::new(None),
        })
    }

    /// Start listening to provider notifications, then bootstrap.
    ///
    /// The subscription is taken before the session read so that nothing
    /// pushed during bootstrap is missed. Calling `init` again replaces the
    /// previous listener.
    pub async fn init(self: &Arc<Self>) {
        let rx = self.provider.subscribe();
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(listen(weak, rx));
        if let Some(previous) = self.lock_listener().replace(handle) {
            previous.abort();
        }
        self.bootstrap().await;
    }

    /// Stop listening to provider notifications.
    pub fn dispose(&self) {
        if let Some(handle) = self.lock_listener().take() {
            handle.abort();
            debug!("session store listener stopped");
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state_tx.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Read the persisted session and settle identity and role.
    ///
    /// Never fails: a provider error is logged and treated as signed out. If
    /// another transition lands while the provider is being read, that newer
    /// transition wins and this read is discarded.
    pub async fn bootstrap(&self) {
        let started_at = self.lock_epoch().current();
        match self.provider.current_session().await {
            Ok(Some(identity)) => {
                let Some(tag) = self.begin_resolving_if(started_at, identity.clone()) else {
                    debug!("bootstrap superseded by a newer auth event");
                    return;
                };
                self.finish_resolving(tag, identity).await;
            }
            Ok(None) => {
                debug!("no persisted session");
                self.publish_logged_out_if(Some(started_at));
            }
            Err(e) => {
                error!(error = %e, "session retrieval failed, continuing signed out");
                self.publish_logged_out_if(Some(started_at));
            }
        }
    }

    /// React to a provider notification.
    ///
    /// The role is reset to unresolved before re-resolving, even when the
    /// identity did not change (token refresh). A `SignedIn` for the identity
    /// that is already settled, such as the provider echoing a completed
    /// [`sign_in`](Self::sign_in), leaves the state alone.
    pub async fn on_auth_state_change(&self, kind: AuthEventKind, identity: Option<Identity>) {
        if let Some((tag, identity)) = self.accept_change(kind, identity) {
            self.finish_resolving(tag, identity).await;
        }
    }

    /// Verify credentials with the provider, then settle the role.
    ///
    /// Nothing is published before the provider confirms. On failure the
    /// state is left untouched and the descriptor is returned for display.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthErrorDescriptor> {
        self.sign_in_with(LoginRequest::new(email, password)).await
    }

    pub async fn sign_in_with(&self, request: LoginRequest) -> Result<Identity, AuthErrorDescriptor> {
        let identity = match self.provider.sign_in_with_password(&request).await {
            Ok(identity) => identity,
            Err(e) => {
                warn!(email = %request.email, error = %e, "sign-in rejected");
                return Err(e.into_descriptor());
            }
        };
        info!(identity = %identity.id, "signed in");

        let tag = self.begin_resolving(identity.clone());
        if !self.finish_resolving(tag, identity.clone()).await {
            // A provider notification re-resolved in the meantime; wait for it.
            self.wait_settled().await;
        }
        Ok(identity)
    }

    /// Sign out with the provider and clear local state regardless of the
    /// provider's answer.
    pub async fn sign_out(&self) {
        // Invalidate in-flight role results before the provider round trip.
        self.lock_epoch().advance();
        if let Err(e) = self.provider.sign_out().await {
            warn!(error = %e, "provider sign-out failed, clearing local session anyway");
        }
        self.publish_logged_out_if(None);
        info!("signed out");
    }

    /// Wait until the current transition is no longer loading.
    pub async fn wait_settled(&self) -> SessionState {
        let mut rx = self.subscribe();
        match rx.wait_for(|state| !state.loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.snapshot(),
        }
    }

    /// Synchronous half of a notification: publish the reset state and hand
    /// back the pending resolution, if any.
    fn accept_change(&self, kind: AuthEventKind, identity: Option<Identity>) -> Option<(ResolutionTag, Identity)> {
        debug!(event = %kind, identity = ?identity.as_ref().map(|i| i.id.as_str()), "auth state change");
        match identity {
            Some(identity) => {
                let mut epoch = self.lock_epoch();
                if kind == AuthEventKind::SignedIn && self.is_settled_as(&identity) {
                    debug!(identity = %identity.id, "sign-in for the settled identity, keeping its role");
                    return None;
                }
                let tag = self.start_resolving(&mut epoch, identity.clone());
                Some((tag, identity))
            }
            None => {
                self.publish_logged_out_if(None);
                None
            }
        }
    }

    fn is_settled_as(&self, identity: &Identity) -> bool {
        let state = self.state_tx.borrow();
        !state.loading && state.role_resolved && state.identity.as_ref() == Some(identity)
    }

    fn begin_resolving(&self, identity: Identity) -> ResolutionTag {
        let mut epoch = self.lock_epoch();
        self.start_resolving(&mut epoch, identity)
    }

    /// Like `begin_resolving`, but only if no other transition happened since
    /// epoch `expected`.
    fn begin_resolving_if(&self, expected: u64, identity: Identity) -> Option<ResolutionTag> {
        let mut epoch = self.lock_epoch();
        if epoch.current() != expected {
            return None;
        }
        Some(self.start_resolving(&mut epoch, identity))
    }

    /// Publish `resolving(identity)` under a fresh epoch.
    fn start_resolving(&self, epoch: &mut Epoch, identity: Identity) -> ResolutionTag {
        epoch.advance();
        let tag = epoch.tag(identity.id.clone());
        self.state_tx.send_replace(SessionState::resolving(identity));
        tag
    }

    fn publish_logged_out_if(&self, expected: Option<u64>) {
        let mut epoch = self.lock_epoch();
        if expected.is_some_and(|e| e != epoch.current()) {
            debug!("sign-out transition superseded by a newer auth event");
            return;
        }
        epoch.advance();
        self.state_tx.send_replace(SessionState::logged_out());
    }

    /// Resolve the role and merge it if `tag` is still current.
    async fn finish_resolving(&self, tag: ResolutionTag, identity: Identity) -> bool {
        let is_admin = self.resolver.resolve(&identity).await;

        let epoch = self.lock_epoch();
        let current_id = self.state_tx.borrow().identity_id().map(str::to_owned);
        if !epoch.is_current(&tag, current_id.as_deref()) {
            debug!(identity = %tag.identity_id, epoch = tag.epoch, "dropping stale role result");
            return false;
        }
        self.state_tx
            .send_replace(SessionState::authenticated(identity, is_admin));
        drop(epoch);
        debug!(identity = %tag.identity_id, is_admin, "role merged");
        true
    }

    fn lock_epoch(&self) -> MutexGuard<'_, Epoch> {
        self.epoch.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_listener(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.listener.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Apply provider notifications in arrival order; role lookups run
/// concurrently so a newer notification can supersede an older one.
async fn listen(store: Weak<SessionStore>, mut rx: tokio::sync::broadcast::Receiver<AuthChange>) {
    loop {
        match rx.recv().await {
            Ok(change) => {
                let Some(store) = store.upgrade() else { break };
                if let Some((tag, identity)) = store.accept_change(change.kind, change.identity) {
                    tokio::spawn(async move {
                        store.finish_resolving(tag, identity).await;
                    });
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "auth notifications lagged, re-reading session");
                let Some(store) = store.upgrade() else { break };
                store.bootstrap().await;
            }
            Err(RecvError::Closed) => {
                debug!("auth notification channel closed");
                break;
            }
        }
    }
}
