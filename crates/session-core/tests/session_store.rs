use std::{sync::Arc, time::Duration};

use folio_types::{AuthEventKind, GateOutcome, Identity, RouteRequirement, SessionState, config::DEFAULT_OWNER_EMAIL};
use session_core::{
    RoleResolver, RouteGate, SessionStore, test_support::{EVENT_CAPACITY, MemoryAuthProvider, RoleScript, ScriptedRoleLookup}
};

struct Harness {
    provider: Arc<MemoryAuthProvider>,
    lookup: Arc<ScriptedRoleLookup>,
    store: Arc<SessionStore>,
}

fn harness(provider: MemoryAuthProvider, lookup: ScriptedRoleLookup) -> Harness {
    let provider = Arc::new(provider);
    let lookup = Arc::new(lookup);
    let store = SessionStore::new(provider.clone(), RoleResolver::new(lookup.clone()));
    Harness { provider, lookup, store }
}

fn owner() -> Identity {
    Identity::new("owner-id", DEFAULT_OWNER_EMAIL).with_display_name("Site Owner")
}

fn editor() -> Identity {
    Identity::new("editor-id", "editor@example.com")
}

#[tokio::test(start_paused = true)]
async fn cold_start_without_session_redirects() {
    let h = harness(MemoryAuthProvider::new(), ScriptedRoleLookup::new(RoleScript::Admin(true)));
    h.store.bootstrap().await;

    let state = h.store.snapshot();
    assert_eq!(state, SessionState::logged_out());
    assert_eq!(h.lookup.calls(), 0);

    let outcome = RouteGate::default().evaluate(&state, RouteRequirement::Admin);
    assert!(matches!(outcome, GateOutcome::RedirectToLogin { .. }));
}

#[tokio::test(start_paused = true)]
async fn bootstrap_publishes_identity_before_role() {
    let h = harness(
        MemoryAuthProvider::new().with_session(editor()),
        ScriptedRoleLookup::new(RoleScript::Delayed(Duration::from_millis(500), true)),
    );
    let mut rx = h.store.subscribe();

    let store = h.store.clone();
    let task = tokio::spawn(async move { store.bootstrap().await });

    rx.changed().await.unwrap();
    let first = rx.borrow_and_update().clone();
    assert_eq!(first, SessionState::resolving(editor()));

    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), SessionState::authenticated(editor(), true));
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn newer_identity_wins_over_late_result() {
    // A's lookup is slow and says admin; B's is fast and says not admin.
    let lookup = ScriptedRoleLookup::new(RoleScript::Admin(false))
        .with("a", RoleScript::Delayed(Duration::from_millis(2000), true))
        .with("b", RoleScript::Delayed(Duration::from_millis(100), false));
    let h = harness(MemoryAuthProvider::new(), lookup);
    let a = Identity::new("a", "a@example.com");
    let b = Identity::new("b", "b@example.com");

    let store = h.store.clone();
    let a_change = a.clone();
    let first = tokio::spawn(async move {
        store.on_auth_state_change(AuthEventKind::SignedIn, Some(a_change)).await;
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    h.store.on_auth_state_change(AuthEventKind::SignedIn, Some(b.clone())).await;
    assert_eq!(h.store.snapshot(), SessionState::authenticated(b.clone(), false));

    first.await.unwrap();
    assert_eq!(h.store.snapshot(), SessionState::authenticated(b, false));
}

#[tokio::test(start_paused = true)]
async fn same_identity_again_resets_role_before_resolving() {
    let h = harness(MemoryAuthProvider::new(), ScriptedRoleLookup::new(RoleScript::Admin(true)));
    h.store.on_auth_state_change(AuthEventKind::SignedIn, Some(editor())).await;
    assert!(h.store.snapshot().is_admin());

    h.lookup.set("editor-id", RoleScript::Delayed(Duration::from_millis(300), false));
    let mut rx = h.store.subscribe();
    let store = h.store.clone();
    let task = tokio::spawn(async move {
        store.on_auth_state_change(AuthEventKind::TokenRefreshed, Some(editor())).await;
    });

    rx.changed().await.unwrap();
    let interim = rx.borrow_and_update().clone();
    assert!(!interim.role_resolved);
    assert!(!interim.is_admin());

    task.await.unwrap();
    assert_eq!(h.store.snapshot(), SessionState::authenticated(editor(), false));
}

#[tokio::test(start_paused = true)]
async fn sign_out_during_resolution_drops_the_result() {
    let h = harness(
        MemoryAuthProvider::new(),
        ScriptedRoleLookup::new(RoleScript::Delayed(Duration::from_millis(1000), true)),
    );
    let store = h.store.clone();
    let pending = tokio::spawn(async move {
        store.on_auth_state_change(AuthEventKind::SignedIn, Some(editor())).await;
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    h.store.sign_out().await;

    pending.await.unwrap();
    assert_eq!(h.store.snapshot(), SessionState::logged_out());
}

#[tokio::test(start_paused = true)]
async fn sign_in_success_merges_role() {
    let h = harness(
        MemoryAuthProvider::new().with_account(owner(), "correct horse"),
        ScriptedRoleLookup::new(RoleScript::Fail),
    );
    h.store.bootstrap().await;

    let identity = h.store.sign_in(DEFAULT_OWNER_EMAIL, "correct horse").await.unwrap();
    assert_eq!(identity, owner());
    // Lookup failed, owner fallback applies.
    assert_eq!(h.store.snapshot(), SessionState::authenticated(owner(), true));
}

#[tokio::test(start_paused = true)]
async fn sign_in_failure_leaves_state_unchanged() {
    let h = harness(
        MemoryAuthProvider::new().with_account(owner(), "correct horse"),
        ScriptedRoleLookup::new(RoleScript::Admin(true)),
    );
    h.store.bootstrap().await;
    let before = h.store.snapshot();
    let mut rx = h.store.subscribe();

    let err = h.store.sign_in(DEFAULT_OWNER_EMAIL, "wrong").await.unwrap_err();
    assert_eq!(err.message, "Invalid login credentials");
    assert_eq!(err.status, Some(400));
    assert_eq!(h.store.snapshot(), before);
    assert!(!rx.has_changed().unwrap());
    assert_eq!(h.lookup.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn sign_out_is_fail_closed() {
    let h = harness(
        MemoryAuthProvider::new().with_session(owner()),
        ScriptedRoleLookup::new(RoleScript::Admin(true)),
    );
    h.store.bootstrap().await;
    assert!(h.store.snapshot().is_admin());

    h.provider.fail_sign_out(true);
    h.store.sign_out().await;
    let state = h.store.snapshot();
    assert_eq!(state.identity, None);
    assert!(!state.is_admin());
    assert!(!state.loading);
}

#[tokio::test(start_paused = true)]
async fn session_read_failure_renders_public_pages() {
    let provider = MemoryAuthProvider::new().with_session(owner());
    provider.fail_session_reads(true);
    let h = harness(provider, ScriptedRoleLookup::new(RoleScript::Admin(true)));
    h.store.bootstrap().await;

    let state = h.store.snapshot();
    assert_eq!(state, SessionState::logged_out());
    let gate = RouteGate::default();
    assert_eq!(gate.decide("/", &state), GateOutcome::Render);
    assert!(matches!(gate.decide("/admin", &state), GateOutcome::RedirectToLogin { .. }));
}

#[tokio::test(start_paused = true)]
async fn init_follows_provider_notifications() {
    let h = harness(
        MemoryAuthProvider::new().with_session(editor()),
        ScriptedRoleLookup::new(RoleScript::Admin(false)).with("owner-id", RoleScript::Admin(true)),
    );
    h.store.init().await;
    assert_eq!(h.store.snapshot(), SessionState::authenticated(editor(), false));

    // Signed in as someone else in another tab.
    h.provider.emit(AuthEventKind::SignedIn, Some(owner()));
    let mut rx = h.store.subscribe();
    let state = rx
        .wait_for(|s| s.identity_id() == Some("owner-id") && !s.loading)
        .await
        .unwrap()
        .clone();
    assert!(state.is_admin());

    // Signed out elsewhere.
    h.provider.emit(AuthEventKind::SignedOut, None);
    let state = rx.wait_for(|s| s.identity.is_none()).await.unwrap().clone();
    assert_eq!(state, SessionState::logged_out());

    h.store.dispose();
    h.provider.emit(AuthEventKind::SignedIn, Some(owner()));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.store.snapshot(), SessionState::logged_out());
}

#[tokio::test(start_paused = true)]
async fn sign_in_with_listener_settles_once_returned() {
    let h = harness(
        MemoryAuthProvider::new().with_account(editor(), "pw"),
        ScriptedRoleLookup::new(RoleScript::Delayed(Duration::from_millis(200), true)),
    );
    h.store.init().await;
    assert_eq!(h.store.snapshot(), SessionState::logged_out());

    h.store.sign_in("editor@example.com", "pw").await.unwrap();
    let state = h.store.wait_settled().await;
    assert_eq!(state, SessionState::authenticated(editor(), true));
}

#[tokio::test(start_paused = true)]
async fn sign_in_echo_keeps_settled_role() {
    let h = harness(
        MemoryAuthProvider::new().with_account(owner(), "pw"),
        ScriptedRoleLookup::new(RoleScript::Admin(true)),
    );
    h.store.init().await;
    h.store.sign_in(DEFAULT_OWNER_EMAIL, "pw").await.unwrap();
    assert_eq!(h.store.snapshot(), SessionState::authenticated(owner(), true));

    // The listener now sees the provider's own SignedIn for the same identity.
    let mut rx = h.store.subscribe();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!rx.has_changed().unwrap());
    assert_eq!(h.lookup.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn repeated_sign_in_for_settled_identity_is_ignored() {
    let h = harness(MemoryAuthProvider::new(), ScriptedRoleLookup::new(RoleScript::Admin(true)));
    h.store.on_auth_state_change(AuthEventKind::SignedIn, Some(editor())).await;
    let mut rx = h.store.subscribe();

    h.store.on_auth_state_change(AuthEventKind::SignedIn, Some(editor())).await;
    assert!(!rx.has_changed().unwrap());
    assert_eq!(h.lookup.calls(), 1);

    h.store.on_auth_state_change(AuthEventKind::SignedIn, Some(owner())).await;
    assert_eq!(h.store.snapshot(), SessionState::authenticated(owner(), true));
    assert_eq!(h.lookup.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn lagged_listener_rereads_session() {
    let h = harness(
        MemoryAuthProvider::new(),
        ScriptedRoleLookup::new(RoleScript::Admin(false)).with("owner-id", RoleScript::Admin(true)),
    );
    h.store.init().await;
    assert_eq!(h.provider.session_reads(), 1);

    // Overflow the notification buffer before the listener gets to run.
    for i in 0..EVENT_CAPACITY + 8 {
        let identity = if i % 2 == 0 { editor() } else { owner() };
        h.provider.emit(AuthEventKind::TokenRefreshed, Some(identity));
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(h.provider.session_reads(), 2);
    assert_eq!(h.provider.persisted(), Some(owner()));
    assert_eq!(h.store.snapshot(), SessionState::authenticated(owner(), true));
}
