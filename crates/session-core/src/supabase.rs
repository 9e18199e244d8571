//! Hosted-backend client (Supabase-compatible REST surface).
//!
//! Implements [`AuthProvider`](crate::AuthProvider) over the auth endpoints
//! and [`RoleLookup`](crate::RoleLookup) over the `profiles` table, and
//! accepts visitor messages into `contact_messages`. The signed-in session is
//! persisted to a token file so it survives restarts.

mod auth;
mod rest;
mod tokens;

use std::time::Duration;

use folio_types::{AuthChange, AuthEventKind, Identity, config::BackendConfig};
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use tokio::sync::{RwLock, broadcast};
use tracing::debug;
use url::Url;

pub use tokens::{StoredSession, TokenStore};

use crate::error::{SessionError, SessionResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct SupabaseClient {
    http: reqwest::Client,
    base: Url,
    anon_key: String,
    tokens: TokenStore,
    session: RwLock<Option<StoredSession>>,
    events: broadcast::Sender<AuthChange>,
}

impl SupabaseClient {
    pub fn new(config: &BackendConfig) -> SessionResult<Self> {
        let mut base = Url::parse(&config.url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let (events, _) = broadcast::channel(16);
        Ok(Self {
            http,
            base,
            anon_key: config.anon_key.clone(),
            tokens: TokenStore::new(config.token_file.clone()),
            session: RwLock::new(None),
            events,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> SessionResult<Url> {
        Ok(self.base.join(path)?)
    }

    /// Attach the API key and a bearer token (session token, or the anon key).
    fn authorize(&self, builder: RequestBuilder, access_token: Option<&str>) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token.unwrap_or(&self.anon_key))
    }

    /// Access token of the cached session, if any.
    async fn access_token(&self) -> Option<String> {
        self.session.read().await.as_ref().map(|s| s.access_token.clone())
    }

    /// Cached session, falling back to the token file.
    async fn stored_session(&self) -> SessionResult<Option<StoredSession>> {
        if let Some(session) = self.session.read().await.clone() {
            return Ok(Some(session));
        }
        let loaded = self.tokens.load().await?;
        if let Some(session) = &loaded {
            debug!(identity = %session.identity.id, "restored session from token file");
            *self.session.write().await = Some(session.clone());
        }
        Ok(loaded)
    }

    async fn remember(&self, session: StoredSession) -> SessionResult<()> {
        self.tokens.save(&session).await?;
        *self.session.write().await = Some(session);
        Ok(())
    }

    async fn forget(&self) -> SessionResult<()> {
        *self.session.write().await = None;
        self.tokens.clear().await
    }

    fn emit(&self, kind: AuthEventKind, identity: Option<Identity>) {
        // No subscribers is fine.
        let _ = self.events.send(AuthChange::new(kind, identity));
    }
}

/// Error body shapes returned by the auth and REST endpoints.
#[derive(Debug, Default, Deserialize)]
struct WireError {
    error: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl WireError {
    fn into_message(self) -> Option<String> {
        self.error_description.or(self.msg).or(self.message).or(self.error)
    }
}

/// Pass successful responses through; turn anything else into
/// [`SessionError::Backend`] with the server's message.
async fn check(resp: Response) -> SessionResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<WireError>(&body)
        .ok()
        .and_then(WireError::into_message)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    Err(SessionError::backend(status.as_u16(), message))
}
