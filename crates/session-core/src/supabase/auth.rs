use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use folio_types::{AuthChange, AuthErrorDescriptor, AuthEventKind, Identity, LoginRequest};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{StoredSession, SupabaseClient, check};
use crate::{
    error::{SessionError, SessionResult}, provider::AuthProvider
};

#[derive(Debug, Default, Deserialize)]
struct WireMetadata {
    full_name: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: Option<WireMetadata>,
}

impl From<WireUser> for Identity {
    fn from(user: WireUser) -> Self {
        let display_name = user.user_metadata.and_then(|m| m.full_name.or(m.name));
        Identity {
            id: user.id,
            email: user.email.unwrap_or_default(),
            display_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: WireUser,
}

impl From<TokenResponse> for StoredSession {
    fn from(resp: TokenResponse) -> Self {
        let expires_at = match (resp.expires_at, resp.expires_in) {
            (Some(at), _) => chrono::DateTime::from_timestamp(at, 0),
            (None, Some(secs)) => Some(Utc::now() + ChronoDuration::seconds(secs)),
            (None, None) => None,
        };
        StoredSession {
            access_token: resp.access_token,
            refresh_token: resp.refresh_token,
            expires_at,
            identity: resp.user.into(),
        }
    }
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

impl SupabaseClient {
    async fn fetch_user(&self, access_token: &str) -> SessionResult<Identity> {
        let url = self.endpoint("auth/v1/user")?;
        let resp = self.authorize(self.http.get(url), Some(access_token)).send().await?;
        let user: WireUser = check(resp).await?.json().await?;
        Ok(user.into())
    }

    async fn refresh(&self, refresh_token: &str) -> SessionResult<StoredSession> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "refresh_token");
        let resp = self
            .authorize(self.http.post(url), None)
            .json(&RefreshGrant { refresh_token })
            .send()
            .await?;
        let tokens: TokenResponse = check(resp).await?.json().await?;
        Ok(tokens.into())
    }

    /// Refresh a rejected or expired session; a refresh the server refuses
    /// means the stored session is dead and is forgotten.
    async fn refresh_or_forget(&self, stored: StoredSession) -> SessionResult<Option<Identity>> {
        match self.refresh(&stored.refresh_token).await {
            Ok(session) => {
                let identity = session.identity.clone();
                self.remember(session).await?;
                debug!(identity = %identity.id, "session refreshed");
                self.emit(AuthEventKind::TokenRefreshed, Some(identity.clone()));
                Ok(Some(identity))
            }
            Err(e) if e.status().is_some_and(|s| (400..500).contains(&s)) => {
                info!(identity = %stored.identity.id, error = %e, "stored session rejected, forgetting it");
                self.forget().await?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl AuthProvider for SupabaseClient {
    async fn current_session(&self) -> SessionResult<Option<Identity>> {
        let Some(stored) = self.stored_session().await? else {
            return Ok(None);
        };
        if stored.is_expired(Utc::now()) {
            return self.refresh_or_forget(stored).await;
        }
        match self.fetch_user(&stored.access_token).await {
            Ok(identity) => {
                if identity != stored.identity {
                    self.remember(StoredSession {
                        identity: identity.clone(),
                        ..stored
                    })
                    .await?;
                }
                Ok(Some(identity))
            }
            Err(e) if matches!(e.status(), Some(401) | Some(403)) => self.refresh_or_forget(stored).await,
            Err(e) => Err(e),
        }
    }

    async fn sign_in_with_password(&self, request: &LoginRequest) -> SessionResult<Identity> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let resp = self
            .authorize(self.http.post(url), None)
            .json(&PasswordGrant {
                email: &request.email,
                password: request.password.expose_secret(),
            })
            .send()
            .await?;

        let tokens: TokenResponse = match check(resp).await {
            Ok(resp) => resp.json().await?,
            Err(SessionError::Backend { status, message }) if (400..500).contains(&status) => {
                return Err(SessionError::Credentials(
                    AuthErrorDescriptor::new(message).with_status(status),
                ));
            }
            Err(e) => return Err(e),
        };

        let session = StoredSession::from(tokens);
        let identity = session.identity.clone();
        self.remember(session).await?;
        self.emit(AuthEventKind::SignedIn, Some(identity.clone()));
        Ok(identity)
    }

    /// Revoke the session server-side. Local tokens are dropped even when
    /// the server call fails.
    async fn sign_out(&self) -> SessionResult<()> {
        let token = match self.stored_session().await {
            Ok(stored) => stored.map(|s| s.access_token),
            Err(e) => {
                warn!(error = %e, "could not read stored session before sign-out");
                None
            }
        };
        let result = match token {
            Some(token) => match self.endpoint("auth/v1/logout") {
                Ok(url) => match self.authorize(self.http.post(url), Some(&token)).send().await {
                    Ok(resp) => check(resp).await.map(|_| ()),
                    Err(e) => Err(e.into()),
                },
                Err(e) => Err(e),
            },
            None => Ok(()),
        };
        if let Err(e) = &result {
            warn!(error = %e, "server-side sign-out failed");
        }
        self.forget().await?;
        self.emit(AuthEventKind::SignedOut, None);
        result
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }
}
