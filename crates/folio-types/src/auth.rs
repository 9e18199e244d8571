use secrecy::SecretBox;
use serde::{Deserialize, Serialize};

/// Password material submitted at sign-in. Redacted in `Debug` output.
pub type Password = SecretBox<String>;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Authenticated principal as reported by the auth provider.
pub struct Identity {
    /// Stable provider-assigned identifier.
    pub id: String,
    /// Email address; also the trust anchor for the owner fallback.
    pub email: String,
    /// Optional display name from the provider's user metadata.
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "{} <{}>", name, self.email),
            None => write!(f, "{}", self.email),
        }
    }
}

/// Credentials submitted to the password sign-in flow.
#[derive(Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: Password,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretBox::new(Box::new(password.into())),
        }
    }
}

/// Kinds of out-of-band notifications pushed by the auth provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEventKind {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

impl std::fmt::Display for AuthEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuthEventKind::InitialSession => "INITIAL_SESSION",
            AuthEventKind::SignedIn => "SIGNED_IN",
            AuthEventKind::SignedOut => "SIGNED_OUT",
            AuthEventKind::TokenRefreshed => "TOKEN_REFRESHED",
            AuthEventKind::UserUpdated => "USER_UPDATED",
            AuthEventKind::PasswordRecovery => "PASSWORD_RECOVERY",
        };
        f.write_str(s)
    }
}

/// One push notification from the provider's auth-state channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthChange {
    pub kind: AuthEventKind,
    pub identity: Option<Identity>,
}

impl AuthChange {
    pub fn new(kind: AuthEventKind, identity: Option<Identity>) -> Self {
        Self { kind, identity }
    }
}

/// User-visible description of a failed sign-in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthErrorDescriptor {
    /// Human-readable message suitable for a toast or form error.
    pub message: String,
    /// HTTP status reported by the provider, when there was one.
    pub status: Option<u16>,
}

impl AuthErrorDescriptor {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl std::fmt::Display for AuthErrorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AuthErrorDescriptor {}

/// Row returned by the role/profile lookup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub is_admin: bool,
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn login_request_redacts_password() {
        let req = LoginRequest::new("owner@example.com", "hunter2");
        let rendered = format!("{req:?}");
        assert!(!rendered.contains("hunter2"));
        assert_eq!(req.password.expose_secret(), "hunter2");
    }

    #[test]
    fn event_kind_uses_provider_spelling() {
        let json = serde_json::to_string(&AuthEventKind::TokenRefreshed).unwrap();
        assert_eq!(json, "\"TOKEN_REFRESHED\"");
        assert_eq!(AuthEventKind::SignedOut.to_string(), "SIGNED_OUT");
    }

    #[test]
    fn identity_display_prefers_name() {
        let plain = Identity::new("u1", "a@example.com");
        assert_eq!(plain.to_string(), "a@example.com");
        let named = plain.with_display_name("Ada");
        assert_eq!(named.to_string(), "Ada <a@example.com>");
    }
}
