//! Configuration structs for the session core and backend client.
use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

/// Address of the single account allowed through the role-lookup fallback.
///
/// This is a single-tenant trust shortcut: when the role lookup fails or
/// times out, only this exact (case-sensitive) address is treated as admin.
pub const DEFAULT_OWNER_EMAIL: &str = "owner@example.com";

/// How long the role lookup may take before the fallback decides.
pub const DEFAULT_ROLE_TIMEOUT: Duration = Duration::from_millis(3000);

/// Where unauthenticated visitors of guarded views are sent.
pub const DEFAULT_LOGIN_PATH: &str = "/admin/login";

/// Connection details for the hosted backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Public (anon) API key sent with every request.
    pub anon_key: String,
    /// File used to persist the signed-in session between runs.
    pub token_file: Option<PathBuf>,
}

/// Behaviour knobs for the session store, role resolver and route gate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub owner_email: String,
    pub role_timeout: Duration,
    pub login_path: String,
    /// Carry the attempted path on login redirects.
    pub preserve_return_to: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            owner_email: DEFAULT_OWNER_EMAIL.to_string(),
            role_timeout: DEFAULT_ROLE_TIMEOUT,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            preserve_return_to: false,
        }
    }
}
