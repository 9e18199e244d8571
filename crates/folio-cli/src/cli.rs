use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Parser, Subcommand};
use folio_types::config::{BackendConfig, SessionConfig};
use session_core::config::{
    ANON_KEY_ENV, BACKEND_URL_ENV, TOKEN_FILE_ENV, optional_env, role_timeout_from_secs, session_config_from_env
};

#[derive(Debug, Parser)]
#[command(name = "folio", about = "Sign in to the portfolio admin panel and check what it would show")]
pub struct FolioArgs {
    /// Backend base URL (defaults to FOLIO_BACKEND_URL)
    #[arg(long = "backend-url", value_name = "URL", global = true, help_heading = "Backend")]
    pub backend_url: Option<String>,
    /// Public API key sent with every request (defaults to FOLIO_ANON_KEY)
    #[arg(long = "anon-key", value_name = "KEY", global = true, help_heading = "Backend")]
    pub anon_key: Option<String>,
    /// Where the signed-in session is kept between runs (defaults to FOLIO_TOKEN_FILE)
    #[arg(long = "token-file", value_name = "PATH", global = true, help_heading = "Backend")]
    pub token_file: Option<PathBuf>,
    /// Email treated as admin when the role lookup fails (defaults to FOLIO_OWNER_EMAIL)
    #[arg(long = "owner-email", value_name = "EMAIL", global = true, help_heading = "Session")]
    pub owner_email: Option<String>,
    /// Seconds to wait for the role lookup (defaults to FOLIO_ROLE_TIMEOUT or 3)
    #[arg(long = "role-timeout", value_name = "SECONDS", global = true, help_heading = "Session")]
    pub role_timeout: Option<f64>,

    #[command(subcommand)]
    pub cmd: FolioCommand,
}

#[derive(Debug, Subcommand)]
pub enum FolioCommand {
    /// Show the current session and admin role
    Status,
    /// Sign in with email and password
    Login {
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Read the password from the first line of stdin instead of prompting
        #[arg(long = "password-stdin", action = ArgAction::SetTrue)]
        password_stdin: bool,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Print what the panel would do for a path with the current session
    CheckRoute {
        #[arg(value_name = "PATH")]
        path: String,
        /// Carry the requested path along on login redirects
        #[arg(long = "return-to", action = ArgAction::SetTrue)]
        return_to: bool,
    },
    /// Send a message through the public contact form
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
    },
}

impl FolioArgs {
    /// Flags win over the environment, field by field.
    pub fn backend_config(&self) -> Result<BackendConfig> {
        let url = match &self.backend_url {
            Some(url) => url.clone(),
            None => optional_env(BACKEND_URL_ENV)?.ok_or_else(|| anyhow!("--backend-url or {BACKEND_URL_ENV} must be set"))?,
        };
        url::Url::parse(&url).with_context(|| format!("invalid backend url {url:?}"))?;
        let anon_key = match &self.anon_key {
            Some(key) => key.clone(),
            None => optional_env(ANON_KEY_ENV)?.ok_or_else(|| anyhow!("--anon-key or {ANON_KEY_ENV} must be set"))?,
        };
        let token_file = match &self.token_file {
            Some(path) => Some(path.clone()),
            None => optional_env(TOKEN_FILE_ENV)?.map(PathBuf::from),
        };
        Ok(BackendConfig {
            url,
            anon_key,
            token_file,
        })
    }

    pub fn session_config(&self) -> Result<SessionConfig> {
        let mut config = session_config_from_env()?;
        if let Some(owner) = &self.owner_email {
            config.owner_email = owner.clone();
        }
        if let Some(secs) = self.role_timeout {
            config.role_timeout = role_timeout_from_secs(secs)?;
        }
        if let FolioCommand::CheckRoute { return_to: true, .. } = self.cmd {
            config.preserve_return_to = true;
        }
        Ok(config)
    }
}
