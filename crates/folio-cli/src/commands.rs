use std::{io::BufRead, sync::Arc};

use anyhow::{Context, Result, anyhow, bail};
use folio_types::{ContactMessageDraft, LoginRequest, SessionState};
use session_core::{RoleResolver, RouteGate, RouteTable, SessionStore, supabase::SupabaseClient};
use tracing::debug;

use crate::cli::{FolioArgs, FolioCommand};

pub async fn run(args: FolioArgs) -> Result<()> {
    let backend = args.backend_config()?;
    let session = args.session_config()?;
    let client = Arc::new(SupabaseClient::new(&backend)?);
    debug!(backend = %client.base_url(), "using backend");

    match args.cmd {
        FolioCommand::Contact { name, email, message } => {
            let draft = ContactMessageDraft::new(name, email, message);
            let stored = client.submit_contact_message(&draft).await?;
            println!("Message sent ({})", stored.id);
            Ok(())
        }
        cmd => {
            let store = SessionStore::new(client.clone(), RoleResolver::from_config(client.clone(), &session));
            store.bootstrap().await;
            let result = run_session_command(&store, cmd, RouteGate::from_config(&session, RouteTable::portfolio())).await;
            store.dispose();
            result
        }
    }
}

async fn run_session_command(store: &Arc<SessionStore>, cmd: FolioCommand, gate: RouteGate) -> Result<()> {
    match cmd {
        FolioCommand::Status => {
            print_state(&store.wait_settled().await);
        }
        FolioCommand::Login { email, password_stdin } => {
            let password = if password_stdin {
                read_password_line(std::io::stdin().lock())?
            } else {
                rpassword::prompt_password(format!("Password for {email}: ")).context("reading password")?
            };
            store
                .sign_in_with(LoginRequest::new(email, password))
                .await
                .map_err(|e| anyhow!("sign-in failed: {e}"))?;
            print_state(&store.wait_settled().await);
        }
        FolioCommand::Logout => {
            store.sign_out().await;
            println!("Signed out");
        }
        FolioCommand::CheckRoute { path, .. } => {
            let state = store.wait_settled().await;
            println!("{}", gate.decide(&path, &state));
        }
        FolioCommand::Contact { .. } => bail!("contact does not use a session"),
    }
    Ok(())
}

/// First line of `reader` without its line ending.
pub fn read_password_line(mut reader: impl BufRead) -> Result<String> {
    let mut line = String::new();
    reader.read_line(&mut line).context("reading password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        bail!("no password on stdin");
    }
    Ok(password.to_string())
}

fn print_state(state: &SessionState) {
    match &state.identity {
        None => println!("Not signed in"),
        Some(identity) => {
            println!("Signed in as {identity}");
            println!("Admin: {}", if state.is_admin() { "yes" } else { "no" });
        }
    }
}
