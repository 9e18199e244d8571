//! Navigation guard vocabulary shared by the gate and its hosts.
use serde::{Deserialize, Serialize};

use crate::session::SessionState;

/// What a view needs from the session before it may render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteRequirement {
    #[default]
    Public,
    Authenticated,
    Admin,
}

/// Gate state derived from a session snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateState {
    Loading,
    Unauthenticated,
    Authenticated { is_admin: bool },
}

impl From<&SessionState> for GateState {
    fn from(state: &SessionState) -> Self {
        if state.loading {
            GateState::Loading
        } else if !state.is_signed_in() {
            GateState::Unauthenticated
        } else {
            GateState::Authenticated {
                is_admin: state.is_admin(),
            }
        }
    }
}

/// What the host UI should do for a navigation attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateOutcome {
    /// Session still settling; show a spinner.
    Loading,
    /// Nobody is signed in.
    RedirectToLogin {
        login_path: String,
        return_to: Option<String>,
    },
    /// Signed in, but not privileged for this view.
    AccessDenied,
    Render,
}

impl GateOutcome {
    pub fn is_render(&self) -> bool {
        matches!(self, GateOutcome::Render)
    }
}

impl std::fmt::Display for GateOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateOutcome::Loading => write!(f, "loading"),
            GateOutcome::RedirectToLogin {
                login_path,
                return_to: Some(target),
            } => write!(f, "redirect to {login_path} (return to {target})"),
            GateOutcome::RedirectToLogin { login_path, .. } => write!(f, "redirect to {login_path}"),
            GateOutcome::AccessDenied => write!(f, "access denied"),
            GateOutcome::Render => write!(f, "render"),
        }
    }
}
