//! Route gate for guarded views.
//!
//! Pure mapping from a [`SessionState`] snapshot and a [`RouteRequirement`]
//! to a [`GateOutcome`]. The gate performs no I/O and cannot fail; anything
//! that goes wrong upstream has already been absorbed by the session store.
//!
//! Access denied means signed in without the admin role; a login redirect
//! means not signed in at all.

use folio_types::{
    GateOutcome, GateState, RouteRequirement, SessionState, config::{DEFAULT_LOGIN_PATH, SessionConfig}
};

/// Path patterns and the requirement each one carries.
///
/// Patterns are exact paths, or a prefix ending in `/*` that matches the
/// prefix itself and everything below it. Matching ignores case and repeated
/// slashes. The longest matching pattern wins; unmatched paths are public.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<(String, RouteRequirement)>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes of the portfolio site: public sections and login, admin panel
    /// behind the admin role.
    pub fn portfolio() -> Self {
        Self::new()
            .route("/", RouteRequirement::Public)
            .route(DEFAULT_LOGIN_PATH, RouteRequirement::Public)
            .route("/admin/*", RouteRequirement::Admin)
    }

    pub fn route(mut self, pattern: impl Into<String>, requirement: RouteRequirement) -> Self {
        self.routes.push((pattern.into(), requirement));
        self
    }

    pub fn requirement_for(&self, path: &str) -> RouteRequirement {
        let path = normalize(path);
        self.routes
            .iter()
            .filter_map(|(pattern, req)| specificity(pattern, &path).map(|score| (score, *req)))
            .max_by_key(|(score, _)| *score)
            .map(|(_, req)| req)
            .unwrap_or_default()
    }
}

/// Strip query/fragment, collapse repeated slashes, drop trailing slashes and
/// lowercase; `""` becomes `/`.
fn normalize(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let mut out = String::with_capacity(end + 1);
    for segment in path[..end].split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        out.push_str(&segment.to_lowercase());
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Match score for `pattern` against a normalized path; exact matches beat
/// prefix matches of the same length.
fn specificity(pattern: &str, path: &str) -> Option<usize> {
    match pattern.strip_suffix("/*") {
        Some(prefix) => {
            let prefix = normalize(prefix);
            let below = prefix == "/"
                || path == prefix
                || path.strip_prefix(prefix.as_str()).is_some_and(|rest| rest.starts_with('/'));
            below.then_some(prefix.len() * 2)
        }
        None => {
            let pattern = normalize(pattern);
            (pattern == path).then_some(pattern.len() * 2 + 1)
        }
    }
}

/// Decides whether a navigation target may render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteGate {
    login_path: String,
    preserve_return_to: bool,
    routes: RouteTable,
}

impl Default for RouteGate {
    fn default() -> Self {
        Self {
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            preserve_return_to: false,
            routes: RouteTable::portfolio(),
        }
    }
}

impl RouteGate {
    pub fn new(routes: RouteTable) -> Self {
        Self {
            routes,
            ..Self::default()
        }
    }

    pub fn from_config(config: &SessionConfig, routes: RouteTable) -> Self {
        Self {
            login_path: config.login_path.clone(),
            preserve_return_to: config.preserve_return_to,
            routes,
        }
    }

    pub fn preserve_return_to(mut self, on: bool) -> Self {
        self.preserve_return_to = on;
        self
    }

    /// Outcome for a view with a known requirement.
    pub fn evaluate(&self, state: &SessionState, requirement: RouteRequirement) -> GateOutcome {
        self.outcome(state, requirement, None)
    }

    /// Outcome for navigating to `path`, using the route table.
    pub fn decide(&self, path: &str, state: &SessionState) -> GateOutcome {
        let requirement = self.routes.requirement_for(path);
        self.outcome(state, requirement, Some(path))
    }

    fn outcome(&self, state: &SessionState, requirement: RouteRequirement, target: Option<&str>) -> GateOutcome {
        if requirement == RouteRequirement::Public {
            return GateOutcome::Render;
        }
        match GateState::from(state) {
            GateState::Loading => GateOutcome::Loading,
            GateState::Unauthenticated => GateOutcome::RedirectToLogin {
                login_path: self.login_path.clone(),
                return_to: target.filter(|_| self.preserve_return_to).map(str::to_owned),
            },
            GateState::Authenticated { is_admin: false } if requirement == RouteRequirement::Admin => {
                GateOutcome::AccessDenied
            }
            GateState::Authenticated { .. } => GateOutcome::Render,
        }
    }
}
