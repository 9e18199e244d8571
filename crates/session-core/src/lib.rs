//! Client-side session lifecycle for the folio admin panel.
//!
//! Three pieces cooperate:
//!
//! - [`SessionStore`]: single source of truth for the signed-in identity and
//!   its admin role, fed by bootstrap, provider notifications and explicit
//!   sign-in/sign-out calls.
//! - [`RoleResolver`]: decides the admin role with a timeout-guarded lookup
//!   and an owner-email fallback.
//! - [`RouteGate`]: maps a session snapshot onto loading / redirect /
//!   access-denied / render for guarded views.
//!
//! [`supabase::SupabaseClient`] is the hosted-backend implementation of the
//! provider and lookup traits.

pub mod config;
pub mod error;
pub mod gate;
pub mod provider;
pub mod race;
pub mod role;
pub mod store;
pub mod supabase;
pub mod test_support;

pub use error::{SessionError, SessionResult};
pub use gate::{RouteGate, RouteTable};
pub use provider::{AuthProvider, RoleLookup};
pub use role::RoleResolver;
pub use store::SessionStore;
