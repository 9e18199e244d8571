//! Shared type definitions for folio.
//!
//! Lightweight types used by the session core, the hosted-backend client and
//! the CLI. Nothing in here performs I/O.

pub mod auth;
pub mod config;
pub mod contact;
pub mod route;
pub mod session;
pub mod validation;

pub use auth::{AuthChange, AuthErrorDescriptor, AuthEventKind, Identity, LoginRequest, RoleRecord};
pub use contact::{ContactMessage, ContactMessageDraft};
pub use route::{GateOutcome, GateState, RouteRequirement};
pub use session::SessionState;
pub use validation::ValidationError;
