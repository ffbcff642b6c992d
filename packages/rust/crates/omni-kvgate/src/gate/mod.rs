//! Authentication gate around a command client.

mod auth;
mod core;
mod types;

pub use auth::{AuthCallback, namespaced_credential};
pub use types::{
    AuthGate, AuthState, BLOCKED_COMMAND_MESSAGE, BLOCKED_INFO_MESSAGE, BlockedCommandError,
    CommandGuard, GateOptions, GatePolicy, GuardKind,
};
