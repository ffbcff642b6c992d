//! omni-kvgate - Valkey/Redis command client gated on authentication.
//!
//! A freshly created client refuses every data command until `auth` has been
//! called. The refusal is predictable: during the client's setup phase the
//! call fails immediately, later it is reported on the client's error channel.
//!
//! # Architecture
//!
//! ```text
//! create_client(port, host, options)
//!      ↓
//! AuthGate::new  → guard every known command except `auth`
//!      ↓
//! auth(pass)     → remove guards, send AUTH "{host}:{pass}"
//!      ↓
//! config()       → SMEMBERS _config, then GET each member in turn
//!      ↓
//! invoke / get / set / ... → CommandClient::dispatch
//! ```
//!
//! # Examples
//!
//! ```rust
//! use omni_kvgate::{AuthGate, GateError, GateOptions};
//! use omni_kvgate::test_support::MemoryClient;
//!
//! let gate = AuthGate::new(MemoryClient::new("db.internal"), GateOptions::default())?;
//! assert!(!gate.is_open());
//! # Ok::<(), GateError>(())
//! ```

mod client;
mod commands;
mod config_set;
mod error;
mod events;
mod factory;
mod gate;
mod observability;
mod settings;
mod setup;
#[doc(hidden)]
pub mod test_support;

pub use client::{CommandClient, ValkeyClient};
pub use commands::{AUTH_COMMAND, COMMANDS, Command, INFO_COMMAND, Reply, is_known};
pub use config_set::{CONFIG_SET_KEY, ConfigCallback, ConfigMapping};
pub use error::{CommandError, GateError};
pub use events::{DEFAULT_ERROR_CHANNEL_CAPACITY, ErrorChannel, GateErrorEvent};
pub use factory::{ClientOptions, create_client};
pub use gate::{
    AuthCallback, AuthGate, AuthState, BLOCKED_COMMAND_MESSAGE, BLOCKED_INFO_MESSAGE,
    BlockedCommandError, CommandGuard, GateOptions, GatePolicy, GuardKind, namespaced_credential,
};
pub use settings::{
    DEFAULT_HOST, DEFAULT_PORT, GateSectionSettings, GateSettings, ResolvedGateSettings,
    ValkeySettings, load_settings, load_settings_from_paths, settings_paths,
};
