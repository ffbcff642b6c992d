use std::collections::HashMap;
use std::panic::Location;
use std::sync::{Arc, Mutex as StdMutex};

use crate::client::CommandClient;
use crate::commands::INFO_COMMAND;
use crate::events::ErrorChannel;
use crate::setup::SetupPhase;

/// Message of the error reported for ordinary guarded commands.
pub const BLOCKED_COMMAND_MESSAGE: &str = "mandatory auth before any command";

/// Message of the error reported for the implicit INFO command.
pub const BLOCKED_INFO_MESSAGE: &str =
    "auth must run immediately after the client is created (INFO is sent implicitly on connect)";

/// When the guards come off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GatePolicy {
    /// Remove guards as soon as `auth` is called, before the server answers.
    /// Commands issued in between rely on the client to queue them.
    #[default]
    Optimistic,
    /// Keep guards until the AUTH reply confirms success.
    Confirmed,
}

impl GatePolicy {
    /// String form used in settings and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Optimistic => "optimistic",
            Self::Confirmed => "confirmed",
        }
    }
}

/// Gate construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateOptions {
    /// Guard removal policy.
    pub policy: GatePolicy,
    /// Spawn a zero-delay task that closes the setup phase.
    ///
    /// Only honored on a current-thread tokio runtime. On a multi-thread
    /// runtime the task could run on another worker before the caller's next
    /// statement, so the phase stays open until
    /// [`AuthGate::finish_setup`](crate::AuthGate::finish_setup).
    pub auto_close_setup: bool,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            policy: GatePolicy::Optimistic,
            auto_close_setup: true,
        }
    }
}

/// Authentication progress of a gated client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No `auth` call yet.
    Created,
    /// `auth` called, no successful reply yet.
    Authenticating,
    /// AUTH succeeded. Terminal.
    Authenticated,
}

impl AuthState {
    /// String form used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Authenticating => "authenticating",
            Self::Authenticated => "authenticated",
        }
    }
}

/// Which pre-built error a guard reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardKind {
    /// Ordinary data command.
    Command,
    /// The introspection command clients may send on their own.
    Info,
}

/// Stub standing in for one command until the gate opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandGuard {
    command: &'static str,
    kind: GuardKind,
}

impl CommandGuard {
    pub(super) fn new(command: &'static str) -> Self {
        let kind = if command == INFO_COMMAND {
            GuardKind::Info
        } else {
            GuardKind::Command
        };
        Self { command, kind }
    }

    /// Guarded command name.
    #[must_use]
    pub fn command(&self) -> &'static str {
        self.command
    }

    /// Error kind reported by this guard.
    #[must_use]
    pub fn kind(&self) -> GuardKind {
        self.kind
    }
}

/// Error reported for a command issued before auth.
///
/// Built once per client at construction, so it points at the place the
/// client was created rather than at the failing call.
#[derive(Debug, PartialEq, Eq)]
pub struct BlockedCommandError {
    kind: GuardKind,
    origin: &'static Location<'static>,
}

impl BlockedCommandError {
    pub(super) fn new(kind: GuardKind, origin: &'static Location<'static>) -> Self {
        Self { kind, origin }
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self.kind {
            GuardKind::Command => BLOCKED_COMMAND_MESSAGE,
            GuardKind::Info => BLOCKED_INFO_MESSAGE,
        }
    }

    /// Which guard kind this error belongs to.
    #[must_use]
    pub fn kind(&self) -> GuardKind {
        self.kind
    }

    /// Source location where the client was created.
    #[must_use]
    pub fn origin(&self) -> &'static Location<'static> {
        self.origin
    }
}

impl std::fmt::Display for BlockedCommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for BlockedCommandError {}

/// Command client that refuses data commands until `auth` has been called.
///
/// Every command of the known command table except `auth` is guarded at
/// construction. Calling [`AuthGate::auth`] removes the guards and sends the
/// host-namespaced credential to the real client.
pub struct AuthGate<C: CommandClient> {
    pub(super) client: C,
    pub(super) options: GateOptions,
    pub(super) inner: StdMutex<GateInner>,
    pub(super) setup: SetupPhase,
    pub(super) errors: ErrorChannel,
    pub(super) blocked_command_error: Arc<BlockedCommandError>,
    pub(super) blocked_info_error: Arc<BlockedCommandError>,
}

pub(super) struct GateInner {
    pub(super) state: AuthState,
    pub(super) guards: HashMap<&'static str, CommandGuard>,
}

impl GateInner {
    /// Drop every installed guard, returning how many there were.
    pub(super) fn remove_guards(&mut self) -> usize {
        let removed = self.guards.len();
        self.guards.clear();
        removed
    }
}
