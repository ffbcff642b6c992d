//! Error types for the gated client.
//!
//! Follows ODF-REP: Library crates use `thiserror` for explicit error enums.

use std::sync::Arc;

use thiserror::Error;

use crate::gate::BlockedCommandError;

/// Failure reported by the underlying command client.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Error from the `redis` client (connection, protocol or server reply).
    #[error("valkey command failed: {0}")]
    Redis(#[from] redis::RedisError),

    /// Server-side error reply from a non-`redis` client implementation.
    #[error("{0}")]
    Server(String),
}

/// Error types for gate operations.
#[derive(Error, Debug)]
pub enum GateError {
    /// The client defines this command itself, so it cannot be guarded.
    #[error("cannot guard command defined directly on the client: {command}")]
    Conflict {
        /// Conflicting command name.
        command: String,
    },

    /// Guarded command used during the setup phase.
    #[error("{0}")]
    Blocked(Arc<BlockedCommandError>),

    /// Guarded command used after setup; the error went to the error channel.
    #[error("command `{command}` issued before auth; reported on the error channel")]
    Reported {
        /// Blocked command name.
        command: String,
    },

    /// Command name outside the known command table.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// `auth` sent through `invoke` instead of the auth wrapper.
    #[error("auth must go through the gate's auth wrapper")]
    DirectAuth,

    /// Config aggregation requested without a completion callback.
    #[error("config requires a callback: FnOnce(Result<ConfigMapping, GateError>)")]
    MissingCallback,

    /// Reply shape did not match the command's contract.
    #[error("unexpected reply to `{command}`: expected {expected}")]
    UnexpectedReply {
        /// Command whose reply was rejected.
        command: String,
        /// Expected reply shape.
        expected: &'static str,
    },

    /// Failure from the underlying client, passed through unchanged.
    #[error(transparent)]
    Upstream(#[from] CommandError),
}

impl GateError {
    /// The pre-built blocked-command error, when this is a setup-phase block.
    #[must_use]
    pub fn blocked(&self) -> Option<&Arc<BlockedCommandError>> {
        match self {
            Self::Blocked(error) => Some(error),
            _ => None,
        }
    }
}
