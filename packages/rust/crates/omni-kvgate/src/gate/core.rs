use std::collections::HashMap;
use std::future::Future;
use std::panic::Location;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use tokio::sync::broadcast;

use crate::client::CommandClient;
use crate::commands::{self, AUTH_COMMAND, COMMANDS, Command, Reply};
use crate::error::GateError;
use crate::events::{ErrorChannel, GateErrorEvent};
use crate::observability::GateEvent;
use crate::setup::SetupPhase;

use super::types::{
    AuthGate, AuthState, BlockedCommandError, CommandGuard, GateInner, GateOptions, GuardKind,
};

impl<C: CommandClient> AuthGate<C> {
    /// Decorate `client`, guarding every known command except `auth`.
    ///
    /// Fails with [`GateError::Conflict`] when the client defines one of the
    /// known commands itself.
    #[track_caller]
    pub fn new(client: C, options: GateOptions) -> Result<Self, GateError> {
        let origin = Location::caller();
        let own_commands = client.own_commands();
        let mut guards = HashMap::with_capacity(COMMANDS.len());
        for &command in COMMANDS {
            if own_commands
                .iter()
                .any(|name| name.eq_ignore_ascii_case(command))
            {
                return Err(GateError::Conflict {
                    command: command.to_string(),
                });
            }
            if command != AUTH_COMMAND {
                guards.insert(command, CommandGuard::new(command));
            }
        }

        let setup = SetupPhase::new();
        let deferred_close = options.auto_close_setup && setup.schedule_close();
        tracing::debug!(
            event = GateEvent::GuardsInstalled.as_str(),
            host = %client.host(),
            guards = guards.len(),
            policy = options.policy.as_str(),
            deferred_close,
            "command guards installed"
        );

        Ok(Self {
            client,
            options,
            inner: StdMutex::new(GateInner {
                state: AuthState::Created,
                guards,
            }),
            setup,
            errors: ErrorChannel::default(),
            blocked_command_error: Arc::new(BlockedCommandError::new(GuardKind::Command, origin)),
            blocked_info_error: Arc::new(BlockedCommandError::new(GuardKind::Info, origin)),
        })
    }

    /// Close the setup phase. Later guarded calls are reported on the error
    /// channel instead of failing in the caller's stack.
    pub fn finish_setup(&self) {
        if self.setup.close() {
            tracing::debug!(
                event = GateEvent::SetupClosed.as_str(),
                trigger = "explicit",
                "client setup phase closed"
            );
        }
    }

    /// Whether the client is still in its setup phase.
    #[must_use]
    pub fn in_setup(&self) -> bool {
        self.setup.is_open()
    }

    /// Current authentication state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.lock().state
    }

    /// Whether every guard has been removed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.lock().guards.is_empty()
    }

    /// Names of the commands still guarded, sorted.
    #[must_use]
    pub fn guarded_commands(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.lock().guards.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Options the gate was built with.
    #[must_use]
    pub fn options(&self) -> GateOptions {
        self.options
    }

    /// Subscribe to blocked-command reports.
    #[must_use]
    pub fn subscribe_errors(&self) -> broadcast::Receiver<GateErrorEvent> {
        self.errors.subscribe()
    }

    /// Channel that receives blocked commands issued after setup.
    #[must_use]
    pub fn error_channel(&self) -> &ErrorChannel {
        &self.errors
    }

    /// Pre-built error for ordinary guarded commands.
    #[must_use]
    pub fn blocked_command_error(&self) -> &Arc<BlockedCommandError> {
        &self.blocked_command_error
    }

    /// Pre-built error for the INFO command.
    #[must_use]
    pub fn blocked_info_error(&self) -> &Arc<BlockedCommandError> {
        &self.blocked_info_error
    }

    /// The underlying client, once the gate is open.
    #[must_use]
    pub fn client(&self) -> Option<&C> {
        self.is_open().then_some(&self.client)
    }

    /// Host identifier of the underlying client.
    #[must_use]
    pub fn host(&self) -> &str {
        self.client.host()
    }

    /// Dispatch `command` to the real client if its guard is gone.
    ///
    /// The guard check happens when this is called, not when the returned
    /// future is first polled.
    pub fn invoke(
        &self,
        command: Command,
    ) -> impl Future<Output = Result<Reply, GateError>> + Send + '_ {
        let admission = self.admit(&command);
        async move {
            admission?;
            Ok(self.client.dispatch(&command).await?)
        }
    }

    /// `GET key`.
    pub fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, GateError>> + Send + '_ {
        let pending = self.invoke(Command::new("get").arg(key));
        async move {
            pending
                .await?
                .into_optional_string()
                .map_err(|_| unexpected("get", "bulk string or nil"))
        }
    }

    /// `SET key value`.
    pub fn set(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), GateError>> + Send + '_ {
        let pending = self.invoke(Command::new("set").arg(key).arg(value));
        async move {
            pending
                .await?
                .into_string()
                .map(|_| ())
                .map_err(|_| unexpected("set", "status"))
        }
    }

    /// `DEL key [key ...]`, returning the number of removed keys.
    pub fn del(&self, keys: &[&str]) -> impl Future<Output = Result<i64, GateError>> + Send + '_ {
        let pending = self.invoke(Command::new("del").args(keys));
        async move {
            pending
                .await?
                .into_integer()
                .map_err(|_| unexpected("del", "integer"))
        }
    }

    /// `EXISTS key`.
    pub fn exists(&self, key: &str) -> impl Future<Output = Result<bool, GateError>> + Send + '_ {
        let pending = self.invoke(Command::new("exists").arg(key));
        async move {
            pending
                .await?
                .into_integer()
                .map(|count| count > 0)
                .map_err(|_| unexpected("exists", "integer"))
        }
    }

    /// `SMEMBERS key`.
    pub fn smembers(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Vec<String>, GateError>> + Send + '_ {
        let pending = self.invoke(Command::new("smembers").arg(key));
        async move {
            pending
                .await?
                .into_string_list()
                .map_err(|_| unexpected("smembers", "array of strings"))
        }
    }

    /// `SADD key member [member ...]`, returning the number of new members.
    pub fn sadd(
        &self,
        key: &str,
        members: &[&str],
    ) -> impl Future<Output = Result<i64, GateError>> + Send + '_ {
        let pending = self.invoke(Command::new("sadd").arg(key).args(members));
        async move {
            pending
                .await?
                .into_integer()
                .map_err(|_| unexpected("sadd", "integer"))
        }
    }

    /// `SREM key member [member ...]`, returning the number of removed members.
    pub fn srem(
        &self,
        key: &str,
        members: &[&str],
    ) -> impl Future<Output = Result<i64, GateError>> + Send + '_ {
        let pending = self.invoke(Command::new("srem").arg(key).args(members));
        async move {
            pending
                .await?
                .into_integer()
                .map_err(|_| unexpected("srem", "integer"))
        }
    }

    /// `PING`.
    pub fn ping(&self) -> impl Future<Output = Result<String, GateError>> + Send + '_ {
        let pending = self.invoke(Command::new("ping"));
        async move {
            pending
                .await?
                .into_string()
                .map_err(|_| unexpected("ping", "status"))
        }
    }

    /// `INFO`.
    pub fn info(&self) -> impl Future<Output = Result<String, GateError>> + Send + '_ {
        let pending = self.invoke(Command::new(commands::INFO_COMMAND));
        async move {
            pending
                .await?
                .into_string()
                .map_err(|_| unexpected("info", "bulk string"))
        }
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, GateInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn admit(&self, command: &Command) -> Result<(), GateError> {
        let name = command.name();
        if name == AUTH_COMMAND {
            return Err(GateError::DirectAuth);
        }
        if !commands::is_known(name) {
            return Err(GateError::UnknownCommand(name.to_string()));
        }
        let guard = self.lock().guards.get(name).copied();
        let Some(guard) = guard else {
            return Ok(());
        };

        let error = match guard.kind() {
            GuardKind::Command => Arc::clone(&self.blocked_command_error),
            GuardKind::Info => Arc::clone(&self.blocked_info_error),
        };
        if self.setup.is_open() {
            tracing::debug!(
                event = GateEvent::CommandBlocked.as_str(),
                command = name,
                report = "caller",
                "guarded command issued before auth"
            );
            return Err(GateError::Blocked(error));
        }

        let reached = self.errors.emit(GateErrorEvent {
            command: name.to_string(),
            error,
        });
        tracing::debug!(
            event = GateEvent::CommandBlocked.as_str(),
            command = name,
            report = "error_channel",
            subscribers = reached,
            "guarded command issued before auth"
        );
        Err(GateError::Reported {
            command: name.to_string(),
        })
    }
}

fn unexpected(command: &str, expected: &'static str) -> GateError {
    GateError::UnexpectedReply {
        command: command.to_string(),
        expected,
    }
}
