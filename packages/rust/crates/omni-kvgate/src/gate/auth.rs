use std::future::Future;

use crate::client::CommandClient;
use crate::commands::{AUTH_COMMAND, Command, Reply};
use crate::error::GateError;
use crate::observability::GateEvent;

use super::types::{AuthGate, AuthState, GatePolicy};

/// Completion callback for [`AuthGate::auth_with`].
pub type AuthCallback = Box<dyn FnOnce(Result<Reply, GateError>) + Send>;

/// Credential actually sent with AUTH: `{host}:{pass}`.
///
/// Neither part is escaped, so a colon inside `host` or `pass` makes the
/// composite ambiguous.
#[must_use]
pub fn namespaced_credential(host: &str, pass: &str) -> String {
    format!("{host}:{pass}")
}

impl<C: CommandClient> AuthGate<C> {
    /// Authenticate with `pass`, namespaced by the client's host.
    ///
    /// With [`GatePolicy::Optimistic`] the guards are removed right here,
    /// before the AUTH request is sent. The AUTH result is returned as is.
    pub fn auth(&self, pass: &str) -> impl Future<Output = Result<Reply, GateError>> + Send + '_ {
        let command = self.begin_auth(pass);
        async move {
            let result = self.client.dispatch(&command).await;
            self.finish_auth(result.is_ok());
            Ok(result?)
        }
    }

    /// Callback form of [`AuthGate::auth`]. A missing callback is a no-op.
    pub fn auth_with(
        &self,
        pass: &str,
        callback: Option<AuthCallback>,
    ) -> impl Future<Output = ()> + Send + '_ {
        let callback: AuthCallback = match callback {
            Some(callback) => callback,
            None => Box::new(|_: Result<Reply, GateError>| {}),
        };
        let pending = self.auth(pass);
        async move { callback(pending.await) }
    }

    fn begin_auth(&self, pass: &str) -> Command {
        let mut inner = self.lock();
        if inner.state == AuthState::Created {
            inner.state = AuthState::Authenticating;
        }
        let removed = match self.options.policy {
            GatePolicy::Optimistic => inner.remove_guards(),
            GatePolicy::Confirmed => 0,
        };
        let state = inner.state;
        drop(inner);

        if removed > 0 {
            tracing::debug!(
                event = GateEvent::GuardsRemoved.as_str(),
                removed,
                policy = self.options.policy.as_str(),
                "command guards removed"
            );
        }
        tracing::debug!(
            event = GateEvent::AuthStarted.as_str(),
            host = %self.client.host(),
            state = state.as_str(),
            "sending namespaced auth"
        );
        Command::new(AUTH_COMMAND).arg(namespaced_credential(self.client.host(), pass))
    }

    fn finish_auth(&self, succeeded: bool) {
        let mut inner = self.lock();
        if succeeded {
            inner.state = AuthState::Authenticated;
            let removed = inner.remove_guards();
            drop(inner);
            if removed > 0 {
                tracing::debug!(
                    event = GateEvent::GuardsRemoved.as_str(),
                    removed,
                    policy = self.options.policy.as_str(),
                    "command guards removed"
                );
            }
            tracing::info!(
                event = GateEvent::AuthSucceeded.as_str(),
                host = %self.client.host(),
                "client authenticated"
            );
            return;
        }

        if self.options.policy == GatePolicy::Confirmed && inner.state == AuthState::Authenticating
        {
            inner.state = AuthState::Created;
        }
        let state = inner.state;
        drop(inner);
        tracing::warn!(
            event = GateEvent::AuthFailed.as_str(),
            host = %self.client.host(),
            state = state.as_str(),
            guarded = !self.is_open(),
            "auth rejected"
        );
    }
}
