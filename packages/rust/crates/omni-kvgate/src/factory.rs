//! Client construction: decorate, then optionally authenticate.

use std::future::Future;

use crate::client::{CommandClient, ValkeyClient};
use crate::error::GateError;
use crate::gate::{AuthGate, GateOptions};

/// Options accepted by [`create_client`] and [`AuthGate::connect`].
#[derive(Clone, Default)]
pub struct ClientOptions {
    /// Credential to authenticate with right after construction. Empty
    /// strings are ignored.
    pub auth: Option<String>,
    /// Gate behavior.
    pub gate: GateOptions,
}

impl std::fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientOptions")
            .field("auth", &self.auth.as_ref().map(|_| "<redacted>"))
            .field("gate", &self.gate)
            .finish()
    }
}

impl ClientOptions {
    /// Options that authenticate with `pass` on construction.
    pub fn with_auth(pass: impl Into<String>) -> Self {
        Self {
            auth: Some(pass.into()),
            ..Self::default()
        }
    }
}

impl<C: CommandClient> AuthGate<C> {
    /// Decorate `client` and, when `options.auth` is set, authenticate before
    /// handing the client back. An auth failure is returned as the error.
    #[track_caller]
    pub fn connect(
        client: C,
        options: ClientOptions,
    ) -> impl Future<Output = Result<Self, GateError>> + Send {
        let gate = Self::new(client, options.gate);
        authenticate_on_connect(gate, options.auth)
    }
}

/// Create a gated Valkey client for `host:port`.
///
/// No connection is made unless `options.auth` is set.
#[track_caller]
pub fn create_client(
    port: u16,
    host: &str,
    options: ClientOptions,
) -> impl Future<Output = Result<AuthGate<ValkeyClient>, GateError>> + Send {
    let gate = match ValkeyClient::open(host, port) {
        Ok(client) => AuthGate::new(client, options.gate),
        Err(err) => Err(err.into()),
    };
    authenticate_on_connect(gate, options.auth)
}

async fn authenticate_on_connect<C: CommandClient>(
    gate: Result<AuthGate<C>, GateError>,
    auth: Option<String>,
) -> Result<AuthGate<C>, GateError> {
    let gate = gate?;
    if let Some(pass) = auth.filter(|pass| !pass.is_empty()) {
        gate.auth(&pass).await?;
    }
    Ok(gate)
}
