//! Command client seam and the Valkey-backed implementation.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::commands::{AUTH_COMMAND, Command, Reply};
use crate::error::CommandError;
use crate::observability::GateEvent;

/// Client the gate decorates.
///
/// Connection handling, serialization and pipelining belong to the
/// implementation; the gate only decides whether a command may be dispatched.
#[async_trait]
pub trait CommandClient: Send + Sync {
    /// Host identifier the client was configured with.
    fn host(&self) -> &str;

    /// Command names the client defines itself and that must not be shadowed.
    fn own_commands(&self) -> Vec<String> {
        Vec::new()
    }

    /// Send one command and wait for its reply.
    async fn dispatch(&self, command: &Command) -> Result<Reply, CommandError>;
}

/// Valkey/Redis client on a lazily opened multiplexed connection.
///
/// The credential of the last successful AUTH is replayed on every new
/// connection, so a reconnect keeps the session authenticated.
pub struct ValkeyClient {
    client: redis::Client,
    host: String,
    session: Mutex<Session>,
}

#[derive(Default)]
struct Session {
    connection: Option<redis::aio::MultiplexedConnection>,
    credential: Option<String>,
}

impl std::fmt::Debug for ValkeyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValkeyClient")
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

impl ValkeyClient {
    /// Client for `redis://{host}:{port}/`. No connection is opened yet.
    pub fn open(host: &str, port: u16) -> Result<Self, CommandError> {
        Self::open_url(format!("redis://{host}:{port}/"), host)
    }

    /// Client for an explicit connection URL; `host` is the identifier used
    /// to namespace the auth credential.
    pub fn open_url(url: impl AsRef<str>, host: impl Into<String>) -> Result<Self, CommandError> {
        let client = redis::Client::open(url.as_ref())?;
        Ok(Self {
            client,
            host: host.into(),
            session: Mutex::new(Session::default()),
        })
    }

    async fn ensure_connection(&self, session: &mut Session) -> Result<(), CommandError> {
        if session.connection.is_some() {
            return Ok(());
        }
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        if let Some(credential) = session.credential.as_deref() {
            let _: redis::Value = redis::cmd(AUTH_COMMAND)
                .arg(credential)
                .query_async(&mut conn)
                .await?;
            tracing::debug!(
                event = GateEvent::ValkeyReauthenticated.as_str(),
                host = %self.host,
                "auth replayed on new valkey connection"
            );
        }
        session.connection = Some(conn);
        tracing::debug!(
            event = GateEvent::ValkeyConnected.as_str(),
            host = %self.host,
            "valkey command client connected"
        );
        Ok(())
    }
}

/// Whether `err` leaves the connection unusable.
fn is_connection_failure(err: &redis::RedisError) -> bool {
    err.is_io_error() || err.is_connection_dropped() || err.is_unrecoverable_error()
}

#[async_trait]
impl CommandClient for ValkeyClient {
    fn host(&self) -> &str {
        &self.host
    }

    async fn dispatch(&self, command: &Command) -> Result<Reply, CommandError> {
        let mut session = self.session.lock().await;
        self.ensure_connection(&mut session).await?;
        let Some(conn) = session.connection.as_mut() else {
            return Err(CommandError::Server(
                "valkey connection unavailable".to_string(),
            ));
        };
        let cmd = command.to_redis_cmd();
        let result: redis::RedisResult<redis::Value> = cmd.query_async(conn).await;
        match result {
            Ok(value) => {
                if command.name() == AUTH_COMMAND {
                    session.credential = command.arg_str(0).map(str::to_string);
                }
                Ok(Reply::from(value))
            }
            Err(err) => {
                let reconnect = is_connection_failure(&err);
                tracing::warn!(
                    event = GateEvent::ValkeyCommandFailed.as_str(),
                    command = command.name(),
                    error = %err,
                    reconnect,
                    "valkey command failed"
                );
                if reconnect {
                    session.connection = None;
                }
                Err(err.into())
            }
        }
    }
}

impl From<redis::Value> for Reply {
    fn from(value: redis::Value) -> Self {
        match value {
            redis::Value::Nil => Self::Nil,
            redis::Value::Int(n) => Self::Int(n),
            redis::Value::BulkString(raw) => Self::Bytes(raw),
            redis::Value::SimpleString(text) => Self::Status(text),
            redis::Value::Okay => Self::ok(),
            redis::Value::Array(items) | redis::Value::Set(items) => {
                Self::Array(items.into_iter().map(Self::from).collect())
            }
            redis::Value::Boolean(flag) => Self::Int(i64::from(flag)),
            redis::Value::Double(number) => Self::Status(number.to_string()),
            other => Self::Status(format!("{other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_does_not_connect() {
        let client = ValkeyClient::open("127.0.0.1", 6390);
        assert!(client.is_ok_and(|client| client.host() == "127.0.0.1"));
    }

    #[test]
    fn open_url_rejects_malformed_url() {
        assert!(ValkeyClient::open_url("not a url", "h").is_err());
    }

    #[test]
    fn io_failures_force_a_reconnect() {
        let err = redis::RedisError::from(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
        assert!(is_connection_failure(&err));
    }

    #[test]
    fn redis_values_map_to_replies() {
        let value = redis::Value::Array(vec![
            redis::Value::BulkString(b"a".to_vec()),
            redis::Value::Nil,
            redis::Value::Okay,
        ]);
        assert_eq!(
            Reply::from(value),
            Reply::Array(vec![Reply::bulk("a"), Reply::Nil, Reply::ok()])
        );
    }
}
