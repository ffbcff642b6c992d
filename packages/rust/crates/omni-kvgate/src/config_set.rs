//! Configuration stored as a key-name set.
//!
//! The `_config` set lists key names; their values together form the
//! configuration mapping.

use std::collections::HashMap;
use std::future::Future;

use crate::client::CommandClient;
use crate::error::GateError;
use crate::gate::AuthGate;
use crate::observability::GateEvent;

/// Set holding the configuration key names.
pub const CONFIG_SET_KEY: &str = "_config";

/// Key name to value; `None` when the key has no value.
pub type ConfigMapping = HashMap<String, Option<String>>;

/// Completion callback for [`AuthGate::config_with`].
pub type ConfigCallback = Box<dyn FnOnce(Result<ConfigMapping, GateError>) + Send>;

impl<C: CommandClient> AuthGate<C> {
    /// Fetch the `_config` members, then each member's value, one at a time.
    ///
    /// The first failure is returned and nothing further is fetched.
    pub fn config(&self) -> impl Future<Output = Result<ConfigMapping, GateError>> + Send + '_ {
        let members = self.smembers(CONFIG_SET_KEY);
        async move {
            let mut members = match members.await {
                Ok(members) => members,
                Err(error) => {
                    tracing::warn!(
                        event = GateEvent::ConfigFailed.as_str(),
                        stage = "members",
                        error = %error,
                        "config key set could not be read"
                    );
                    return Err(error);
                }
            };

            let mut config = ConfigMapping::with_capacity(members.len());
            while let Some(key) = members.pop() {
                let fetched = self.get(&key).await;
                match fetched {
                    Ok(value) => {
                        config.insert(key, value);
                    }
                    Err(error) => {
                        tracing::warn!(
                            event = GateEvent::ConfigFailed.as_str(),
                            stage = "value",
                            key = %key,
                            error = %error,
                            "config value could not be read"
                        );
                        return Err(error);
                    }
                }
            }

            tracing::debug!(
                event = GateEvent::ConfigLoaded.as_str(),
                keys = config.len(),
                "config loaded"
            );
            Ok(config)
        }
    }

    /// Callback form of [`AuthGate::config`].
    ///
    /// Without a callback this fails immediately, before any store command.
    pub fn config_with(
        &self,
        callback: Option<ConfigCallback>,
    ) -> Result<impl Future<Output = ()> + Send + '_, GateError> {
        let Some(callback) = callback else {
            return Err(GateError::MissingCallback);
        };
        let pending = self.config();
        Ok(async move { callback(pending.await) })
    }
}
