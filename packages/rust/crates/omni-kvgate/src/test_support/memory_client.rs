use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use async_trait::async_trait;

use crate::client::CommandClient;
use crate::commands::{Command, Reply};
use crate::error::CommandError;

/// In-memory command client. Clones share the same state.
#[derive(Debug, Clone)]
pub struct MemoryClient {
    host: String,
    own_commands: Vec<String>,
    state: Arc<StdMutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    strings: HashMap<String, String>,
    sets: HashMap<String, BTreeSet<String>>,
    log: Vec<Command>,
    failures: Vec<(String, Option<String>)>,
    accepted_credential: Option<String>,
}

impl MemoryClient {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            own_commands: Vec::new(),
            state: Arc::new(StdMutex::new(MemoryState::default())),
        }
    }

    /// Pretend the client defines these commands itself.
    #[must_use]
    pub fn with_own_commands(mut self, commands: &[&str]) -> Self {
        self.own_commands = commands.iter().map(|name| (*name).to_string()).collect();
        self
    }

    /// Reject AUTH unless its argument equals `credential`.
    #[must_use]
    pub fn requiring_credential(self, credential: impl Into<String>) -> Self {
        self.lock().accepted_credential = Some(credential.into());
        self
    }

    pub fn seed_string(&self, key: &str, value: &str) {
        self.lock()
            .strings
            .insert(key.to_string(), value.to_string());
    }

    pub fn seed_set(&self, key: &str, members: &[&str]) {
        self.lock()
            .sets
            .entry(key.to_string())
            .or_default()
            .extend(members.iter().map(|member| (*member).to_string()));
    }

    /// Fail `command`, optionally only for `key`.
    pub fn fail_on(&self, command: &str, key: Option<&str>) {
        self.lock()
            .failures
            .push((command.to_ascii_lowercase(), key.map(str::to_string)));
    }

    /// Every command dispatched so far, in order.
    #[must_use]
    pub fn dispatched(&self) -> Vec<Command> {
        self.lock().log.clone()
    }

    /// Rendered `name arg...` lines of the dispatched commands.
    #[must_use]
    pub fn dispatched_lines(&self) -> Vec<String> {
        self.lock()
            .log
            .iter()
            .map(|command| {
                let mut line = command.name().to_string();
                for raw in command.arguments() {
                    line.push(' ');
                    line.push_str(&String::from_utf8_lossy(raw));
                }
                line
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl CommandClient for MemoryClient {
    fn host(&self) -> &str {
        &self.host
    }

    fn own_commands(&self) -> Vec<String> {
        self.own_commands.clone()
    }

    async fn dispatch(&self, command: &Command) -> Result<Reply, CommandError> {
        let mut state = self.lock();
        state.log.push(command.clone());

        let name = command.name();
        let key = command.arg_str(0).unwrap_or_default().to_string();
        let injected = state.failures.iter().any(|(failing, failing_key)| {
            failing == name && failing_key.as_deref().is_none_or(|only| only == key)
        });
        if injected {
            return Err(CommandError::Server(format!(
                "ERR injected failure for {name} {key}"
            )));
        }

        let rest: Vec<String> = command
            .arguments()
            .iter()
            .skip(1)
            .map(|raw| String::from_utf8_lossy(raw).into_owned())
            .collect();

        match name {
            "auth" => {
                let accepted = state
                    .accepted_credential
                    .as_deref()
                    .is_none_or(|expected| expected == key);
                if accepted {
                    Ok(Reply::ok())
                } else {
                    Err(CommandError::Server(
                        "WRONGPASS invalid username-password pair".to_string(),
                    ))
                }
            }
            "get" => Ok(state
                .strings
                .get(&key)
                .map_or(Reply::Nil, |value| Reply::bulk(value.as_str()))),
            "set" => {
                let value = rest.into_iter().next().unwrap_or_default();
                state.strings.insert(key, value);
                Ok(Reply::ok())
            }
            "del" => {
                let mut removed = 0;
                for target in std::iter::once(key).chain(rest) {
                    if state.strings.remove(&target).is_some() | state.sets.remove(&target).is_some()
                    {
                        removed += 1;
                    }
                }
                Ok(Reply::Int(removed))
            }
            "exists" => {
                let found = state.strings.contains_key(&key) || state.sets.contains_key(&key);
                Ok(Reply::Int(i64::from(found)))
            }
            "sadd" => {
                let set = state.sets.entry(key).or_default();
                let added = rest.into_iter().filter(|member| set.insert(member.clone())).count();
                Ok(Reply::Int(i64::try_from(added).unwrap_or(i64::MAX)))
            }
            "srem" => {
                let Some(set) = state.sets.get_mut(&key) else {
                    return Ok(Reply::Int(0));
                };
                let removed = rest.iter().filter(|member| set.remove(*member)).count();
                Ok(Reply::Int(i64::try_from(removed).unwrap_or(i64::MAX)))
            }
            "smembers" => Ok(Reply::Array(
                state
                    .sets
                    .get(&key)
                    .map(|set| set.iter().map(|member| Reply::bulk(member.as_str())).collect())
                    .unwrap_or_default(),
            )),
            "ping" => Ok(Reply::Status("PONG".to_string())),
            "info" => Ok(Reply::bulk("# Server\r\nredis_version:7.2.4\r\n")),
            other => Err(CommandError::Server(format!(
                "ERR unknown command '{other}'"
            ))),
        }
    }
}
