//! Command surface of the underlying Valkey client.
//!
//! `COMMANDS` is the fixed table of command names the gate knows about. Every
//! entry except `auth` gets a guard when a client is decorated.

/// Name of the authentication command.
pub const AUTH_COMMAND: &str = "auth";

/// Introspection command some clients issue on their own right after connect.
pub const INFO_COMMAND: &str = "info";

/// Known command names, lowercase and sorted for binary search.
pub const COMMANDS: &[&str] = &[
    "append",
    "auth",
    "bgrewriteaof",
    "bgsave",
    "bitcount",
    "bitop",
    "bitpos",
    "blpop",
    "brpop",
    "brpoplpush",
    "client",
    "config",
    "dbsize",
    "debug",
    "decr",
    "decrby",
    "del",
    "discard",
    "dump",
    "echo",
    "eval",
    "evalsha",
    "exec",
    "exists",
    "expire",
    "expireat",
    "flushall",
    "flushdb",
    "get",
    "getbit",
    "getdel",
    "getex",
    "getrange",
    "getset",
    "hdel",
    "hexists",
    "hget",
    "hgetall",
    "hincrby",
    "hincrbyfloat",
    "hkeys",
    "hlen",
    "hmget",
    "hmset",
    "hscan",
    "hset",
    "hsetnx",
    "hstrlen",
    "hvals",
    "incr",
    "incrby",
    "incrbyfloat",
    "info",
    "keys",
    "lastsave",
    "lindex",
    "linsert",
    "llen",
    "lmove",
    "lpop",
    "lpos",
    "lpush",
    "lpushx",
    "lrange",
    "lrem",
    "lset",
    "ltrim",
    "mget",
    "monitor",
    "move",
    "mset",
    "msetnx",
    "multi",
    "object",
    "persist",
    "pexpire",
    "pexpireat",
    "pfadd",
    "pfcount",
    "pfmerge",
    "ping",
    "psetex",
    "psubscribe",
    "pttl",
    "publish",
    "punsubscribe",
    "quit",
    "randomkey",
    "rename",
    "renamenx",
    "restore",
    "rpop",
    "rpoplpush",
    "rpush",
    "rpushx",
    "sadd",
    "save",
    "scan",
    "scard",
    "script",
    "sdiff",
    "sdiffstore",
    "select",
    "set",
    "setbit",
    "setex",
    "setnx",
    "setrange",
    "shutdown",
    "sinter",
    "sinterstore",
    "sismember",
    "slaveof",
    "slowlog",
    "smembers",
    "smismember",
    "smove",
    "sort",
    "spop",
    "srandmember",
    "srem",
    "sscan",
    "strlen",
    "subscribe",
    "substr",
    "sunion",
    "sunionstore",
    "sync",
    "time",
    "touch",
    "ttl",
    "type",
    "unlink",
    "unsubscribe",
    "unwatch",
    "wait",
    "watch",
    "xadd",
    "xlen",
    "xrange",
    "xread",
    "zadd",
    "zcard",
    "zcount",
    "zincrby",
    "zinterstore",
    "zlexcount",
    "zrange",
    "zrangebylex",
    "zrangebyscore",
    "zrank",
    "zrem",
    "zremrangebyrank",
    "zremrangebyscore",
    "zrevrange",
    "zrevrangebyscore",
    "zrevrank",
    "zscan",
    "zscore",
    "zunionstore",
];

/// Whether `name` (lowercase) is part of the known command table.
#[must_use]
pub fn is_known(name: &str) -> bool {
    COMMANDS.binary_search(&name).is_ok()
}

/// A single store command: lowercase name plus binary-safe arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    args: Vec<Vec<u8>>,
}

impl Command {
    /// Start a command; the name is normalized to lowercase.
    pub fn new(name: impl Into<String>) -> Self {
        let mut name = name.into();
        name.make_ascii_lowercase();
        Self {
            name,
            args: Vec::new(),
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<[u8]>) -> Self {
        self.args.push(arg.as_ref().to_vec());
        self
    }

    /// Append several arguments in order.
    #[must_use]
    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_vec()));
        self
    }

    /// Lowercase command name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Arguments in wire order.
    #[must_use]
    pub fn arguments(&self) -> &[Vec<u8>] {
        &self.args
    }

    /// Argument `index` as UTF-8, if present and valid.
    #[must_use]
    pub fn arg_str(&self, index: usize) -> Option<&str> {
        self.args
            .get(index)
            .and_then(|raw| std::str::from_utf8(raw).ok())
    }

    /// Build the `redis` crate representation of this command.
    #[must_use]
    pub fn to_redis_cmd(&self) -> redis::Cmd {
        let mut cmd = redis::cmd(&self.name.to_ascii_uppercase());
        for arg in &self.args {
            cmd.arg(arg.as_slice());
        }
        cmd
    }
}

/// Decoded reply of a store command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Missing value.
    Nil,
    /// Integer reply.
    Int(i64),
    /// Bulk string.
    Bytes(Vec<u8>),
    /// Status line such as `OK` or `PONG`.
    Status(String),
    /// Multi-bulk reply (arrays and sets).
    Array(Vec<Reply>),
}

impl Reply {
    /// Bulk string or nil as an optional UTF-8 string.
    ///
    /// Returns the reply unchanged when it has another shape.
    pub fn into_optional_string(self) -> Result<Option<String>, Self> {
        match self {
            Self::Nil => Ok(None),
            other => other.into_string().map(Some),
        }
    }

    /// Bulk string or status line as UTF-8.
    pub fn into_string(self) -> Result<String, Self> {
        match self {
            Self::Status(text) => Ok(text),
            Self::Bytes(raw) => String::from_utf8(raw).map_err(|err| Self::Bytes(err.into_bytes())),
            other => Err(other),
        }
    }

    /// Integer reply.
    pub fn into_integer(self) -> Result<i64, Self> {
        match self {
            Self::Int(value) => Ok(value),
            other => Err(other),
        }
    }

    /// Multi-bulk reply of strings. An empty reply may also come back as nil.
    pub fn into_string_list(self) -> Result<Vec<String>, Self> {
        match self {
            Self::Nil => Ok(Vec::new()),
            Self::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(item.into_string()?);
                }
                Ok(out)
            }
            other => Err(other),
        }
    }

    /// Build a bulk string reply.
    pub fn bulk(value: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(value.into())
    }

    /// The `+OK` status reply.
    #[must_use]
    pub fn ok() -> Self {
        Self::Status("OK".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_table_is_sorted_and_unique() {
        for pair in COMMANDS.windows(2) {
            assert!(pair[0] < pair[1], "{} must sort before {}", pair[0], pair[1]);
        }
        assert!(is_known(AUTH_COMMAND));
        assert!(is_known(INFO_COMMAND));
        assert!(!is_known("definitely-not-a-command"));
    }

    #[test]
    fn command_name_is_lowercased() {
        let cmd = Command::new("SMEMBERS").arg("_config");
        assert_eq!(cmd.name(), "smembers");
        assert_eq!(cmd.arg_str(0), Some("_config"));
    }

    #[test]
    fn string_list_rejects_nested_integers() {
        let reply = Reply::Array(vec![Reply::bulk("a"), Reply::Int(1)]);
        assert_eq!(reply.into_string_list(), Err(Reply::Int(1)));
    }
}
