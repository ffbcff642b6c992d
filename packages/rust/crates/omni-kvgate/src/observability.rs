//! Stable event ids attached to structured log records.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateEvent {
    GuardsInstalled,
    GuardsRemoved,
    SetupClosed,
    CommandBlocked,
    CommandBlockedUnobserved,
    AuthStarted,
    AuthSucceeded,
    AuthFailed,
    ConfigLoaded,
    ConfigFailed,
    ValkeyConnected,
    ValkeyReauthenticated,
    ValkeyCommandFailed,
    SettingsInvalidEnv,
}

impl GateEvent {
    pub const ALL: &'static [Self] = &[
        Self::GuardsInstalled,
        Self::GuardsRemoved,
        Self::SetupClosed,
        Self::CommandBlocked,
        Self::CommandBlockedUnobserved,
        Self::AuthStarted,
        Self::AuthSucceeded,
        Self::AuthFailed,
        Self::ConfigLoaded,
        Self::ConfigFailed,
        Self::ValkeyConnected,
        Self::ValkeyReauthenticated,
        Self::ValkeyCommandFailed,
        Self::SettingsInvalidEnv,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GuardsInstalled => "kvgate.guards.installed",
            Self::GuardsRemoved => "kvgate.guards.removed",
            Self::SetupClosed => "kvgate.setup.closed",
            Self::CommandBlocked => "kvgate.command.blocked",
            Self::CommandBlockedUnobserved => "kvgate.command.blocked_unobserved",
            Self::AuthStarted => "kvgate.auth.started",
            Self::AuthSucceeded => "kvgate.auth.succeeded",
            Self::AuthFailed => "kvgate.auth.failed",
            Self::ConfigLoaded => "kvgate.config.loaded",
            Self::ConfigFailed => "kvgate.config.failed",
            Self::ValkeyConnected => "kvgate.valkey.connected",
            Self::ValkeyReauthenticated => "kvgate.valkey.reauthenticated",
            Self::ValkeyCommandFailed => "kvgate.valkey.command_failed",
            Self::SettingsInvalidEnv => "kvgate.settings.invalid_env",
        }
    }
}
