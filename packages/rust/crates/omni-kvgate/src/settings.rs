//! Settings loader for the gated client.
//!
//! Loads and merges:
//! - System defaults: `<PRJ_ROOT>/packages/conf/kvgate.yaml`
//! - User overrides:  `<PRJ_CONFIG_HOME>/omni-dev-fusion/kvgate.yaml`
//!
//! Merge precedence is user over system; environment variables win over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::factory::ClientOptions;
use crate::gate::{GateOptions, GatePolicy};
use crate::observability::GateEvent;

const DEFAULT_SYSTEM_SETTINGS_RELATIVE_PATH: &str = "packages/conf/kvgate.yaml";
const DEFAULT_USER_SETTINGS_RELATIVE_PATH: &str = "omni-dev-fusion/kvgate.yaml";
const DEFAULT_CONFIG_HOME_RELATIVE_PATH: &str = ".config";

/// Default Valkey host.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default Valkey port.
pub const DEFAULT_PORT: u16 = 6379;

/// Raw settings as read from YAML; every field optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GateSettings {
    /// `valkey:` section.
    #[serde(default)]
    pub valkey: ValkeySettings,
    /// `gate:` section.
    #[serde(default)]
    pub gate: GateSectionSettings,
}

/// Connection settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValkeySettings {
    /// Server host; also namespaces the AUTH credential.
    pub host: Option<String>,
    /// Server port.
    pub port: Option<u16>,
    /// Password to authenticate with on construction.
    pub auth: Option<String>,
}

/// Gate behavior settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GateSectionSettings {
    /// `optimistic` or `confirmed`.
    pub policy: Option<String>,
    /// See [`GateOptions::auto_close_setup`].
    pub auto_close_setup: Option<bool>,
}

/// Settings after merge, env overrides and defaults.
#[derive(Debug, Clone)]
pub struct ResolvedGateSettings {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Options for [`crate::create_client`].
    pub options: ClientOptions,
}

impl GateSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            valkey: self.valkey.merge(overlay.valkey),
            gate: self.gate.merge(overlay.gate),
        }
    }

    /// Apply environment overrides and defaults.
    pub fn resolve(self) -> Result<ResolvedGateSettings> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Like [`GateSettings::resolve`] with a custom environment lookup.
    pub fn resolve_with<F>(self, env: F) -> Result<ResolvedGateSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| env(name).and_then(non_empty_string);

        let host = lookup("VALKEY_HOST")
            .or_else(|| self.valkey.host.clone().and_then(non_empty_string))
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("VALKEY_PORT") {
            Some(raw) => match raw.parse::<u16>() {
                Ok(port) if port > 0 => port,
                _ => {
                    tracing::warn!(
                        event = GateEvent::SettingsInvalidEnv.as_str(),
                        env_var = "VALKEY_PORT",
                        value = %raw,
                        "invalid valkey port env value; using settings/default"
                    );
                    self.valkey.port.unwrap_or(DEFAULT_PORT)
                }
            },
            None => self.valkey.port.unwrap_or(DEFAULT_PORT),
        };

        let auth = lookup("VALKEY_AUTH")
            .or_else(|| self.valkey.auth.clone().and_then(non_empty_string));

        let policy = match lookup("OMNI_KVGATE_POLICY")
            .or_else(|| self.gate.policy.clone().and_then(non_empty_string))
        {
            Some(raw) => parse_policy(&raw)?,
            None => GatePolicy::default(),
        };

        let auto_close_setup = self
            .gate
            .auto_close_setup
            .unwrap_or_else(|| GateOptions::default().auto_close_setup);

        Ok(ResolvedGateSettings {
            host,
            port,
            options: ClientOptions {
                auth,
                gate: GateOptions {
                    policy,
                    auto_close_setup,
                },
            },
        })
    }
}

impl ValkeySettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            host: overlay.host.or(self.host),
            port: overlay.port.or(self.port),
            auth: overlay.auth.or(self.auth),
        }
    }
}

impl GateSectionSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            policy: overlay.policy.or(self.policy),
            auto_close_setup: overlay.auto_close_setup.or(self.auto_close_setup),
        }
    }
}

/// Load merged settings (user overrides system).
pub fn load_settings() -> Result<GateSettings> {
    let (system_path, user_path) = settings_paths();
    load_settings_from_paths(&system_path, &user_path)
}

/// System and user settings file paths.
#[doc(hidden)]
pub fn settings_paths() -> (PathBuf, PathBuf) {
    let root = project_root();
    let system_path = root.join(DEFAULT_SYSTEM_SETTINGS_RELATIVE_PATH);
    let user_path = resolve_config_home(&root).join(DEFAULT_USER_SETTINGS_RELATIVE_PATH);
    (system_path, user_path)
}

/// Load and merge two settings files; missing files count as empty.
pub fn load_settings_from_paths(system: &Path, user: &Path) -> Result<GateSettings> {
    Ok(load_one(system)?.merge(load_one(user)?))
}

fn load_one(path: &Path) -> Result<GateSettings> {
    if !path.exists() {
        return Ok(GateSettings::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file: {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(GateSettings::default());
    }
    serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse settings yaml: {}", path.display()))
}

fn parse_policy(raw: &str) -> Result<GatePolicy> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "optimistic" => Ok(GatePolicy::Optimistic),
        "confirmed" => Ok(GatePolicy::Confirmed),
        other => bail!("invalid kvgate policy `{other}`; expected optimistic|confirmed"),
    }
}

fn non_empty_string(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn project_root() -> PathBuf {
    std::env::var("PRJ_ROOT")
        .ok()
        .and_then(non_empty_string)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn resolve_config_home(project_root: &Path) -> PathBuf {
    let configured = std::env::var("PRJ_CONFIG_HOME")
        .ok()
        .and_then(non_empty_string)
        .unwrap_or_else(|| DEFAULT_CONFIG_HOME_RELATIVE_PATH.to_string());
    let path = PathBuf::from(configured);
    if path.is_absolute() {
        path
    } else {
        project_root.join(path)
    }
}
