#![allow(missing_docs)]

use std::collections::HashMap;
use std::path::PathBuf;

use omni_kvgate::{DEFAULT_HOST, DEFAULT_PORT, GatePolicy, GateSettings, load_settings_from_paths};
use tempfile::TempDir;

fn write_file(path: PathBuf, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    std::fs::write(path, content).expect("write yaml");
}

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |name: &str| map.get(name).cloned()
}

#[test]
fn merge_user_overrides_system() {
    let tmp = TempDir::new().expect("tempdir");
    let system = tmp.path().join("packages/conf/kvgate.yaml");
    let user = tmp.path().join(".config/omni-dev-fusion/kvgate.yaml");

    write_file(
        system.clone(),
        r#"
valkey:
  host: "valkey.system"
  port: 6380
gate:
  policy: "optimistic"
  auto_close_setup: true
"#,
    );
    write_file(
        user.clone(),
        r#"
valkey:
  host: "valkey.user"
  auth: "user-pass"
gate:
  policy: "confirmed"
"#,
    );

    let settings = load_settings_from_paths(&system, &user).expect("load settings");
    assert_eq!(settings.valkey.host.as_deref(), Some("valkey.user"));
    assert_eq!(settings.valkey.port, Some(6380));
    assert_eq!(settings.valkey.auth.as_deref(), Some("user-pass"));
    assert_eq!(settings.gate.policy.as_deref(), Some("confirmed"));
    assert_eq!(settings.gate.auto_close_setup, Some(true));

    let resolved = settings.resolve_with(env_of(&[])).expect("resolve");
    assert_eq!(resolved.host, "valkey.user");
    assert_eq!(resolved.port, 6380);
    assert_eq!(resolved.options.auth.as_deref(), Some("user-pass"));
    assert_eq!(resolved.options.gate.policy, GatePolicy::Confirmed);
}

#[test]
fn missing_files_resolve_to_defaults() {
    let tmp = TempDir::new().expect("tempdir");
    let settings = load_settings_from_paths(&tmp.path().join("a.yaml"), &tmp.path().join("b.yaml"))
        .expect("load settings");

    let resolved = settings.resolve_with(env_of(&[])).expect("resolve");
    assert_eq!(resolved.host, DEFAULT_HOST);
    assert_eq!(resolved.port, DEFAULT_PORT);
    assert!(resolved.options.auth.is_none());
    assert_eq!(resolved.options.gate.policy, GatePolicy::Optimistic);
    assert!(resolved.options.gate.auto_close_setup);
}

#[test]
fn env_overrides_settings() {
    let mut settings = GateSettings::default();
    settings.valkey.host = Some("from-file".to_string());
    settings.valkey.port = Some(7000);

    let resolved = settings
        .resolve_with(env_of(&[
            ("VALKEY_HOST", " from-env "),
            ("VALKEY_PORT", "7001"),
            ("VALKEY_AUTH", "env-pass"),
            ("OMNI_KVGATE_POLICY", "CONFIRMED"),
        ]))
        .expect("resolve");

    assert_eq!(resolved.host, "from-env");
    assert_eq!(resolved.port, 7001);
    assert_eq!(resolved.options.auth.as_deref(), Some("env-pass"));
    assert_eq!(resolved.options.gate.policy, GatePolicy::Confirmed);
}

#[test]
fn invalid_port_env_falls_back_to_settings() {
    let mut settings = GateSettings::default();
    settings.valkey.port = Some(7000);

    let resolved = settings
        .resolve_with(env_of(&[("VALKEY_PORT", "not-a-port")]))
        .expect("resolve");
    assert_eq!(resolved.port, 7000);
}

#[test]
fn invalid_policy_is_rejected() {
    let mut settings = GateSettings::default();
    settings.gate.policy = Some("whenever".to_string());

    let error = settings.resolve_with(env_of(&[])).expect_err("policy must be rejected");
    assert!(error.to_string().contains("whenever"));
}

#[test]
fn malformed_yaml_is_an_error() {
    let tmp = TempDir::new().expect("tempdir");
    let system = tmp.path().join("kvgate.yaml");
    write_file(system.clone(), "valkey: [not, a, map]\n");

    let result = load_settings_from_paths(&system, &tmp.path().join("missing.yaml"));
    assert!(result.is_err());
}
