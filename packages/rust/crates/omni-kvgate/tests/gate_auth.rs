#![allow(missing_docs)]

use std::sync::{Arc, Mutex};

use anyhow::Result;
use omni_kvgate::test_support::MemoryClient;
use omni_kvgate::{
    AuthCallback, AuthGate, AuthState, ClientOptions, GateError, GateOptions, GatePolicy, Reply,
    namespaced_credential,
};

fn confirmed() -> GateOptions {
    GateOptions {
        policy: GatePolicy::Confirmed,
        ..GateOptions::default()
    }
}

#[tokio::test]
async fn auth_sends_host_namespaced_credential() -> Result<()> {
    let client = MemoryClient::new("tenant-a.example");
    let gate = AuthGate::new(client.clone(), GateOptions::default())?;

    let reply = gate.auth("s3cret").await?;

    assert_eq!(reply, Reply::ok());
    assert_eq!(client.dispatched_lines(), vec!["auth tenant-a.example:s3cret"]);
    assert_eq!(gate.state(), AuthState::Authenticated);
    Ok(())
}

#[test]
fn credential_is_not_escaped() {
    assert_eq!(namespaced_credential("h:1", "p:w"), "h:1:p:w");
    assert_eq!(namespaced_credential("", ""), ":");
}

#[tokio::test]
async fn auth_opens_gate_and_commands_reach_the_client() -> Result<()> {
    let client = MemoryClient::new("h");
    client.seed_string("greeting", "hello");
    let gate = AuthGate::new(client.clone(), GateOptions::default())?;

    gate.auth("pw").await?;

    assert!(gate.is_open());
    assert!(gate.guarded_commands().is_empty());
    assert!(gate.client().is_some());
    assert_eq!(gate.get("greeting").await?.as_deref(), Some("hello"));
    gate.set("other", "1").await?;
    assert!(gate.exists("other").await?);
    assert_eq!(gate.ping().await?, "PONG");
    assert!(gate.info().await?.contains("redis_version"));
    Ok(())
}

#[tokio::test]
async fn optimistic_policy_opens_before_the_reply() -> Result<()> {
    let client = MemoryClient::new("h").requiring_credential("h:right");
    let gate = AuthGate::new(client.clone(), GateOptions::default())?;

    let pending = gate.auth("wrong");
    assert!(gate.is_open());
    assert_eq!(gate.state(), AuthState::Authenticating);

    let result = pending.await;
    assert!(matches!(result, Err(GateError::Upstream(_))));
    assert!(gate.is_open(), "optimistic gate does not re-lock");
    assert_eq!(gate.state(), AuthState::Authenticating);
    assert_eq!(gate.get("k").await?, None);
    Ok(())
}

#[tokio::test]
async fn confirmed_policy_keeps_guards_until_success() -> Result<()> {
    let client = MemoryClient::new("h").requiring_credential("h:right");
    let gate = AuthGate::new(client.clone(), confirmed())?;

    let pending = gate.auth("wrong");
    assert!(!gate.is_open());
    assert_eq!(gate.state(), AuthState::Authenticating);
    assert!(matches!(gate.get("k").await, Err(GateError::Blocked(_))));

    assert!(pending.await.is_err());
    assert!(!gate.is_open());
    assert_eq!(gate.state(), AuthState::Created);

    gate.auth("right").await?;
    assert!(gate.is_open());
    assert_eq!(gate.state(), AuthState::Authenticated);
    assert_eq!(gate.get("k").await?, None);
    Ok(())
}

#[tokio::test]
async fn upstream_auth_error_is_passed_through_unchanged() -> Result<()> {
    let client = MemoryClient::new("h").requiring_credential("h:right");
    let gate = AuthGate::new(client, GateOptions::default())?;

    let Err(error) = gate.auth("nope").await else {
        panic!("auth with the wrong credential must fail");
    };
    assert_eq!(error.to_string(), "WRONGPASS invalid username-password pair");
    Ok(())
}

#[tokio::test]
async fn authenticated_state_survives_a_later_failed_auth() -> Result<()> {
    let client = MemoryClient::new("h").requiring_credential("h:right");
    let gate = AuthGate::new(client.clone(), confirmed())?;

    gate.auth("right").await?;
    assert!(gate.auth("wrong").await.is_err());
    assert_eq!(gate.state(), AuthState::Authenticated);
    assert!(gate.is_open());
    assert_eq!(client.dispatched().len(), 2);
    Ok(())
}

#[tokio::test]
async fn auth_with_hands_the_result_to_the_callback() -> Result<()> {
    let gate = AuthGate::new(MemoryClient::new("h"), GateOptions::default())?;
    let seen: Arc<Mutex<Option<Result<Reply, String>>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);

    let callback: AuthCallback = Box::new(move |result: Result<Reply, GateError>| {
        *sink.lock().unwrap_or_else(std::sync::PoisonError::into_inner) =
            Some(result.map_err(|err| err.to_string()));
    });
    gate.auth_with("pw", Some(callback)).await;

    let seen = seen
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .take();
    assert_eq!(seen, Some(Ok(Reply::ok())));
    Ok(())
}

#[tokio::test]
async fn auth_with_without_callback_still_authenticates() -> Result<()> {
    let client = MemoryClient::new("h");
    let gate = AuthGate::new(client.clone(), GateOptions::default())?;

    gate.auth_with("pw", None).await;

    assert_eq!(gate.state(), AuthState::Authenticated);
    assert_eq!(client.dispatched_lines(), vec!["auth h:pw"]);
    Ok(())
}

#[tokio::test]
async fn connect_with_auth_option_authenticates_first() -> Result<()> {
    let client = MemoryClient::new("cache.local");
    let gate = AuthGate::connect(client.clone(), ClientOptions::with_auth("pw")).await?;

    assert_eq!(gate.state(), AuthState::Authenticated);
    assert_eq!(client.dispatched_lines(), vec!["auth cache.local:pw"]);
    assert_eq!(gate.get("k").await?, None);
    Ok(())
}

#[tokio::test]
async fn connect_without_auth_leaves_gate_closed() -> Result<()> {
    let client = MemoryClient::new("h");
    let gate = AuthGate::connect(client.clone(), ClientOptions::default()).await?;

    assert_eq!(gate.state(), AuthState::Created);
    assert!(!gate.is_open());
    assert!(client.dispatched().is_empty());
    Ok(())
}

#[tokio::test]
async fn connect_returns_auto_auth_failure() {
    let client = MemoryClient::new("h").requiring_credential("h:right");
    let result = AuthGate::connect(client, ClientOptions::with_auth("wrong")).await;
    assert!(matches!(result, Err(GateError::Upstream(_))));
}

#[test]
fn client_options_debug_redacts_credential() {
    let rendered = format!("{:?}", ClientOptions::with_auth("hunter2"));
    assert!(!rendered.contains("hunter2"));
    assert!(rendered.contains("<redacted>"));
}
