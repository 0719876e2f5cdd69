//! End-to-end tests for supervised HTTP service reloads.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use apid::config::{Config, ConfigSource, ConfigWatcher};
use apid::http::HttpService;
use apid::lifecycle::{supervise, Shutdown, Supervisor, SupervisorError, SupervisorState};
use tempfile::TempDir;

mod common;

fn config_for(addr: SocketAddr) -> Config {
    let mut config = Config::default();
    config.http.listen_address = addr.to_string();
    config.timeouts.startup = Duration::from_secs(5);
    config.timeouts.shutdown = Duration::from_secs(5);
    config
}

async fn ping(client: &reqwest::Client, addr: SocketAddr) -> Option<String> {
    let response = client
        .get(format!("http://{addr}/v2/ping"))
        .send()
        .await
        .ok()?;
    if !response.status().is_success() {
        return None;
    }
    let body: serde_json::Value = response.json().await.ok()?;
    body["message"].as_str().map(str::to_string)
}

#[tokio::test]
async fn reload_moves_service_to_new_address() {
    let client = common::client();
    let first = common::free_addr();
    let second = common::free_addr();

    let supervisor = Supervisor::new(HttpService::factory);
    supervisor.start(config_for(first)).await.unwrap();
    assert_eq!(ping(&client, first).await.as_deref(), Some("Pong!"));

    supervisor.reload(config_for(second)).await.unwrap();
    assert_eq!(supervisor.state(), SupervisorState::Running);
    assert_eq!(ping(&client, second).await.as_deref(), Some("Pong!"));
    assert_eq!(ping(&client, first).await, None);

    supervisor.shutdown().await.unwrap();
    assert_eq!(ping(&client, second).await, None);
}

#[tokio::test]
async fn reload_on_same_address_rebinds() {
    let client = common::client();
    let addr = common::free_addr();

    let supervisor = Supervisor::new(HttpService::factory);
    supervisor.start(config_for(addr)).await.unwrap();

    let mut config = config_for(addr);
    config.log_level = "debug".to_string();
    supervisor.reload(config).await.unwrap();

    assert_eq!(ping(&client, addr).await.as_deref(), Some("Pong!"));
    assert_eq!(
        supervisor.current_config().await.unwrap().log_level,
        "debug"
    );
    supervisor.shutdown().await.unwrap();
}

#[tokio::test]
async fn bind_failure_leaves_supervisor_failed() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = taken.local_addr().unwrap();

    let supervisor = Supervisor::new(HttpService::factory);
    let err = supervisor.start(config_for(addr)).await.unwrap_err();
    assert!(matches!(err, SupervisorError::Start(_)), "{err:?}");
    assert_eq!(supervisor.state(), SupervisorState::Failed);
}

#[tokio::test]
async fn file_edit_restarts_service_with_new_config() {
    let client = common::client();
    let dir = TempDir::new().unwrap();
    let first = common::free_addr();
    let second = common::free_addr();
    let path = common::write_config(dir.path(), &common::config_yaml("info", first));

    let source = ConfigSource::new().with_directories([dir.path()]);
    let config = source.load().unwrap();
    let supervisor = Arc::new(Supervisor::new(HttpService::factory));
    supervisor.start(config).await.unwrap();
    assert_eq!(ping(&client, first).await.as_deref(), Some("Pong!"));

    let (watcher, updates) = ConfigWatcher::new(source, &path);
    let _watch = watcher.run().unwrap();

    let shutdown = Shutdown::new();
    let task = {
        let supervisor = Arc::clone(&supervisor);
        let terminate = shutdown.wait();
        tokio::spawn(async move { supervise(&supervisor, updates, terminate, |_| {}).await })
    };

    // Give the watcher a moment to register before editing.
    tokio::time::sleep(Duration::from_millis(200)).await;
    common::write_config(dir.path(), &common::config_yaml("debug", second));

    let moved = common::eventually(Duration::from_secs(10), || {
        let client = client.clone();
        async move { ping(&client, second).await.is_some() }
    })
    .await;
    assert!(moved, "service never came up on the new address");
    assert_eq!(ping(&client, first).await, None);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(10), task)
        .await
        .expect("supervise should end after shutdown")
        .unwrap()
        .unwrap();
    assert_eq!(supervisor.state(), SupervisorState::Idle);
    assert_eq!(ping(&client, second).await, None);
}

#[tokio::test]
async fn broken_edit_keeps_current_service() {
    let client = common::client();
    let dir = TempDir::new().unwrap();
    let addr = common::free_addr();
    let path = common::write_config(dir.path(), &common::config_yaml("info", addr));

    let source = ConfigSource::new().with_directories([dir.path()]);
    let supervisor = Supervisor::new(HttpService::factory);
    supervisor.start(source.load().unwrap()).await.unwrap();

    let (watcher, mut updates) = ConfigWatcher::new(source, &path);
    common::write_config(dir.path(), "");
    assert!(!watcher.reload());
    assert!(updates.try_recv().is_err());

    assert_eq!(ping(&client, addr).await.as_deref(), Some("Pong!"));
    supervisor.shutdown().await.unwrap();
}
