//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::{SocketAddr, TcpListener};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Reserve a loopback address that is free at the time of the call.
pub fn free_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// A config file body that passes validation and listens on `addr`.
pub fn config_yaml(log_level: &str, addr: SocketAddr) -> String {
    format!(
        "log_level: {log_level}\n\
         timeouts:\n  startup: 5s\n  shutdown: 5s\n\
         http:\n  listen_address: {addr}\n  cors:\n    allowed_origins: ['*']\n\
         database:\n  host: mongodb://db.compsoc.ie\n  name: apid\n  username: apid_user\n  password: hunter22\n"
    )
}

pub fn write_config(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("apid.yml");
    std::fs::write(&path, body).unwrap();
    path
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap()
}

/// Poll `check` until it returns true or `timeout` passes.
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}
