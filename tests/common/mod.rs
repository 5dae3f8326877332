//! Shared utilities for integration and load testing.

use std::net::SocketAddr;
use std::time::Duration;

use digest_server::config::ServiceConfig;
use digest_server::{HttpServer, Shutdown};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[allow(dead_code)]
pub const FORM: &str = "application/x-www-form-urlencoded";

/// A server running on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server task to finish.
    #[allow(dead_code)]
    pub async fn stop(self) {
        self.shutdown.trigger("test finished");
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked");
    }
}

/// Start a server with `commit_delay` on 127.0.0.1 and a random port.
pub async fn start_server(commit_delay: Duration) -> TestServer {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.store.commit_delay_ms = commit_delay.as_millis() as u64;

    let listener = TcpListener::bind(config.listener.bind_target()).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, shutdown.clone()).unwrap();
    let handle = tokio::spawn(async move {
        server.run(listener).await.unwrap();
    });

    TestServer {
        addr,
        shutdown,
        handle,
    }
}

/// A client that never reuses connections, so shutdown is not held up by idle ones.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
