//! Point-in-time reachability checks for the remote store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;

/// Answers "can the remote store be reached right now?".
///
/// The engine asks immediately before each remote attempt. Implementations
/// must not cache beyond the single query, so a device that regains or
/// loses connectivity between drains is seen promptly.
#[async_trait]
pub trait ConnectivityMonitor: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

/// Probes the sync server's health endpoint over HTTP.
///
/// Any HTTP response counts as reachable; only transport failures and
/// timeouts mean offline.
pub struct HttpConnectivityMonitor {
    client: reqwest::Client,
    health_url: String,
    timeout: Duration,
}

impl HttpConnectivityMonitor {
    pub fn new(server_url: &str, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            health_url: Self::build_health_url(server_url),
            timeout,
        }
    }

    fn build_health_url(server_url: &str) -> String {
        let base = if server_url.starts_with("http://") || server_url.starts_with("https://") {
            server_url.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", server_url.trim_end_matches('/'))
        };
        format!("{}/health", base)
    }
}

#[async_trait]
impl ConnectivityMonitor for HttpConnectivityMonitor {
    async fn is_reachable(&self) -> bool {
        matches!(
            tokio::time::timeout(self.timeout, self.client.get(&self.health_url).send()).await,
            Ok(Ok(_))
        )
    }
}

/// Fixed-answer monitor for tests and for embedding applications that track
/// connectivity themselves (e.g. a platform network listener).
pub struct StaticConnectivity {
    online: AtomicBool,
}

impl StaticConnectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectivityMonitor for StaticConnectivity {
    async fn is_reachable(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_health_url_with_scheme() {
        assert_eq!(
            HttpConnectivityMonitor::build_health_url("http://localhost:8080"),
            "http://localhost:8080/health"
        );
        assert_eq!(
            HttpConnectivityMonitor::build_health_url("https://sync.example.com/"),
            "https://sync.example.com/health"
        );
    }

    #[test]
    fn test_build_health_url_bare_host() {
        assert_eq!(
            HttpConnectivityMonitor::build_health_url("localhost:8080"),
            "http://localhost:8080/health"
        );
    }

    #[tokio::test]
    async fn test_static_connectivity_flips() {
        let monitor = StaticConnectivity::new(false);
        assert!(!monitor.is_reachable().await);

        monitor.set_online(true);
        assert!(monitor.is_reachable().await);
    }

    #[tokio::test]
    async fn test_unreachable_host_reports_offline() {
        // Reserved TEST-NET address; the probe must fail fast via timeout.
        let monitor =
            HttpConnectivityMonitor::new("http://192.0.2.1:9", Duration::from_millis(100));
        assert!(!monitor.is_reachable().await);
    }
}
