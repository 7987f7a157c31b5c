//! Server health tracking
//!
//! Polls `/health` on a fixed interval and tracks consecutive failures. A
//! success resets the failure count; too many misses in a row mark the server
//! as errored.

use crate::client::ServerClient;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Health state of one server
pub struct HealthMonitor {
    client: ServerClient,
    interval: Duration,
    max_attempts: u32,
    status: ServerStatus,
    failure_count: u32,
}

impl HealthMonitor {
    pub fn new(client: ServerClient, interval: Duration, max_attempts: u32) -> Self {
        Self {
            client,
            interval,
            max_attempts,
            status: ServerStatus::Disconnected,
            failure_count: 0,
        }
    }

    pub fn status(&self) -> ServerStatus {
        self.status
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    /// Fold one health-check outcome into the state
    pub fn record(&mut self, healthy: bool) -> ServerStatus {
        if healthy {
            if self.status != ServerStatus::Connected {
                info!("Server {} is healthy", self.client.base_url());
            }
            self.failure_count = 0;
            self.status = ServerStatus::Connected;
        } else {
            self.failure_count += 1;
            if self.failure_count >= self.max_attempts {
                if self.status != ServerStatus::Error {
                    warn!(
                        "Server {} marked as errored after {} failed health checks",
                        self.client.base_url(),
                        self.failure_count
                    );
                }
                self.status = ServerStatus::Error;
            } else {
                debug!(
                    "Server {} not ready ({}/{})",
                    self.client.base_url(),
                    self.failure_count,
                    self.max_attempts
                );
                self.status = ServerStatus::Connecting;
            }
        }
        self.status
    }

    /// Run one health check
    pub async fn poll(&mut self) -> ServerStatus {
        let healthy = self.client.health_check().await;
        self.record(healthy)
    }

    /// Poll until connected or until `deadline` has passed, which is an error.
    ///
    /// Failed checks before the deadline keep polling even once they exceed
    /// `max_attempts`; a slow-loading server still gets its full window.
    pub async fn wait_until_ready(&mut self, deadline: Duration) -> ServerStatus {
        let give_up = Instant::now() + deadline;
        let mut interval = tokio::time::interval(self.interval);

        loop {
            interval.tick().await;

            if self.poll().await == ServerStatus::Connected {
                return ServerStatus::Connected;
            }
            if Instant::now() >= give_up {
                warn!(
                    "Server {} not ready within {:?}",
                    self.client.base_url(),
                    deadline
                );
                self.status = ServerStatus::Error;
                return ServerStatus::Error;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(max_attempts: u32) -> HealthMonitor {
        let client = ServerClient::new("http://127.0.0.1:1").unwrap();
        HealthMonitor::new(client, Duration::from_millis(10), max_attempts)
    }

    #[test]
    fn test_status_transitions() {
        let mut monitor = monitor(3);
        assert_eq!(monitor.status(), ServerStatus::Disconnected);

        assert_eq!(monitor.record(false), ServerStatus::Connecting);
        assert_eq!(monitor.record(false), ServerStatus::Connecting);
        assert_eq!(monitor.record(true), ServerStatus::Connected);
        assert_eq!(monitor.failure_count(), 0);

        monitor.record(false);
        monitor.record(false);
        assert_eq!(monitor.record(false), ServerStatus::Error);
        assert_eq!(monitor.failure_count(), 3);

        // recovers on the next success
        assert_eq!(monitor.record(true), ServerStatus::Connected);
    }

    #[tokio::test]
    async fn test_wait_gives_up_at_deadline() {
        let mut monitor = monitor(3);
        let start = std::time::Instant::now();
        let status = monitor.wait_until_ready(Duration::from_millis(150)).await;

        assert_eq!(status, ServerStatus::Error);
        assert_eq!(monitor.status(), ServerStatus::Error);
        assert!(start.elapsed() >= Duration::from_millis(150));
        assert!(monitor.failure_count() > 3);
    }

    #[tokio::test]
    async fn test_wait_outlasts_max_attempts_for_slow_server() {
        use axum::http::StatusCode;
        use axum::routing::get;
        use axum::Router;

        // unhealthy for far more than 3 polls at 10ms, then healthy
        let ready_at = std::time::Instant::now() + Duration::from_millis(300);
        let app = Router::new().route(
            "/health",
            get(move || async move {
                if std::time::Instant::now() >= ready_at {
                    StatusCode::OK
                } else {
                    StatusCode::SERVICE_UNAVAILABLE
                }
            }),
        );
        let url = crate::test_support::spawn(app).await;

        let client = ServerClient::new(url).unwrap();
        let mut monitor = HealthMonitor::new(client, Duration::from_millis(10), 3);
        let status = monitor.wait_until_ready(Duration::from_millis(2000)).await;
        assert_eq!(status, ServerStatus::Connected);
    }
}
