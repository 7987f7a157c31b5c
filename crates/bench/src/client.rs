//! HTTP client for a running TexDit server

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use texdit_common::Result;
use texdit_engine::text::round_to;
use tracing::debug;

/// Timeout for `GET /health`
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of one timed API call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointResult {
    pub success: bool,

    /// Wall-clock seconds, rounded to 3 places
    pub time_seconds: f64,

    pub response: Option<Value>,

    pub error: Option<String>,

    #[serde(default)]
    pub timed_out: bool,
}

/// Client bound to one server's base URL
#[derive(Debug, Clone)]
pub struct ServerClient {
    base_url: String,
    client: reqwest::Client,
}

impl ServerClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// True only for a 200 from `/health`
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).timeout(HEALTH_TIMEOUT).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                debug!("Health check against {} failed: {}", url, e);
                false
            }
        }
    }

    /// POST `body` to `/api/<endpoint>` and time it
    pub async fn post_endpoint(&self, endpoint: &str, body: &Value, timeout: Duration) -> EndpointResult {
        let url = format!("{}/api/{}", self.base_url, endpoint);
        let start = Instant::now();

        let sent = self.client.post(&url).json(body).timeout(timeout).send().await;
        let outcome = match sent {
            Ok(response) if response.status().is_success() => response
                .json::<Value>()
                .await
                .map(Some)
                .map_err(|e| (e.to_string(), e.is_timeout())),
            Ok(response) => {
                let status = response.status().as_u16();
                let text = response.text().await.unwrap_or_default();
                Err((format!("HTTP {}: {}", status, text), false))
            }
            Err(e) => Err((e.to_string(), e.is_timeout())),
        };
        let time_seconds = round_to(start.elapsed().as_secs_f64(), 3);

        match outcome {
            Ok(response) => EndpointResult {
                success: true,
                time_seconds,
                response,
                error: None,
                timed_out: false,
            },
            Err((error, timed_out)) => EndpointResult {
                success: false,
                time_seconds,
                response: None,
                error: Some(error),
                timed_out,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    #[tokio::test]
    async fn test_health_and_post() {
        let app = Router::new()
            .route("/health", get(|| async { Json(json!({"status": "ok"})) }))
            .route(
                "/api/keywords",
                post(|Json(body): Json<Value>| async move { Json(json!({"echo": body["text"]})) }),
            )
            .route(
                "/api/tone",
                post(|| async { (StatusCode::BAD_REQUEST, "Text cannot be empty") }),
            );
        let client = ServerClient::new(spawn(app).await).unwrap();

        assert!(client.health_check().await);

        let ok = client
            .post_endpoint("keywords", &json!({"text": "hello"}), Duration::from_secs(5))
            .await;
        assert!(ok.success);
        assert_eq!(ok.response.unwrap()["echo"], "hello");

        let failed = client
            .post_endpoint("tone", &json!({"text": ""}), Duration::from_secs(5))
            .await;
        assert!(!failed.success);
        assert!(!failed.timed_out);
        assert_eq!(failed.error.as_deref(), Some("HTTP 400: Text cannot be empty"));
    }

    #[tokio::test]
    async fn test_timeout_is_flagged() {
        let app = Router::new().route(
            "/api/rephrase",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                "late"
            }),
        );
        let client = ServerClient::new(spawn(app).await).unwrap();

        let result = client
            .post_endpoint("rephrase", &json!({}), Duration::from_millis(100))
            .await;
        assert!(!result.success);
        assert!(result.timed_out);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unhealthy() {
        // nothing listens on port 1
        let client = ServerClient::new("http://127.0.0.1:1/").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:1");
        assert!(!client.health_check().await);
    }
}
