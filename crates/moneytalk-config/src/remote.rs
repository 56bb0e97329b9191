//! Remote configuration lookup.
//!
//! At startup the application may ask a remote key/value document for a
//! target URL. The lookup never fails loudly: every problem degrades to no
//! URL plus a [`RetrievalState`] describing what happened. It has no access
//! to the journal store.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, Result};
use crate::types::RemoteConfig;

// ─────────────────────────────────────────────────────────────────────────────
// Outcome
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum RetrievalState {
    Completed,
    Failed(String),
    #[default]
    Pending,
    /// The endpoint asked us to back off; the URL came from local defaults.
    RateLimited,
}

impl fmt::Display for RetrievalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            Self::Pending => f.write_str("pending"),
            Self::RateLimited => f.write_str("rate limited"),
        }
    }
}

/// A resolved target URL (if any) and how it was obtained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Retrieval {
    pub url: Option<String>,
    #[serde(flatten)]
    pub state: RetrievalState,
}

impl Retrieval {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            url: None,
            state: RetrievalState::Failed(reason.into()),
        }
    }

    pub fn into_parts(self) -> (Option<String>, RetrievalState) {
        (self.url, self.state)
    }
}

/// A source of the startup target URL.
#[async_trait]
pub trait RemoteConfigSource: Send + Sync {
    async fn retrieve_target_url(&self) -> Retrieval;
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP Source
// ─────────────────────────────────────────────────────────────────────────────

/// Fetches a JSON object of string values over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRemoteConfig {
    http: reqwest::Client,
    endpoint: String,
    target_key: String,
    fallback_key: String,
    defaults: BTreeMap<String, String>,
    fetch_timeout: Duration,
    reachability_timeout: Duration,
}

impl HttpRemoteConfig {
    /// Build from the `[remote]` section. Fails when no endpoint is set.
    pub fn from_config(config: &RemoteConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingField {
                field: "endpoint".to_string(),
                context: "[remote]".to_string(),
            })?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("moneytalk/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            target_key: config.target_key.clone(),
            fallback_key: config.fallback_key.clone(),
            defaults: config.defaults.clone(),
            fetch_timeout: config.fetch_timeout(),
            reachability_timeout: config.reachability_timeout(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn default_value(&self, key: &str) -> Option<String> {
        self.defaults.get(key).cloned().and_then(non_empty)
    }

    /// Ask the endpoint for the target URL, without the reachability check.
    async fn fetch(&self) -> Retrieval {
        let response = match self
            .http
            .get(&self.endpoint)
            .timeout(self.fetch_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Retrieval::failed(format!("configuration retrieval failed: {e}")),
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Retrieval {
                url: self.default_value(&self.fallback_key),
                state: RetrievalState::RateLimited,
            };
        }
        if !status.is_success() {
            return Retrieval::failed(format!("configuration retrieval failed: HTTP {status}"));
        }

        let document: HashMap<String, Value> = match response.json().await {
            Ok(document) => document,
            Err(e) => return Retrieval::failed(format!("invalid configuration document: {e}")),
        };

        let url = document
            .get(&self.target_key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| self.defaults.get(&self.target_key).cloned())
            .and_then(non_empty);

        Retrieval {
            url,
            state: RetrievalState::Completed,
        }
    }

    /// Whether `url` answers within the reachability timeout.
    async fn check_reachable(&self, url: &str) -> std::result::Result<(), String> {
        let response = self
            .http
            .get(url)
            .timeout(self.reachability_timeout)
            .send()
            .await
            .map_err(|e| format!("target unreachable: {e}"))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(format!("target unreachable: HTTP {status}"));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteConfigSource for HttpRemoteConfig {
    async fn retrieve_target_url(&self) -> Retrieval {
        let retrieval = self.fetch().await;
        let Some(url) = retrieval.url.as_deref() else {
            if let RetrievalState::Failed(reason) = &retrieval.state {
                warn!(endpoint = %self.endpoint, %reason, "remote config unavailable");
            } else {
                debug!(endpoint = %self.endpoint, state = %retrieval.state, "no target url");
            }
            return retrieval;
        };

        match self.check_reachable(url).await {
            Ok(()) => {
                info!(%url, state = %retrieval.state, "remote target resolved");
                retrieval
            }
            Err(reason) => {
                warn!(%url, %reason, "remote target rejected");
                Retrieval::failed(reason)
            }
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn remote_config(server: &MockServer) -> RemoteConfig {
        RemoteConfig {
            endpoint: Some(format!("{}/config.json", server.uri())),
            ..RemoteConfig::default()
        }
    }

    async fn mount_target(server: &MockServer, status: u16) {
        Mock::given(method("GET"))
            .and(path("/start"))
            .respond_with(ResponseTemplate::new(status))
            .mount(server)
            .await;
    }

    #[test]
    fn test_requires_endpoint() {
        let err = HttpRemoteConfig::from_config(&RemoteConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { .. }));
    }

    #[test]
    fn test_state_serialization() {
        let retrieval = Retrieval::failed("boom");
        let value = serde_json::to_value(&retrieval).unwrap();
        assert_eq!(value, json!({"url": null, "state": "failed", "reason": "boom"}));
        assert_eq!(Retrieval::default().state, RetrievalState::Pending);
    }

    #[tokio::test]
    async fn test_completed_with_reachable_target() {
        let server = MockServer::start().await;
        let target = format!("{}/start", server.uri());
        Mock::given(method("GET"))
            .and(path("/config.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "url_3": target })))
            .mount(&server)
            .await;
        mount_target(&server, 200).await;

        let source = HttpRemoteConfig::from_config(&remote_config(&server)).unwrap();
        let (url, state) = source.retrieve_target_url().await.into_parts();
        assert_eq!(url.as_deref(), Some(target.as_str()));
        assert_eq!(state, RetrievalState::Completed);
    }

    #[tokio::test]
    async fn test_empty_value_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/config.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "url_3": "" })))
            .mount(&server)
            .await;

        let source = HttpRemoteConfig::from_config(&remote_config(&server)).unwrap();
        let retrieval = source.retrieve_target_url().await;
        assert_eq!(retrieval.url, None);
        assert_eq!(retrieval.state, RetrievalState::Completed);
    }

    #[tokio::test]
    async fn test_rate_limited_uses_fallback_default() {
        let server = MockServer::start().await;
        let fallback = format!("{}/start", server.uri());
        Mock::given(method("GET"))
            .and(path("/config.json"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        mount_target(&server, 200).await;

        let mut config = remote_config(&server);
        config.defaults.insert("url_2".into(), fallback.clone());
        let source = HttpRemoteConfig::from_config(&config).unwrap();

        let retrieval = source.retrieve_target_url().await;
        assert_eq!(retrieval.url, Some(fallback));
        assert_eq!(retrieval.state, RetrievalState::RateLimited);
    }

    #[tokio::test]
    async fn test_rate_limited_without_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let source = HttpRemoteConfig::from_config(&remote_config(&server)).unwrap();
        let retrieval = source.retrieve_target_url().await;
        assert_eq!(retrieval.url, None);
        assert_eq!(retrieval.state, RetrievalState::RateLimited);
    }

    #[tokio::test]
    async fn test_server_error_degrades_to_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let source = HttpRemoteConfig::from_config(&remote_config(&server)).unwrap();
        let retrieval = source.retrieve_target_url().await;
        assert_eq!(retrieval.url, None);
        assert!(matches!(retrieval.state, RetrievalState::Failed(_)));
    }

    #[tokio::test]
    async fn test_unreachable_target_degrades_to_failed() {
        let server = MockServer::start().await;
        let target = format!("{}/start", server.uri());
        Mock::given(method("GET"))
            .and(path("/config.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "url_3": target })))
            .mount(&server)
            .await;
        mount_target(&server, 404).await;

        let source = HttpRemoteConfig::from_config(&remote_config(&server)).unwrap();
        let retrieval = source.retrieve_target_url().await;
        assert_eq!(retrieval.url, None);
        assert!(matches!(retrieval.state, RetrievalState::Failed(ref r) if r.contains("404")));
    }

    #[tokio::test]
    async fn test_slow_target_hits_reachability_timeout() {
        let server = MockServer::start().await;
        let target = format!("{}/start", server.uri());
        Mock::given(method("GET"))
            .and(path("/config.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "url_3": target })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/start"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let mut config = remote_config(&server);
        config.reachability_timeout_secs = 1;
        let source = HttpRemoteConfig::from_config(&config).unwrap();

        let retrieval = source.retrieve_target_url().await;
        assert_eq!(retrieval.url, None);
        assert!(matches!(retrieval.state, RetrievalState::Failed(_)));
    }

    #[tokio::test]
    async fn test_missing_key_uses_target_default() {
        let server = MockServer::start().await;
        let target = format!("{}/start", server.uri());
        Mock::given(method("GET"))
            .and(path("/config.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "other": "x" })))
            .mount(&server)
            .await;
        mount_target(&server, 200).await;

        let mut config = remote_config(&server);
        config.defaults.insert("url_3".into(), target.clone());
        let source = HttpRemoteConfig::from_config(&config).unwrap();

        let retrieval = source.retrieve_target_url().await;
        assert_eq!(retrieval.url, Some(target));
        assert_eq!(retrieval.state, RetrievalState::Completed);
    }
}
