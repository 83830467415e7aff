use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value as JsonValue};
use tracing::warn;
use url::Url;

use crate::error::RpcError;


const RETRY_SCHEDULE_MS: [u64; 6] = [0, 100, 200, 500, 1000, 2000];


pub fn default_http_client() -> Client {
    Client::builder()
        .read_timeout(Duration::from_secs(20))
        .connect_timeout(Duration::from_secs(20))
        .gzip(true)
        .build()
        .unwrap()
}


/// JSON-RPC 2.0 client over HTTP.
///
/// Transport failures and server side overload responses are retried on a
/// fixed schedule; once the schedule runs out the last error is returned.
pub struct RpcClient {
    http: Client,
    url: Url,
    next_id: AtomicU64,
}


impl RpcClient {
    pub fn new(url: Url) -> Self {
        Self::with_http(default_http_client(), url)
    }

    pub fn with_http(http: Client, url: Url) -> Self {
        RpcClient {
            http,
            url,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn call(&self, method: &str, params: JsonValue) -> Result<JsonValue, RpcError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        let mut last_error = None;
        for pause in RETRY_SCHEDULE_MS {
            if pause > 0 {
                tokio::time::sleep(Duration::from_millis(pause)).await;
            }
            match self.call_once(method, &body).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() => {
                    warn!(
                        url = %self.url.as_str(),
                        method,
                        error = ?err,
                        "rpc request failed, will retry"
                    );
                    last_error = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_error.unwrap_or_else(|| RpcError::invalid(method, "retry loop without error")))
    }

    async fn call_once(&self, method: &str, body: &JsonValue) -> Result<JsonValue, RpcError> {
        let response = self
            .http
            .post(self.url.clone())
            .json(body)
            .send()
            .await
            .map_err(|source| RpcError::Transport {
                method: method.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RpcError::Http {
                method: method.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let envelope: JsonValue =
            response
                .json()
                .await
                .map_err(|source| RpcError::Transport {
                    method: method.to_string(),
                    source,
                })?;

        if let Some(error) = envelope.get("error") {
            let code = error.get("code").and_then(JsonValue::as_i64).unwrap_or(0);
            let message = error
                .get("message")
                .and_then(JsonValue::as_str)
                .unwrap_or("")
                .to_string();
            return Err(RpcError::Node {
                method: method.to_string(),
                code,
                message,
            });
        }

        match envelope.get("result") {
            Some(result) => Ok(result.clone()),
            None => Err(RpcError::invalid(method, "response has no result field")),
        }
    }
}
