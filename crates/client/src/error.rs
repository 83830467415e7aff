/// Failure talking to the substrate node.
///
/// `Transport` and `Http` cover the connection layer and are produced only
/// after the retry schedule is exhausted. `Node` is a JSON-RPC level error
/// returned by a healthy node and is never retried.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("transport error calling `{method}`: {source}")]
    Transport {
        method: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP {status} calling `{method}`: {body}")]
    Http {
        method: String,
        status: u16,
        body: String,
    },
    #[error("node returned error {code} for `{method}`: {message}")]
    Node {
        method: String,
        code: i64,
        message: String,
    },
    #[error("malformed response for `{method}`: {reason}")]
    InvalidResponse { method: String, reason: String },
}


impl RpcError {
    pub(crate) fn invalid(method: &str, reason: impl Into<String>) -> Self {
        RpcError::InvalidResponse {
            method: method.to_string(),
            reason: reason.into(),
        }
    }

    /// True when the failure came from the connection layer rather than
    /// from the node answering.
    pub fn is_transport(&self) -> bool {
        matches!(self, RpcError::Transport { .. } | RpcError::Http { .. })
    }

    pub(crate) fn is_retryable(&self) -> bool {
        match self {
            RpcError::Transport { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            RpcError::Http { status, .. } => matches!(status, 429 | 502 | 503 | 504 | 524),
            _ => false,
        }
    }
}
