mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::prompt::PromptPayload;

pub use http::HttpProxyClient;

/// Failure of one proxy round-trip. Callers match on the variant to pick
/// a user-facing fallback; none of these carry provider credentials.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The proxy could not be reached or the connection broke mid-flight.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The proxy answered with a non-success status.
    #[error("proxy returned status {status}: {message}")]
    Api {
        status: u16,
        message: String,
    },

    /// The proxy answered but the body was not the expected JSON shape.
    #[error("malformed proxy response: {0}")]
    InvalidBody(#[from] serde_json::Error),

    /// The proxy answered successfully but carried no usable reply text.
    #[error("proxy response carried no reply text")]
    EmptyReply,
}

/// Boundary to the backend proxy holding the provider credential.
///
/// One request, one terminal response. Implementations do not retry on
/// their own and report every failure as a `ProxyError` value.
#[async_trait]
pub trait ProxyClient: Send + Sync {
    async fn send(&self, payload: &PromptPayload) -> Result<String, ProxyError>;
}
