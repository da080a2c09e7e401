use async_trait::async_trait;
use log::debug;
use serde::{ Serialize, Deserialize };

use super::{ ProxyClient, ProxyError };
use crate::prompt::{ PayloadContent, PromptPayload };

#[derive(Serialize)]
struct ProxyRequest<'a> {
    messages: &'a [PayloadContent],
}

#[derive(Deserialize)]
struct ProxyResponse {
    reply: Option<String>,
    error: Option<String>,
}

/// `ProxyClient` over HTTP, for deployments where the proxy route runs
/// out of process. Posts the payload as `{"messages": [...]}` and reads
/// the reply from `{"reply": "..."}`.
pub struct HttpProxyClient {
    http: reqwest::Client,
    url: String,
}

impl HttpProxyClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    /// Uses a caller-supplied `reqwest` client, e.g. one with custom
    /// timeouts or TLS settings.
    pub fn with_client(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn reply_from_response(status: u16, body: &str) -> Result<String, ProxyError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ProxyResponse>(body)
            .ok()
            .and_then(|response| response.error)
            .unwrap_or_else(|| "no error detail".to_string());
        return Err(ProxyError::Api { status, message });
    }
    let response: ProxyResponse = serde_json::from_str(body)?;
    match response.reply {
        Some(reply) if !reply.trim().is_empty() => Ok(reply),
        _ => Err(ProxyError::EmptyReply),
    }
}

#[async_trait]
impl ProxyClient for HttpProxyClient {
    async fn send(&self, payload: &PromptPayload) -> Result<String, ProxyError> {
        debug!("POST {} with {} payload elements", self.url, payload.len());
        let response = self.http
            .post(&self.url)
            .json(&ProxyRequest { messages: payload })
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        reply_from_response(status, &body)
    }
}
