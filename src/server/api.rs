use crate::cli::Args;
use crate::prompt::PayloadContent;
use std::error::Error;
use std::net::SocketAddr;
use axum::{
    routing::post,
    Router,
    extract::State,
    response::IntoResponse,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use log::{info, error};

/// Body the widget posts: the assembled payload, policy element first.
#[derive(Deserialize)]
pub struct ChatProxyRequest {
    pub messages: Vec<PayloadContent>,
}

#[derive(Serialize)]
struct ChatReply {
    reply: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: &'a [PayloadContent],
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Clone)]
pub struct ProxyState {
    http: reqwest::Client,
    args: Args,
}

impl ProxyState {
    pub fn new(args: Args) -> Self {
        Self {
            http: reqwest::Client::new(),
            args,
        }
    }
}

pub fn router(state: ProxyState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/gemini", post(chat_proxy_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_http_server(
    addr: &str,
    args: Args,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = addr.parse::<SocketAddr>()?;
    let app = router(ProxyState::new(args.clone()));

    if args.enable_tls {
        match (&args.tls_cert_path, &args.tls_key_path) {
            (Some(cert_path), Some(key_path)) => {
                info!(
                    "TLS enabled. Loading certificate from '{}' and key from '{}'",
                    cert_path,
                    key_path
                );
                let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                    cert_path,
                    key_path
                ).await?;
                info!("Starting HTTPS API server on: https://{}", addr);
                axum_server::bind_rustls(addr, tls_config)
                    .serve(app.into_make_service())
                    .await?;
            }
            (Some(_), None) | (None, Some(_)) => {
                error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                return Err("Missing TLS certificate or key path".into());
            }
            (None, None) => {
                error!("--enable-tls was set but no certificate/key paths provided.");
                return Err("TLS enabled without cert/key".into());
            }
        }
    } else {
        info!("Starting HTTP API server on: http://{}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app.into_make_service()).await?;
    }

    Ok(())
}

fn generate_url(base_url: &str, model: &str, api_key: &str) -> String {
    format!("{}/models/{}:generateContent?key={}", base_url.trim_end_matches('/'), model, api_key)
}

fn extract_reply(response: &GenerateResponse) -> String {
    response.candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .and_then(|content| content.parts.first())
        .map(|part| part.text.clone())
        .unwrap_or_default()
}

/// Forwards the widget payload to the provider and relays the first
/// candidate's text back as `{"reply": "..."}`. Upstream detail goes to
/// the log only; the widget never sees provider errors or the key.
async fn chat_proxy_handler(
    State(state): State<ProxyState>,
    Json(request): Json<ChatProxyRequest>,
) -> impl IntoResponse {
    if state.args.gemini_api_key.is_empty() {
        error!("GEMINI_API_KEY is not configured");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody { error: "API key not configured".into() }),
        ).into_response();
    }

    info!(
        "Forwarding {} payload elements to model {}",
        request.messages.len(),
        state.args.gemini_model
    );
    let url = generate_url(
        &state.args.gemini_base_url,
        &state.args.gemini_model,
        &state.args.gemini_api_key
    );
    let upstream = state.http
        .post(&url)
        .json(&(GenerateRequest { contents: &request.messages }))
        .send().await;

    match upstream {
        Ok(response) if response.status().is_success() => {
            match response.json::<GenerateResponse>().await {
                Ok(body) => {
                    let reply = extract_reply(&body);
                    (StatusCode::OK, Json(ChatReply { reply })).into_response()
                }
                Err(e) => {
                    error!("Gemini API response decode failed: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ErrorBody { error: "Gemini API request failed".into() }),
                    ).into_response()
                }
            }
        }
        Ok(response) => {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            error!("Gemini API error: {} {}", status, detail);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody { error: "Gemini API request failed".into() }),
            ).into_response()
        }
        Err(e) => {
            error!("Gemini API error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody { error: "Gemini API request failed".into() }),
            ).into_response()
        }
    }
}
