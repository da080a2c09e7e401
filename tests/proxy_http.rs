use std::net::SocketAddr;
use std::sync::{ Arc, Mutex };

use axum::{ extract::State, routing::post, Json, Router };
use serde_json::{ json, Value };

use chatbot_widget::cli::Args;
use chatbot_widget::server::api::{ router, ProxyState };
use chatbot_widget::{
    ChatSession,
    HttpProxyClient,
    PromptAssembler,
    ProxyClient,
    ProxyError,
    SubmitOutcome,
    DEFAULT_POLICY,
    FALLBACK_NO_REPLY,
    FALLBACK_UNREACHABLE,
};

type Captured = Arc<Mutex<Option<Value>>>;

async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.expect("serve");
    });
    addr
}

/// Stand-in for the provider: echoes the last payload text back in the
/// generateContent response shape and captures the request body.
async fn echo_generate(State(captured): State<Captured>, Json(body): Json<Value>) -> Json<Value> {
    let text = body["contents"]
        .as_array()
        .and_then(|contents| contents.last())
        .and_then(|content| content["parts"][0]["text"].as_str())
        .unwrap_or_default()
        .to_string();
    *captured.lock().expect("capture lock") = Some(body);
    Json(json!({
        "candidates": [{"content": {"parts": [{"text": format!("echo: {}", text)}]}}]
    }))
}

async fn empty_generate(Json(_body): Json<Value>) -> Json<Value> {
    Json(json!({"candidates": []}))
}

async fn spawn_upstream_echo() -> (SocketAddr, Captured) {
    let captured: Captured = Arc::new(Mutex::new(None));
    let app = Router::new()
        .route("/models/{model}", post(echo_generate))
        .with_state(Arc::clone(&captured));
    (spawn(app).await, captured)
}

fn proxy_args(base_url: String, api_key: &str) -> Args {
    Args {
        server_addr: "127.0.0.1:0".to_string(),
        gemini_api_key: api_key.to_string(),
        gemini_base_url: base_url,
        gemini_model: "gemini-1.5-flash-latest".to_string(),
        enable_tls: false,
        tls_cert_path: None,
        tls_key_path: None,
    }
}

async fn spawn_proxy(args: Args) -> SocketAddr {
    spawn(router(ProxyState::new(args))).await
}

#[tokio::test]
async fn full_chain_round_trip_reaches_the_provider_and_back() {
    let (upstream_addr, captured) = spawn_upstream_echo().await;
    let proxy_addr = spawn_proxy(proxy_args(format!("http://{}", upstream_addr), "test-key")).await;

    let client = Arc::new(HttpProxyClient::new(format!("http://{}/api/gemini", proxy_addr)));
    let session = ChatSession::new(client, PromptAssembler::new(DEFAULT_POLICY));

    let outcome = session.submit("What time do you open?").await;
    assert_eq!(outcome, SubmitOutcome::Completed);

    let messages = session.snapshot();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, "echo: What time do you open?");

    // The provider saw the policy preamble first, tagged as a user turn.
    let body = captured.lock().expect("capture lock").clone().expect("captured body");
    let contents = body["contents"].as_array().expect("contents array").clone();
    assert_eq!(contents[0]["role"], "user");
    assert!(
        contents[0]["parts"][0]["text"]
            .as_str()
            .expect("policy text")
            .contains("Oceanview Bistro")
    );
    assert_eq!(contents[1]["parts"][0]["text"], "What time do you open?");
}

#[tokio::test]
async fn proxy_without_key_maps_to_api_error_and_fallback() {
    let proxy_addr = spawn_proxy(proxy_args("http://127.0.0.1:1".to_string(), "")).await;
    let client = HttpProxyClient::new(format!("http://{}/api/gemini", proxy_addr));

    let payload = PromptAssembler::new(DEFAULT_POLICY).build(&[]);
    let err = client.send(&payload).await.expect_err("must fail");
    match err {
        ProxyError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "API key not configured");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // The proxy answered, so the turn settles with the no-reply text.
    let session = ChatSession::new(Arc::new(client), PromptAssembler::new(DEFAULT_POLICY));
    session.submit("hello").await;
    assert_eq!(session.snapshot()[1].content, FALLBACK_NO_REPLY);
}

#[tokio::test]
async fn unreachable_proxy_maps_to_transport_error_and_fallback() {
    // Bind to grab a free port, then drop the listener so nothing serves it.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let dead_addr = listener.local_addr().expect("local addr");
    drop(listener);

    let client = HttpProxyClient::new(format!("http://{}/api/gemini", dead_addr));
    let payload = PromptAssembler::new(DEFAULT_POLICY).build(&[]);
    assert!(matches!(client.send(&payload).await, Err(ProxyError::Transport(_))));

    let session = ChatSession::new(Arc::new(client), PromptAssembler::new(DEFAULT_POLICY));
    session.submit("anyone?").await;

    let messages = session.snapshot();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, FALLBACK_UNREACHABLE);
    assert!(!session.is_pending());
}

#[tokio::test]
async fn empty_provider_answer_maps_to_the_no_reply_fallback() {
    let upstream = Router::new().route("/models/{model}", post(empty_generate));
    let upstream_addr = spawn(upstream).await;
    let proxy_addr = spawn_proxy(proxy_args(format!("http://{}", upstream_addr), "test-key")).await;

    let client = HttpProxyClient::new(format!("http://{}/api/gemini", proxy_addr));
    let payload = PromptAssembler::new(DEFAULT_POLICY).build(&[]);
    assert!(matches!(client.send(&payload).await, Err(ProxyError::EmptyReply)));

    let session = ChatSession::new(Arc::new(client), PromptAssembler::new(DEFAULT_POLICY));
    session.submit("hello?").await;
    assert_eq!(session.snapshot()[1].content, FALLBACK_NO_REPLY);
}
