pub mod cli;
pub mod config;
pub mod conversation;
pub mod models;
pub mod prompt;
pub mod proxy;
pub mod server;
pub mod session;

pub use config::policy::{ load_policy, PolicyError, DEFAULT_POLICY };
pub use conversation::{ ConversationStore, ValidationError };
pub use models::chat::{ Message, Role, SessionView };
pub use prompt::{ PayloadContent, PayloadPart, PromptAssembler, PromptPayload };
pub use proxy::{ HttpProxyClient, ProxyClient, ProxyError };
pub use session::{
    ChatSession,
    RequestState,
    SubmitOutcome,
    FALLBACK_NO_REPLY,
    FALLBACK_UNREACHABLE,
};

use cli::Args;
use log::info;
use server::Server;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Proxy Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Gemini Base URL: {}", args.gemini_base_url);
    info!("Gemini Model: {}", args.gemini_model);
    info!("API Key Configured: {}", !args.gemini_api_key.is_empty());
    info!("TLS Enabled: {}", args.enable_tls);
    info!("---------------------------");

    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, args);
    server.run().await?;

    Ok(())
}
