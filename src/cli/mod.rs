use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Host and port the proxy listens on (e.g., 127.0.0.1:4000)
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    // --- Provider Args ---
    /// API key for the Gemini provider. Held here so the widget side never sees it.
    #[arg(long, env = "GEMINI_API_KEY", default_value = "")]
    pub gemini_api_key: String,

    /// Base URL for the Gemini provider API
    #[arg(long, env = "GEMINI_BASE_URL", default_value = "https://generativelanguage.googleapis.com/v1beta")]
    pub gemini_base_url: String,

    /// Model name for chat completion
    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-1.5-flash-latest")]
    pub gemini_model: String,

    // --- TLS Args ---
    /// Enable TLS for the proxy server. Requires --tls-cert-path and --tls-key-path.
    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,

    /// Path to the TLS certificate file (PEM format)
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Path to the TLS private key file (PEM format)
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,
}
