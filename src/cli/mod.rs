use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Host address and port for the relay server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    // --- Upstream Assistant Args ---
    /// Base URL of the upstream assistant API (e.g., https://api.dify.ai)
    #[arg(long, env = "ASSISTANT_BASE_URL", default_value = "https://api.dify.ai")]
    pub assistant_base_url: String,

    /// API key for the upstream assistant. If unset the server still starts;
    /// every chat request is rejected with a configuration error instead.
    #[arg(long, env = "ASSISTANT_API_KEY")]
    pub assistant_api_key: Option<String>,

    /// User id forwarded to the upstream API when a request carries none.
    #[arg(long, env = "DEFAULT_USER_ID", default_value = "portal-user")]
    pub default_user_id: String,

    // --- TLS Args ---
    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}
