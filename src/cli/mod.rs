use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- General Azure OpenAI Target ---
    /// Azure OpenAI resource endpoint (e.g., https://my-resource.openai.azure.com)
    #[arg(long, env = "REACT_APP_AZURE_OPENAI_ENDPOINT")]
    pub azure_openai_endpoint: Option<String>,

    /// Deployment name for the general chat target
    #[arg(long, env = "REACT_APP_AZURE_OPENAI_DEPLOYMENT_NAME")]
    pub azure_openai_deployment: Option<String>,

    /// API version query parameter for the general chat target (e.g., 2024-02-15-preview)
    #[arg(long, env = "REACT_APP_AZURE_OPENAI_API_VERSION")]
    pub azure_openai_api_version: Option<String>,

    /// API key for the general chat target
    #[arg(long, env = "REACT_APP_AZURE_OPENAI_API_KEY", hide_env_values = true)]
    pub azure_openai_api_key: Option<String>,

    // --- Brokerage Azure OpenAI Target ---
    /// Azure OpenAI resource endpoint for the brokerage assistant
    #[arg(long, env = "REACT_APP_BROKERAGE_OPENAI_ENDPOINT")]
    pub brokerage_openai_endpoint: Option<String>,

    /// Deployment name for the brokerage assistant
    #[arg(long, env = "REACT_APP_BROKERAGE_OPENAI_DEPLOYMENT_NAME")]
    pub brokerage_openai_deployment: Option<String>,

    /// API version query parameter for the brokerage assistant
    #[arg(long, env = "REACT_APP_BROKERAGE_OPENAI_API_VERSION")]
    pub brokerage_openai_api_version: Option<String>,

    /// API key for the brokerage assistant
    #[arg(long, env = "REACT_APP_BROKERAGE_OPENAI_API_KEY", hide_env_values = true)]
    pub brokerage_openai_api_key: Option<String>,

    // --- Conversation Save Function ---
    /// URL of the conversation save function. Takes precedence over FN_CONVERSATIONSAVE_URL.
    #[arg(long, env = "REACT_APP_CONVERSATION_FUNCTION_URL")]
    pub conversation_function_url: Option<String>,

    /// Legacy name for the conversation save function URL.
    #[arg(long, env = "FN_CONVERSATIONSAVE_URL")]
    pub legacy_conversation_function_url: Option<String>,

    /// Function key sent as x-functions-key. Takes precedence over FN_CONVERSATIONSAVE_KEY.
    #[arg(long, env = "REACT_APP_FUNCTION_KEY", hide_env_values = true)]
    pub conversation_function_key: Option<String>,

    /// Legacy name for the conversation save function key.
    #[arg(long, env = "FN_CONVERSATIONSAVE_KEY", hide_env_values = true)]
    pub legacy_conversation_function_key: Option<String>,

    // --- Mirror Save Function (best effort) ---
    /// Optional second save function. Written after the primary succeeds; failures are only logged.
    #[arg(long, env = "CONVERSATION_SAVE_FUNCTION_URL")]
    pub mirror_function_url: Option<String>,

    /// Function key for the mirror save function.
    #[arg(long, env = "CONVERSATION_SAVE_FUNCTION_KEY", hide_env_values = true)]
    pub mirror_function_key: Option<String>,

    /// Payload layout for the mirror function (record, snapshot)
    #[arg(long, env = "CONVERSATION_SAVE_FUNCTION_LAYOUT", default_value = "snapshot")]
    pub mirror_function_layout: String,

    // --- General App Args ---
    /// Timeout in seconds for every outbound call (AI upstream and save functions).
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value = "60")]
    pub upstream_timeout_secs: u64,

    /// Deployment environment name reported by the health endpoint.
    #[arg(long, env = "NODE_ENV", default_value = "production")]
    pub environment: String,

    /// Public API base URL handed to the browser client.
    #[arg(long, env = "REACT_APP_API_URL", default_value = "")]
    pub public_api_url: String,

    /// IP address the HTTP server binds to (IPv4 or IPv6).
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port the HTTP server listens on.
    #[arg(long, env = "PORT", default_value = "3000")]
    pub http_port: u16,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}
