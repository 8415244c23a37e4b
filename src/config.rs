use crate::interfaces::http::signature::DEFAULT_TOLERANCE_SECS;
use clap::Parser;
use std::path::PathBuf;

/// Webhook service keeping purchases and course enrollment in sync with the
/// payment and identity providers.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Secret API key used to look up checkout sessions.
    #[arg(long, env = "STRIPE_SECRET_KEY", hide_env_values = true)]
    pub stripe_secret_key: String,

    /// Signing secret of the payment webhook endpoint.
    #[arg(long, env = "STRIPE_WEBHOOK_SECRET", hide_env_values = true)]
    pub stripe_webhook_secret: String,

    /// Signing secret (`whsec_<base64>`) of the identity webhook endpoint.
    #[arg(long, env = "CLERK_WEBHOOK_SECRET", hide_env_values = true)]
    pub clerk_webhook_secret: String,

    #[arg(long, env = "STRIPE_API_BASE", default_value = "https://api.stripe.com")]
    pub stripe_api_base: String,

    /// Upper bound, in seconds, on a checkout-session lookup.
    #[arg(long, env = "STRIPE_TIMEOUT_SECS", default_value_t = 10)]
    pub stripe_timeout_secs: u64,

    /// Maximum age, in seconds, of a signed webhook timestamp.
    #[arg(long, env = "SIGNATURE_TOLERANCE_SECS", default_value_t = DEFAULT_TOLERANCE_SECS)]
    pub signature_tolerance_secs: u64,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// JSON file with users, courses and purchases to load at startup.
    #[arg(long)]
    pub seed: Option<PathBuf>,
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
