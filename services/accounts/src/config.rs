/// Accounts service configuration loaded from environment variables.
#[derive(Debug)]
pub struct AccountsConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Redis connection URL.
    pub redis_url: String,
    /// HMAC secret for signing JWT access and refresh tokens.
    pub jwt_secret: String,
    /// 32-byte AEAD secret for sealed envelopes. Env var: `ENVELOPE_SECRET`.
    pub envelope_secret: String,
    /// Site domain, also the WebAuthn relying-party ID (e.g. "example.com").
    pub domain: String,
    /// Human-readable site name, also the WebAuthn relying-party name.
    pub site_name: String,
    /// Whether the deployment is served over TLS (origin scheme). Default true.
    pub use_ssl: bool,
    /// Public base URL for stored objects (avatars).
    pub storage_public_url: String,
    /// Optional upload proxy endpoint handed to clients.
    pub storage_proxy: Option<String>,
    /// Sealed upload-parameter validity in seconds (default 600).
    pub storage_param_ttl_secs: i64,
    /// TCP port to listen on (default 3113). Env var: `ACCOUNTS_PORT`.
    pub accounts_port: u16,
    /// Access-token lifetime in seconds (default 3600).
    pub access_token_ttl_secs: u64,
    /// Refresh-token lifetime in seconds (default 30 days).
    pub refresh_token_ttl_secs: u64,
    /// Whether register/login require a bot-challenge envelope. Default false.
    pub turnstile_enabled: bool,
    /// Bot-challenge validity window in seconds (default 300).
    pub turnstile_expiration_secs: i64,
    /// Cap on WebAuthn credentials per user (default 5).
    pub max_credentials_per_user: u64,
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "on" | "1"))
        .unwrap_or(default)
}

impl AccountsConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            redis_url: std::env::var("REDIS_URL").expect("REDIS_URL"),
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET"),
            envelope_secret: std::env::var("ENVELOPE_SECRET").expect("ENVELOPE_SECRET"),
            domain: std::env::var("DOMAIN").expect("DOMAIN"),
            site_name: std::env::var("SITE_NAME").expect("SITE_NAME"),
            use_ssl: env_bool("USE_SSL", true),
            storage_public_url: std::env::var("STORAGE_PUBLIC_URL").expect("STORAGE_PUBLIC_URL"),
            storage_proxy: std::env::var("STORAGE_PROXY").ok(),
            storage_param_ttl_secs: env_parsed("STORAGE_PARAM_TTL_SECS", 600),
            accounts_port: env_parsed("ACCOUNTS_PORT", 3113),
            access_token_ttl_secs: env_parsed("ACCESS_TOKEN_TTL_SECS", 3600),
            refresh_token_ttl_secs: env_parsed("REFRESH_TOKEN_TTL_SECS", 2_592_000),
            turnstile_enabled: env_bool("TURNSTILE_ENABLED", false),
            turnstile_expiration_secs: env_parsed(
                "TURNSTILE_EXPIRATION_SECS",
                crate::domain::types::TURNSTILE_EXPIRATION_SECS,
            ),
            max_credentials_per_user: env_parsed(
                "MAX_WEBAUTHN_CREDENTIALS",
                crate::domain::types::MAX_CREDENTIALS_PER_USER,
            ),
        }
    }

    /// Origin the WebAuthn ceremonies expect, scheme chosen by `use_ssl`.
    pub fn origin(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{scheme}://{}", self.domain)
    }
}
