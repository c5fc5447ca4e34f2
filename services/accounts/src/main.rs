use std::sync::Arc;

use sea_orm::Database;
use tracing::info;
use url::Url;
use webauthn_rs::prelude::WebauthnBuilder;

use dowdah_accounts::config::AccountsConfig;
use dowdah_accounts::crypto::envelope::EnvelopeKey;
use dowdah_accounts::router::build_router;
use dowdah_accounts::state::{AppState, TurnstileSettings};
use dowdah_accounts::usecase::avatar::StorageConfig;
use dowdah_accounts::usecase::token::TokenConfig;

#[tokio::main]
async fn main() {
    dowdah_core::tracing::init_tracing();

    let config = AccountsConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let redis_cfg = deadpool_redis::Config::from_url(&config.redis_url);
    let redis = redis_cfg
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .expect("failed to create Redis pool");

    let rp_origin = Url::parse(&config.origin()).expect("invalid origin");
    let webauthn = WebauthnBuilder::new(&config.domain, &rp_origin)
        .expect("invalid WebAuthn configuration")
        .rp_name(&config.site_name)
        .build()
        .expect("failed to build Webauthn");

    let envelope =
        EnvelopeKey::new(config.envelope_secret.as_bytes()).expect("invalid ENVELOPE_SECRET");

    let state = AppState {
        db,
        redis,
        webauthn: Arc::new(webauthn),
        envelope,
        tokens: TokenConfig {
            secret: config.jwt_secret,
            access_ttl_secs: config.access_token_ttl_secs,
            refresh_ttl_secs: config.refresh_token_ttl_secs,
        },
        turnstile: TurnstileSettings {
            enabled: config.turnstile_enabled,
            expiration_secs: config.turnstile_expiration_secs,
        },
        storage: StorageConfig {
            public_url: config.storage_public_url,
            proxy: config.storage_proxy,
            param_ttl_secs: config.storage_param_ttl_secs,
        },
        max_credentials_per_user: config.max_credentials_per_user,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.accounts_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("accounts service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
