use std::sync::Arc;

use deadpool_redis::Pool as RedisPool;
use sea_orm::DatabaseConnection;
use webauthn_rs::Webauthn;

use crate::crypto::envelope::EnvelopeKey;
use crate::infra::cache::RedisOneTimeTokenStore;
use crate::infra::db::{DbCredentialRepository, DbRoleRepository, DbUserRepository};
use crate::infra::tasks::DbTaskQueue;
use crate::usecase::avatar::StorageConfig;
use crate::usecase::token::TokenConfig;

/// Bot-challenge settings.
#[derive(Debug, Clone)]
pub struct TurnstileSettings {
    pub enabled: bool,
    pub expiration_secs: i64,
}

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: RedisPool,
    pub webauthn: Arc<Webauthn>,
    pub envelope: EnvelopeKey,
    pub tokens: TokenConfig,
    pub turnstile: TurnstileSettings,
    pub storage: StorageConfig,
    pub max_credentials_per_user: u64,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn role_repo(&self) -> DbRoleRepository {
        DbRoleRepository {
            db: self.db.clone(),
        }
    }

    pub fn credential_repo(&self) -> DbCredentialRepository {
        DbCredentialRepository {
            db: self.db.clone(),
        }
    }

    pub fn token_store(&self) -> RedisOneTimeTokenStore {
        RedisOneTimeTokenStore {
            pool: self.redis.clone(),
        }
    }

    pub fn task_queue(&self) -> DbTaskQueue {
        DbTaskQueue {
            db: self.db.clone(),
        }
    }
}
