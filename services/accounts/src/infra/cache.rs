use deadpool_redis::Pool;
use deadpool_redis::redis::{AsyncCommands, ExistenceCheck, SetExpiry, SetOptions};

use crate::domain::repository::OneTimeTokenStore;
use crate::error::AccountServiceError;

/// One-time-token store backed by Redis (email codes, replay markers).
#[derive(Clone)]
pub struct RedisOneTimeTokenStore {
    pub pool: Pool,
}

impl RedisOneTimeTokenStore {
    async fn conn(&self) -> Result<deadpool_redis::Connection, AccountServiceError> {
        self.pool
            .get()
            .await
            .map_err(|e| AccountServiceError::Internal(e.into()))
    }
}

impl OneTimeTokenStore for RedisOneTimeTokenStore {
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), AccountServiceError> {
        let mut conn = self.conn().await?;
        let (): () = conn
            .set_ex(key, value, ttl_secs)
            .await
            .map_err(|e: deadpool_redis::redis::RedisError| AccountServiceError::Internal(e.into()))?;
        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<bool, AccountServiceError> {
        let mut conn = self.conn().await?;
        // Single SET NX EX round-trip; this is the atomicity the replay
        // guard relies on.
        let opts = SetOptions::default()
            .conditional_set(ExistenceCheck::NX)
            .with_expiration(SetExpiry::EX(ttl_secs));
        let set: Option<String> = conn
            .set_options(key, value, opts)
            .await
            .map_err(|e| AccountServiceError::Internal(e.into()))?;
        Ok(set.is_some())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AccountServiceError> {
        let mut conn = self.conn().await?;
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| AccountServiceError::Internal(e.into()))?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> Result<(), AccountServiceError> {
        let mut conn = self.conn().await?;
        let (): () = conn
            .del(key)
            .await
            .map_err(|e: deadpool_redis::redis::RedisError| AccountServiceError::Internal(e.into()))?;
        Ok(())
    }
}
