#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::types::{CredentialRecord, Role, TaskHandle, TaskStatus, User};
use crate::error::AccountServiceError;

/// Repository for user accounts.
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AccountServiceError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AccountServiceError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountServiceError>;
    async fn find_by_alternative_id(
        &self,
        alternative_id: &str,
    ) -> Result<Option<User>, AccountServiceError>;

    async fn create(&self, user: &User) -> Result<(), AccountServiceError>;
    async fn list(&self) -> Result<Vec<User>, AccountServiceError>;

    /// Update `last_seen` for an authenticated request.
    async fn ping(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), AccountServiceError>;

    async fn set_email_verified(&self, id: Uuid) -> Result<(), AccountServiceError>;
    async fn set_avatar(&self, id: Uuid, filename: &str) -> Result<(), AccountServiceError>;

    /// Replace the password hash and the alternative ID in one write.
    /// Rotating the alternative ID revokes every outstanding token.
    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        alternative_id: &str,
    ) -> Result<(), AccountServiceError>;
}

/// Repository for roles.
pub trait RoleRepository: Send + Sync {
    /// The role assigned to users created without an explicit role.
    async fn default_role(&self) -> Result<Option<Role>, AccountServiceError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<Role>, AccountServiceError>;
}

/// Repository for WebAuthn credentials.
pub trait CredentialRepository: Send + Sync {
    async fn list_by_user(&self, user_id: Uuid)
    -> Result<Vec<CredentialRecord>, AccountServiceError>;

    async fn count_by_user(&self, user_id: Uuid) -> Result<u64, AccountServiceError>;

    /// Look up a non-disabled credential by its base64url ID.
    async fn find_active(
        &self,
        credential_id: &str,
    ) -> Result<Option<CredentialRecord>, AccountServiceError>;

    async fn create(&self, record: &CredentialRecord) -> Result<(), AccountServiceError>;

    /// Conditionally persist the post-assertion counter and updated
    /// credential blob. Succeeds only while the stored counter still equals
    /// `expected`; returns `false` when a concurrent assertion won the write.
    async fn advance_sign_count(
        &self,
        credential_id: &str,
        expected: i64,
        sign_count: i64,
        public_key: &[u8],
    ) -> Result<bool, AccountServiceError>;

    /// Rename a credential. Returns `false` if not found or owned by someone else.
    async fn set_name(
        &self,
        credential_id: &str,
        user_id: Uuid,
        name: &str,
    ) -> Result<bool, AccountServiceError>;

    /// Enable/disable a credential. Returns `false` if not found or owned by someone else.
    async fn set_disabled(
        &self,
        credential_id: &str,
        user_id: Uuid,
        disabled: bool,
    ) -> Result<bool, AccountServiceError>;
}

/// Expiring key-value store used for one-time tokens (email codes, replay markers).
///
/// `set_if_absent` must be atomic: two concurrent consumers of the same key
/// cannot both observe success.
pub trait OneTimeTokenStore: Send + Sync {
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), AccountServiceError>;

    /// Atomic SET-if-absent with TTL. Returns `true` when this caller set the key.
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<bool, AccountServiceError>;

    async fn get(&self, key: &str) -> Result<Option<String>, AccountServiceError>;

    async fn delete(&self, key: &str) -> Result<(), AccountServiceError>;
}

/// Fire-and-forget task submission (emails, storage deletions).
/// Delivery ordering and completion before the response are not guaranteed.
pub trait TaskQueue: Send + Sync {
    async fn submit(
        &self,
        kind: &str,
        payload: serde_json::Value,
        idempotency_key: &str,
    ) -> Result<TaskHandle, AccountServiceError>;

    async fn status(&self, handle: TaskHandle)
    -> Result<Option<TaskStatus>, AccountServiceError>;
}
