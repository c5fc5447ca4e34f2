use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use dowdah_accounts::crypto::envelope::EnvelopeKey;
use dowdah_accounts::domain::repository::{
    CredentialRepository, OneTimeTokenStore, RoleRepository, TaskQueue, UserRepository,
};
use dowdah_accounts::domain::types::{
    CredentialRecord, Permission, Role, TaskHandle, TaskStatus, User,
};
use dowdah_accounts::error::AccountServiceError;
use dowdah_accounts::usecase::token::TokenConfig;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-integration-tests";

pub fn test_token_config() -> TokenConfig {
    TokenConfig {
        secret: TEST_JWT_SECRET.to_owned(),
        access_ttl_secs: 3600,
        refresh_ttl_secs: 2_592_000,
    }
}

pub fn test_envelope_key() -> EnvelopeKey {
    EnvelopeKey::new(&[42u8; 32]).unwrap()
}

pub fn default_role() -> Role {
    Role {
        id: 1,
        name: "User".to_owned(),
        default: true,
        permissions: Permission::LOGIN.0
            | Permission::SELF_CHANGE_PASSWORD.0
            | Permission::SELF_CHANGE_EMAIL.0,
    }
}

pub fn test_user() -> User {
    User::new(
        "alice".to_owned(),
        "a@x.com".to_owned(),
        "unusable-hash".to_owned(),
        default_role(),
    )
}

pub fn test_credential(user_id: Uuid, credential_id: &str) -> CredentialRecord {
    CredentialRecord::new(credential_id.to_owned(), user_id, None, vec![1, 2, 3], 0)
}

// ── MockUserRepo ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockUserRepo {
    pub users: Arc<Mutex<Vec<User>>>,
}

impl MockUserRepo {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: Arc::new(Mutex::new(users)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn handle(&self) -> Arc<Mutex<Vec<User>>> {
        Arc::clone(&self.users)
    }
}

impl UserRepository for MockUserRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AccountServiceError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AccountServiceError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountServiceError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_alternative_id(
        &self,
        alternative_id: &str,
    ) -> Result<Option<User>, AccountServiceError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.alternative_id == alternative_id)
            .cloned())
    }

    async fn create(&self, user: &User) -> Result<(), AccountServiceError> {
        self.users.lock().unwrap().push(user.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>, AccountServiceError> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn ping(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), AccountServiceError> {
        if let Some(u) = self.users.lock().unwrap().iter_mut().find(|u| u.id == id) {
            u.last_seen = at;
        }
        Ok(())
    }

    async fn set_email_verified(&self, id: Uuid) -> Result<(), AccountServiceError> {
        if let Some(u) = self.users.lock().unwrap().iter_mut().find(|u| u.id == id) {
            u.email_verified = true;
        }
        Ok(())
    }

    async fn set_avatar(&self, id: Uuid, filename: &str) -> Result<(), AccountServiceError> {
        if let Some(u) = self.users.lock().unwrap().iter_mut().find(|u| u.id == id) {
            u.avatar_filename = Some(filename.to_owned());
        }
        Ok(())
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        alternative_id: &str,
    ) -> Result<(), AccountServiceError> {
        if let Some(u) = self.users.lock().unwrap().iter_mut().find(|u| u.id == id) {
            u.password_hash = password_hash.to_owned();
            u.alternative_id = alternative_id.to_owned();
        }
        Ok(())
    }
}

// ── MockRoleRepo ─────────────────────────────────────────────────────────────

pub struct MockRoleRepo {
    pub roles: Vec<Role>,
}

impl MockRoleRepo {
    pub fn with_default() -> Self {
        Self {
            roles: vec![default_role()],
        }
    }
}

impl RoleRepository for MockRoleRepo {
    async fn default_role(&self) -> Result<Option<Role>, AccountServiceError> {
        Ok(self.roles.iter().find(|r| r.default).cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Role>, AccountServiceError> {
        Ok(self.roles.iter().find(|r| r.id == id).cloned())
    }
}

// ── MockCredentialRepo ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockCredentialRepo {
    pub records: Arc<Mutex<Vec<CredentialRecord>>>,
}

impl MockCredentialRepo {
    pub fn new(records: Vec<CredentialRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn handle(&self) -> Arc<Mutex<Vec<CredentialRecord>>> {
        Arc::clone(&self.records)
    }
}

impl CredentialRepository for MockCredentialRepo {
    async fn list_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<CredentialRecord>, AccountServiceError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn count_by_user(&self, user_id: Uuid) -> Result<u64, AccountServiceError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .count() as u64)
    }

    async fn find_active(
        &self,
        credential_id: &str,
    ) -> Result<Option<CredentialRecord>, AccountServiceError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.credential_id == credential_id && !r.disabled)
            .cloned())
    }

    async fn create(&self, record: &CredentialRecord) -> Result<(), AccountServiceError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn advance_sign_count(
        &self,
        credential_id: &str,
        expected: i64,
        sign_count: i64,
        public_key: &[u8],
    ) -> Result<bool, AccountServiceError> {
        let mut records = self.records.lock().unwrap();
        match records
            .iter_mut()
            .find(|r| r.credential_id == credential_id && r.sign_count == expected)
        {
            Some(r) => {
                r.sign_count = sign_count;
                r.public_key = public_key.to_vec();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_name(
        &self,
        credential_id: &str,
        user_id: Uuid,
        name: &str,
    ) -> Result<bool, AccountServiceError> {
        let mut records = self.records.lock().unwrap();
        match records
            .iter_mut()
            .find(|r| r.credential_id == credential_id && r.user_id == user_id)
        {
            Some(r) => {
                r.name = name.to_owned();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_disabled(
        &self,
        credential_id: &str,
        user_id: Uuid,
        disabled: bool,
    ) -> Result<bool, AccountServiceError> {
        let mut records = self.records.lock().unwrap();
        match records
            .iter_mut()
            .find(|r| r.credential_id == credential_id && r.user_id == user_id)
        {
            Some(r) => {
                r.disabled = disabled;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ── MemoryTokenStore ─────────────────────────────────────────────────────────

/// In-memory stand-in for the expiring KV store.
#[derive(Clone)]
pub struct MemoryTokenStore {
    entries: Arc<Mutex<HashMap<String, (String, DateTime<Utc>)>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn live(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .filter(|(_, expires)| *expires > Utc::now())
            .map(|(value, _)| value.clone())
    }
}

impl OneTimeTokenStore for MemoryTokenStore {
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), AccountServiceError> {
        self.entries.lock().unwrap().insert(
            key.to_owned(),
            (value.to_owned(), Utc::now() + Duration::seconds(ttl_secs as i64)),
        );
        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<bool, AccountServiceError> {
        if self.live(key).is_some() {
            return Ok(false);
        }
        self.set(key, value, ttl_secs).await?;
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AccountServiceError> {
        Ok(self.live(key))
    }

    async fn delete(&self, key: &str) -> Result<(), AccountServiceError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

// ── MockTaskQueue ────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockTaskQueue {
    pub submitted: Arc<Mutex<Vec<(String, serde_json::Value, String)>>>,
}

impl MockTaskQueue {
    pub fn new() -> Self {
        Self {
            submitted: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn handle(&self) -> Arc<Mutex<Vec<(String, serde_json::Value, String)>>> {
        Arc::clone(&self.submitted)
    }
}

impl TaskQueue for MockTaskQueue {
    async fn submit(
        &self,
        kind: &str,
        payload: serde_json::Value,
        idempotency_key: &str,
    ) -> Result<TaskHandle, AccountServiceError> {
        self.submitted.lock().unwrap().push((
            kind.to_owned(),
            payload,
            idempotency_key.to_owned(),
        ));
        Ok(TaskHandle(Uuid::new_v4()))
    }

    async fn status(
        &self,
        _handle: TaskHandle,
    ) -> Result<Option<TaskStatus>, AccountServiceError> {
        Ok(Some(TaskStatus::Pending))
    }
}
