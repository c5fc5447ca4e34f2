use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use uuid::Uuid;

/// Named permission bits. `ADMIN` is a super-bit: a role holding it passes
/// every permission check without the individual bits being set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Permission(pub i32);

impl Permission {
    pub const LOGIN: Permission = Permission(1);
    pub const SELF_CHANGE_PASSWORD: Permission = Permission(2);
    pub const SELF_CHANGE_EMAIL: Permission = Permission(4);
    pub const VIEW_USER_INFO: Permission = Permission(8);
    pub const MODIFY_USER_INFO: Permission = Permission(16);
    pub const DEL_USER: Permission = Permission(32);
    pub const MANAGE_PERMISSIONS: Permission = Permission(64);
    pub const BACKUP_DATA: Permission = Permission(128);
    pub const RESTORE_DATA: Permission = Permission(256);
    pub const ADD_USER: Permission = Permission(512);
    pub const ADMIN: Permission = Permission(1024);
}

/// Role with its permission bitmask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Role {
    pub id: i32,
    pub name: String,
    pub default: bool,
    pub permissions: i32,
}

impl Role {
    pub fn has_permission(&self, perm: Permission) -> bool {
        // ADMIN short-circuits before the bitwise check.
        if self.permissions & Permission::ADMIN.0 == Permission::ADMIN.0 {
            return true;
        }
        self.permissions & perm.0 == perm.0
    }

    pub fn add_permission(&mut self, perm: Permission) {
        if !self.has_permission(perm) {
            self.permissions |= perm.0;
        }
    }

    pub fn remove_permission(&mut self, perm: Permission) {
        self.permissions &= !perm.0;
    }

    pub fn reset_permissions(&mut self) {
        self.permissions = 0;
    }
}

/// Generate an opaque 32-hex-char identifier (alternative IDs, storage prefixes).
pub fn generate_opaque_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Account as seen by the usecases (role resolved).
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Token subject; regenerated on password change to revoke outstanding tokens.
    pub alternative_id: String,
    /// Namespace prefix for the user's object-storage keys.
    pub storage_uuid: String,
    pub avatar_filename: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub email_verified: bool,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl User {
    /// Create a new account with generated opaque identifiers and the given role.
    pub fn new(username: String, email: String, password_hash: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            alternative_id: generate_opaque_id(),
            storage_uuid: generate_opaque_id(),
            avatar_filename: None,
            password_hash,
            role,
            email_verified: false,
            comments: None,
            created_at: now,
            last_seen: now,
        }
    }

    pub fn can(&self, perm: Permission) -> bool {
        self.role.has_permission(perm)
    }

    pub fn avatar_url(&self, public_url: &str) -> Option<String> {
        self.avatar_filename
            .as_ref()
            .map(|name| format!("{public_url}/{}/{name}", self.storage_uuid))
    }
}

/// Stored WebAuthn credential.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    /// Base64url credential ID — the external lookup key.
    pub credential_id: String,
    pub user_id: Uuid,
    pub name: String,
    /// Serialized `webauthn_rs::Passkey`.
    pub public_key: Vec<u8>,
    pub sign_count: i64,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Create a credential record after a successful registration ceremony.
    /// An unset name defaults to "New Authenticator <creation-timestamp>".
    pub fn new(
        credential_id: String,
        user_id: Uuid,
        name: Option<String>,
        public_key: Vec<u8>,
        sign_count: i64,
    ) -> Self {
        let now = Utc::now();
        let name = name.unwrap_or_else(|| {
            format!(
                "New Authenticator {}",
                now.format(dowdah_core::serde::OUTPUT_TIME_FORMAT)
            )
        });
        Self {
            credential_id,
            user_id,
            name,
            public_key,
            sign_count,
            disabled: false,
            created_at: now,
        }
    }
}

/// Handle returned by the async task collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskHandle(pub Uuid);

/// Task state derivable by handle ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Processed,
    Failed,
}

pub static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
});

/// Bot-challenge validity window in seconds.
pub const TURNSTILE_EXPIRATION_SECS: i64 = 300;

/// Email verification code length (digits) and TTL.
pub const EMAIL_CODE_LEN: usize = 6;
pub const EMAIL_CODE_TTL_SECS: u64 = 600;

/// Sealed WebAuthn ceremony state validity window in seconds.
pub const CEREMONY_TTL_SECS: i64 = 300;

/// Default cap on credentials per user (config-overridable).
pub const MAX_CREDENTIALS_PER_USER: u64 = 5;

/// Avatar upload constraints.
pub const ALLOWED_AVATAR_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];
pub const MAX_AVATAR_SIZE: u64 = 5 * 1024 * 1024;
