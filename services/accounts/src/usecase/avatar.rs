use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::crypto::envelope::EnvelopeKey;
use crate::domain::repository::{TaskQueue, UserRepository};
use crate::domain::types::{ALLOWED_AVATAR_EXTENSIONS, MAX_AVATAR_SIZE, User};
use crate::error::AccountServiceError;

/// Object-storage settings shared with the edge proxy.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Public base URL objects are served from.
    pub public_url: String,
    /// Upload proxy endpoint, if deployed.
    pub proxy: Option<String>,
    /// Validity window of sealed upload parameters in seconds.
    pub param_ttl_secs: i64,
}

/// Upload descriptor sealed into an envelope. The storage proxy trusts only
/// these parameters, never the client's own claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadParams {
    pub expires: i64,
    pub key: String,
    pub mime_type: String,
    pub method: String,
    pub max_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_avatar_key: Option<String>,
}

fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "image/gif",
    }
}

// ── Upload params ────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct UploadAvatarOutput {
    pub params: String,
    pub proxy: Option<String>,
    pub new_avatar_url: String,
}

pub struct UploadAvatarUseCase {
    pub envelope: EnvelopeKey,
    pub storage: StorageConfig,
}

impl UploadAvatarUseCase {
    pub fn execute(
        &self,
        user: &User,
        extension: &str,
    ) -> Result<UploadAvatarOutput, AccountServiceError> {
        let ext = extension.to_ascii_lowercase();
        if !ALLOWED_AVATAR_EXTENSIONS.contains(&ext.as_str()) {
            return Err(AccountServiceError::InvalidRequest(
                "invalid file extension; valid extensions: jpg, jpeg, png, gif",
            ));
        }

        let now = Utc::now().timestamp();
        let key = format!("{}/avatar_{now}.{ext}", user.storage_uuid);
        let params = UploadParams {
            expires: now + self.storage.param_ttl_secs,
            key: key.clone(),
            mime_type: mime_for_extension(&ext).to_owned(),
            method: "avatar".to_owned(),
            max_size: MAX_AVATAR_SIZE,
            previous_avatar_key: user
                .avatar_filename
                .as_ref()
                .map(|f| format!("{}/{f}", user.storage_uuid)),
        };

        Ok(UploadAvatarOutput {
            params: self.envelope.seal_json(&params)?,
            proxy: self.storage.proxy.clone(),
            new_avatar_url: format!("{}/{key}", self.storage.public_url),
        })
    }
}

// ── Confirm uploaded avatar ──────────────────────────────────────────────────

pub struct ConfirmAvatarUseCase<U, T>
where
    U: UserRepository,
    T: TaskQueue,
{
    pub users: U,
    pub tasks: T,
    pub envelope: EnvelopeKey,
}

impl<U, T> ConfirmAvatarUseCase<U, T>
where
    U: UserRepository,
    T: TaskQueue,
{
    /// The storage proxy returns the object key sealed, so the client can
    /// only confirm keys the server minted for it.
    pub async fn execute(
        &self,
        user: &User,
        sealed_key: &str,
    ) -> Result<(), AccountServiceError> {
        let key = self.envelope.open_str(sealed_key)?;
        let Some((prefix, filename)) = key.split_once('/') else {
            return Err(AccountServiceError::InvalidEnvelope);
        };
        if filename.is_empty() || filename.contains('/') {
            return Err(AccountServiceError::InvalidEnvelope);
        }
        if prefix != user.storage_uuid {
            return Err(AccountServiceError::MismatchedBinding("storage namespace"));
        }

        self.users.set_avatar(user.id, filename).await?;

        // The replaced object is orphaned; deletion happens off the request path.
        if let Some(previous) = &user.avatar_filename {
            let submission_id = Uuid::new_v4();
            self.tasks
                .submit(
                    "storage_delete",
                    json!({ "key": format!("{}/{previous}", user.storage_uuid) }),
                    &format!("storage_delete:{submission_id}"),
                )
                .await?;
        }
        Ok(())
    }
}
