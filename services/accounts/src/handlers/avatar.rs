use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use crate::error::AccountServiceError;
use crate::gate::CurrentUser;
use crate::state::AppState;
use crate::usecase::avatar::{ConfirmAvatarUseCase, UploadAvatarUseCase};

// ── GET /api/v1/storage/upload-avatar?ext={ext} ──────────────────────────────

#[derive(Deserialize)]
pub struct UploadAvatarQuery {
    pub ext: Option<String>,
}

#[derive(Serialize)]
pub struct UploadAvatarResponse {
    pub success: bool,
    pub code: u16,
    /// Sealed upload descriptor for the storage proxy.
    pub params: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    pub new_avatar_url: String,
}

pub async fn upload_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<UploadAvatarQuery>,
) -> Result<Json<UploadAvatarResponse>, AccountServiceError> {
    let ext = query
        .ext
        .ok_or(AccountServiceError::InvalidRequest("missing file extension"))?;
    let usecase = UploadAvatarUseCase {
        envelope: state.envelope.clone(),
        storage: state.storage.clone(),
    };
    let out = usecase.execute(&user, &ext)?;
    Ok(Json(UploadAvatarResponse {
        success: true,
        code: 200,
        params: out.params,
        proxy: out.proxy,
        new_avatar_url: out.new_avatar_url,
    }))
}

// ── POST /api/v1/storage/confirm-new-avatar ──────────────────────────────────

#[derive(Deserialize)]
pub struct ConfirmAvatarRequest {
    /// Sealed object key returned by the storage proxy after upload.
    pub key: String,
}

pub async fn confirm_new_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<ConfirmAvatarRequest>,
) -> Result<Json<serde_json::Value>, AccountServiceError> {
    let usecase = ConfirmAvatarUseCase {
        users: state.user_repo(),
        tasks: state.task_queue(),
        envelope: state.envelope.clone(),
    };
    usecase.execute(&user, &body.key).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "code": 200,
        "msg": "Avatar updated successfully",
    })))
}
