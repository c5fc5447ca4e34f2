use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::domain::types::Permission;
use crate::error::AccountServiceError;
use crate::gate::AuthContext;
use crate::handlers::account::UserResponse;
use crate::state::AppState;
use crate::usecase::account::{ChangePasswordUseCase, ExistsUseCase, ListUsersUseCase};

// ── POST /api/v1/user/exists ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ExistsRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct ExistsResponse {
    pub success: bool,
    pub code: u16,
    pub exists: bool,
}

pub async fn exists(
    State(state): State<AppState>,
    Json(body): Json<ExistsRequest>,
) -> Result<Json<ExistsResponse>, AccountServiceError> {
    let usecase = ExistsUseCase {
        users: state.user_repo(),
    };
    let exists = usecase
        .execute(body.username.as_deref(), body.email.as_deref())
        .await?;
    Ok(Json(ExistsResponse {
        success: true,
        code: 200,
        exists,
    }))
}

// ── PATCH /api/v1/user/password ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, AccountServiceError> {
    let user = ctx.require(Permission::SELF_CHANGE_PASSWORD)?;
    if body.new_password.len() < 8 {
        return Err(AccountServiceError::InvalidRequest(
            "new password must be at least 8 characters",
        ));
    }
    let usecase = ChangePasswordUseCase {
        users: state.user_repo(),
    };
    usecase
        .execute(user, body.old_password, body.new_password)
        .await?;
    // Token subject rotated: every previously issued token is now dead.
    Ok(Json(serde_json::json!({
        "success": true,
        "code": 200,
        "msg": "Password updated successfully; please log in again",
    })))
}

// ── GET /api/v1/users ────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ListUsersResponse {
    pub success: bool,
    pub code: u16,
    pub users: Vec<UserResponse>,
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<ListUsersResponse>, AccountServiceError> {
    ctx.require(Permission::VIEW_USER_INFO)?;
    let usecase = ListUsersUseCase {
        users: state.user_repo(),
    };
    let users = usecase.execute().await?;
    Ok(Json(ListUsersResponse {
        success: true,
        code: 200,
        users: users
            .iter()
            .map(|u| UserResponse::from_user(u, &state.storage.public_url))
            .collect(),
    }))
}
