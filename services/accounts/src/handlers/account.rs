use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::types::{Role, User};
use crate::error::AccountServiceError;
use crate::gate::{AuthContext, CurrentUser};
use crate::state::AppState;
use crate::usecase::account::{
    ConfirmEmailUseCase, LoginInput, LoginUseCase, RegisterInput, RegisterUseCase,
    SendVerificationUseCase,
};
use crate::usecase::token::{AuthOutput, TokenType, issue_access_token};
use crate::usecase::turnstile::VerifyChallengeUseCase;

/// User JSON returned by the API. Never carries the password hash.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub email_verified: bool,
    pub avatar_url: Option<String>,
    #[serde(serialize_with = "dowdah_core::serde::to_output_time")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "dowdah_core::serde::to_output_time")]
    pub last_seen: DateTime<Utc>,
    pub role: Role,
}

impl UserResponse {
    pub fn from_user(user: &User, public_url: &str) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            email_verified: user.email_verified,
            avatar_url: user.avatar_url(public_url),
            created_at: user.created_at,
            last_seen: user.last_seen,
            role: user.role.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub code: u16,
    pub msg: String,
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserResponse,
}

pub fn auth_response(
    out: &AuthOutput,
    status: StatusCode,
    msg: &str,
    public_url: &str,
) -> AuthResponse {
    AuthResponse {
        success: true,
        code: status.as_u16(),
        msg: msg.to_owned(),
        access_token: out.access_token.clone(),
        refresh_token: out.refresh_token.clone(),
        user: UserResponse::from_user(&out.user, public_url),
    }
}

/// Run the bot-challenge pipeline when turnstile is enabled for this deployment.
pub async fn verify_challenge_if_enabled(
    state: &AppState,
    challenge: Option<&str>,
    fingerprint: Option<&str>,
    action: &str,
) -> Result<(), AccountServiceError> {
    if !state.turnstile.enabled {
        return Ok(());
    }
    let (Some(challenge), Some(fingerprint)) = (challenge, fingerprint) else {
        return Err(AccountServiceError::InvalidRequest("missing turnstile response"));
    };
    let usecase = VerifyChallengeUseCase {
        store: state.token_store(),
        envelope: state.envelope.clone(),
        expiration_secs: state.turnstile.expiration_secs,
    };
    usecase.execute(challenge, fingerprint, Some(action)).await
}

// ── POST /api/v1/auth/register ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub challenge: Option<String>,
    pub fingerprint: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AccountServiceError> {
    verify_challenge_if_enabled(
        &state,
        body.challenge.as_deref(),
        body.fingerprint.as_deref(),
        "register",
    )
    .await?;

    let usecase = RegisterUseCase {
        users: state.user_repo(),
        roles: state.role_repo(),
        tokens: state.tokens.clone(),
    };
    let out = usecase
        .execute(RegisterInput {
            username: body.username,
            email: body.email,
            password: body.password,
        })
        .await?;

    let body = auth_response(
        &out,
        StatusCode::CREATED,
        "User created successfully",
        &state.storage.public_url,
    );
    Ok((StatusCode::CREATED, Json(body)))
}

// ── POST /api/v1/auth/login ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
    pub challenge: Option<String>,
    pub fingerprint: Option<String>,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, AccountServiceError> {
    verify_challenge_if_enabled(
        &state,
        body.challenge.as_deref(),
        body.fingerprint.as_deref(),
        "login",
    )
    .await?;

    let usecase = LoginUseCase {
        users: state.user_repo(),
        tokens: state.tokens.clone(),
    };
    let out = usecase
        .execute(LoginInput {
            username: body.username,
            email: body.email,
            password: body.password,
        })
        .await?;

    let body = auth_response(
        &out,
        StatusCode::OK,
        "Login successful",
        &state.storage.public_url,
    );
    Ok((StatusCode::OK, Json(body)))
}

// ── GET /api/v1/auth/me ──────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct MeResponse {
    pub success: bool,
    pub code: u16,
    pub user: UserResponse,
    pub token_type: Option<TokenType>,
}

pub async fn me(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MeResponse>, AccountServiceError> {
    Ok(Json(MeResponse {
        success: true,
        code: 200,
        user: UserResponse::from_user(&user, &state.storage.public_url),
        token_type: ctx.token_type,
    }))
}

// ── GET /api/v1/auth/refresh ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub code: u16,
    pub access_token: String,
    pub access_token_exp: u64,
}

pub async fn refresh_access_token(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<RefreshResponse>, AccountServiceError> {
    let (access_token, access_token_exp) = issue_access_token(&user, &state.tokens)?;
    Ok(Json(RefreshResponse {
        success: true,
        code: 200,
        access_token,
        access_token_exp,
    }))
}

// ── POST /api/v1/auth/send-verification ──────────────────────────────────────

#[derive(Serialize)]
pub struct SendVerificationResponse {
    pub success: bool,
    pub code: u16,
    pub msg: String,
    pub task_id: Uuid,
}

pub async fn send_verification(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<SendVerificationResponse>, AccountServiceError> {
    let usecase = SendVerificationUseCase {
        store: state.token_store(),
        tasks: state.task_queue(),
    };
    let handle = usecase.execute(&user).await?;
    Ok(Json(SendVerificationResponse {
        success: true,
        code: 200,
        msg: "Verification code sent".to_owned(),
        task_id: handle.0,
    }))
}

// ── POST /api/v1/auth/confirm-email ──────────────────────────────────────────

#[derive(Deserialize)]
pub struct ConfirmEmailRequest {
    pub code: String,
}

pub async fn confirm_email(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<ConfirmEmailRequest>,
) -> Result<Json<serde_json::Value>, AccountServiceError> {
    let usecase = ConfirmEmailUseCase {
        users: state.user_repo(),
        store: state.token_store(),
    };
    usecase.execute(&user, &body.code).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "code": 200,
        "msg": "Email verified successfully",
    })))
}
