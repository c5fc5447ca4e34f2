use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use webauthn_rs::prelude::{
    CreationChallengeResponse, PublicKeyCredential, RegisterPublicKeyCredential,
    RequestChallengeResponse,
};

use crate::domain::types::CredentialRecord;
use crate::error::AccountServiceError;
use crate::gate::CurrentUser;
use crate::handlers::account::auth_response;
use crate::state::AppState;
use crate::usecase::webauthn::{
    FinishAuthenticationUseCase, FinishRegistrationUseCase, ListCredentialsUseCase,
    StartAuthenticationUseCase, StartRegistrationUseCase, UpdateCredentialUseCase,
};

#[derive(Serialize)]
pub struct AuthenticatorResponse {
    pub credential_id: String,
    pub name: String,
    pub sign_count: i64,
    pub disabled: bool,
    #[serde(serialize_with = "dowdah_core::serde::to_output_time")]
    pub created_at: DateTime<Utc>,
}

impl From<CredentialRecord> for AuthenticatorResponse {
    fn from(record: CredentialRecord) -> Self {
        Self {
            credential_id: record.credential_id,
            name: record.name,
            sign_count: record.sign_count,
            disabled: record.disabled,
            created_at: record.created_at,
        }
    }
}

// ── GET /api/v1/webauthn/my-authenticators ───────────────────────────────────

#[derive(Serialize)]
pub struct MyAuthenticatorsResponse {
    pub success: bool,
    pub code: u16,
    pub authenticators: Vec<AuthenticatorResponse>,
}

pub async fn my_authenticators(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MyAuthenticatorsResponse>, AccountServiceError> {
    let usecase = ListCredentialsUseCase {
        credentials: state.credential_repo(),
    };
    let records = usecase.execute(user.id).await?;
    Ok(Json(MyAuthenticatorsResponse {
        success: true,
        code: 200,
        authenticators: records.into_iter().map(Into::into).collect(),
    }))
}

// ── GET /api/v1/webauthn/register/begin ──────────────────────────────────────

#[derive(Serialize)]
pub struct RegisterBeginResponse {
    pub success: bool,
    pub code: u16,
    pub options: CreationChallengeResponse,
    /// Sealed ceremony state; echo back on complete.
    pub state: String,
}

pub async fn register_begin(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<RegisterBeginResponse>, AccountServiceError> {
    let usecase = StartRegistrationUseCase {
        credentials: state.credential_repo(),
        webauthn: state.webauthn.clone(),
        envelope: state.envelope.clone(),
        max_credentials: state.max_credentials_per_user,
    };
    let out = usecase.execute(&user).await?;
    Ok(Json(RegisterBeginResponse {
        success: true,
        code: 200,
        options: out.options,
        state: out.state,
    }))
}

// ── POST /api/v1/webauthn/register/complete ──────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterCompleteRequest {
    pub state: String,
    pub credential: RegisterPublicKeyCredential,
    pub name: Option<String>,
}

pub async fn register_complete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<RegisterCompleteRequest>,
) -> Result<impl IntoResponse, AccountServiceError> {
    let usecase = FinishRegistrationUseCase {
        credentials: state.credential_repo(),
        webauthn: state.webauthn.clone(),
        envelope: state.envelope.clone(),
    };
    let record = usecase
        .execute(&user, &body.state, body.name, &body.credential)
        .await?;
    let body = serde_json::json!({
        "success": true,
        "code": 201,
        "msg": "Registration successful",
        "authenticator": AuthenticatorResponse::from(record),
    });
    Ok((StatusCode::CREATED, Json(body)))
}

// ── GET /api/v1/webauthn/login/begin ─────────────────────────────────────────

#[derive(Serialize)]
pub struct LoginBeginResponse {
    pub success: bool,
    pub code: u16,
    pub options: RequestChallengeResponse,
    pub state: String,
}

pub async fn login_begin(
    State(state): State<AppState>,
) -> Result<Json<LoginBeginResponse>, AccountServiceError> {
    let usecase = StartAuthenticationUseCase {
        webauthn: state.webauthn.clone(),
        envelope: state.envelope.clone(),
    };
    let out = usecase.execute()?;
    Ok(Json(LoginBeginResponse {
        success: true,
        code: 200,
        options: out.options,
        state: out.state,
    }))
}

// ── POST /api/v1/webauthn/login/complete ─────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginCompleteRequest {
    pub state: String,
    pub credential: PublicKeyCredential,
}

pub async fn login_complete(
    State(state): State<AppState>,
    Json(body): Json<LoginCompleteRequest>,
) -> Result<impl IntoResponse, AccountServiceError> {
    let usecase = FinishAuthenticationUseCase {
        users: state.user_repo(),
        credentials: state.credential_repo(),
        webauthn: state.webauthn.clone(),
        envelope: state.envelope.clone(),
        tokens: state.tokens.clone(),
    };
    let out = usecase.execute(&body.state, &body.credential).await?;
    let body = auth_response(
        &out,
        StatusCode::OK,
        "Login successful",
        &state.storage.public_url,
    );
    Ok((StatusCode::OK, Json(body)))
}

// ── PATCH /api/v1/webauthn/authenticators/{credential_id} ────────────────────

#[derive(Deserialize)]
pub struct UpdateAuthenticatorRequest {
    pub name: Option<String>,
    pub disabled: Option<bool>,
}

pub async fn update_authenticator(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(credential_id): Path<String>,
    Json(body): Json<UpdateAuthenticatorRequest>,
) -> Result<Json<serde_json::Value>, AccountServiceError> {
    let usecase = UpdateCredentialUseCase {
        credentials: state.credential_repo(),
    };
    usecase
        .execute(user.id, &credential_id, body.name.as_deref(), body.disabled)
        .await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "code": 200,
        "msg": "Authenticator updated",
    })))
}
