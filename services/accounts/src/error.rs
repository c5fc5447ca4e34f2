use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Accounts service domain error variants.
///
/// Verification pipelines stop at the first failing check, so the variant a
/// caller sees identifies exactly one rejection reason; the HTTP body stays
/// uniform (`{success, code, msg}`).
#[derive(Debug, thiserror::Error)]
pub enum AccountServiceError {
    #[error("{0}")]
    Unauthenticated(&'static str),
    #[error("token has expired")]
    TokenExpired,
    #[error("insufficient permissions")]
    Forbidden,
    #[error("refresh token is not allowed for this endpoint")]
    RefreshNotAllowed,
    #[error("user already exists")]
    Conflict,
    #[error("{0} has already been used")]
    Replayed(&'static str),
    #[error("{0} has expired")]
    Expired(&'static str),
    #[error("{0} mismatch")]
    MismatchedBinding(&'static str),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("invalid envelope")]
    InvalidEnvelope,
    #[error("signature counter regression")]
    CloneDetected,
    #[error("too many credentials registered")]
    TooManyCredentials,
    #[error("invalid credential")]
    InvalidCredential,
    #[error("{0}")]
    InvalidRequest(&'static str),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AccountServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::Forbidden => "FORBIDDEN",
            Self::RefreshNotAllowed => "REFRESH_NOT_ALLOWED",
            Self::Conflict => "CONFLICT",
            Self::Replayed(_) => "REPLAYED",
            Self::Expired(_) => "EXPIRED",
            Self::MismatchedBinding(_) => "MISMATCHED_BINDING",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidEnvelope => "INVALID_ENVELOPE",
            Self::CloneDetected => "CLONE_DETECTED",
            Self::TooManyCredentials => "TOO_MANY_CREDENTIALS",
            Self::InvalidCredential => "INVALID_CREDENTIAL",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) | Self::TokenExpired => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::RefreshNotAllowed => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // The remaining domain rejections (Conflict included) surface as
            // a uniform 400 at the HTTP boundary.
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AccountServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Log 500s only — tower-http TraceLayer already records method/uri/status for all
        // requests. 4xx are expected client errors; logging them here would be noise.
        // Internal errors need the anyhow chain logged so the root cause is traceable.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "success": false,
            "code": status.as_u16(),
            "msg": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
