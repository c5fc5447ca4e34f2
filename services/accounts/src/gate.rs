//! Authorization gate: per-request identity resolution plus the layered
//! allow-list state machine, evaluated before any handler runs.

use axum::extract::{MatchedPath, Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;

use crate::domain::repository::UserRepository;
use crate::domain::types::{Permission, User};
use crate::error::AccountServiceError;
use crate::state::AppState;
use crate::usecase::token::{TokenType, validate_token};

/// Operations reachable without a credential.
const PUBLIC_ROUTES: &[(&str, &str)] = &[
    ("POST", "/api/v1/auth/register"),
    ("POST", "/api/v1/auth/login"),
    ("GET", "/api/v1/webauthn/login/begin"),
    ("POST", "/api/v1/webauthn/login/complete"),
];

/// Operations a refresh token may authorize — and the only operations that
/// accept a refresh token.
const REFRESH_ROUTES: &[(&str, &str)] = &[("GET", "/api/v1/auth/refresh")];

fn route_in(routes: &[(&str, &str)], method: &str, path: &str) -> bool {
    routes.iter().any(|(m, p)| *m == method && *p == path)
}

/// Identity resolved for the current request.
#[derive(Clone)]
pub struct AuthContext {
    pub user: Option<User>,
    pub token_type: Option<TokenType>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self {
            user: None,
            token_type: None,
        }
    }

    /// Fine-grained route guard layered on top of the coarse allow-list.
    pub fn require(&self, perm: Permission) -> Result<&User, AccountServiceError> {
        let user = self
            .user
            .as_ref()
            .ok_or(AccountServiceError::Unauthenticated("authentication required"))?;
        if !user.can(perm) {
            return Err(AccountServiceError::Forbidden);
        }
        Ok(user)
    }
}

/// Gate state machine over the allow-lists. Pure so the policy is testable
/// without HTTP plumbing.
fn evaluate(ctx: &AuthContext, method: &str, path: &str) -> Result<(), AccountServiceError> {
    if ctx.user.is_none() && !route_in(PUBLIC_ROUTES, method, path) {
        return Err(AccountServiceError::Unauthenticated("authentication required"));
    }
    // Refresh tokens never authorize general API access, and the refresh
    // endpoint accepts nothing but a refresh token.
    if ctx.token_type == Some(TokenType::Refresh) && !route_in(REFRESH_ROUTES, method, path) {
        return Err(AccountServiceError::RefreshNotAllowed);
    }
    if route_in(REFRESH_ROUTES, method, path) && ctx.token_type != Some(TokenType::Refresh) {
        return Err(AccountServiceError::Forbidden);
    }
    Ok(())
}

fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, AccountServiceError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AccountServiceError::Unauthenticated("invalid token"))?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AccountServiceError::Unauthenticated("invalid token"))?;
    Ok(Some(token.to_owned()))
}

pub async fn authorize(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AccountServiceError> {
    let mut ctx = AuthContext::anonymous();

    if let Some(token) = bearer_token(req.headers())? {
        // A presented credential that is malformed or expired is always an
        // error, even on public routes — never a silent downgrade.
        let claims = validate_token(&token, &state.tokens.secret)?;
        let users = state.user_repo();
        if let Some(user) = users.find_by_alternative_id(&claims.sub).await? {
            // A user without LOGIN (disabled account) stays anonymous.
            if user.can(Permission::LOGIN) {
                users.ping(user.id, Utc::now()).await?;
                ctx = AuthContext {
                    user: Some(user),
                    token_type: Some(claims.token_type),
                };
            }
        }
    }

    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());
    evaluate(&ctx, req.method().as_str(), &path)?;

    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}

/// Extractor for handlers that need the resolved user. Rejects with 401 when
/// the gate left the request anonymous (public routes only).
pub struct CurrentUser(pub User);

impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AccountServiceError;

    // Values are pulled out synchronously; the returned future is 'static.
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let user = parts
            .extensions
            .get::<AuthContext>()
            .and_then(|ctx| ctx.user.clone());
        async move {
            user.map(CurrentUser)
                .ok_or(AccountServiceError::Unauthenticated("authentication required"))
        }
    }
}
