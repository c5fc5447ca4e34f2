use axum::{
    Router, middleware,
    routing::{get, patch, post},
};
use tower_http::trace::TraceLayer;

use dowdah_core::health::{healthz, readyz};
use dowdah_core::middleware::request_id_layer;

use crate::gate;
use crate::handlers::{
    account::{confirm_email, login, me, refresh_access_token, register, send_verification},
    avatar::{confirm_new_avatar, upload_avatar},
    user::{change_password, exists, list_users},
    webauthn::{
        login_begin, login_complete, my_authenticators, register_begin, register_complete,
        update_authenticator,
    },
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Every /api/v1 request passes through the gate before its handler.
    let api = Router::new()
        // Account
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/refresh", get(refresh_access_token))
        .route("/auth/send-verification", post(send_verification))
        .route("/auth/confirm-email", post(confirm_email))
        // User
        .route("/user/exists", post(exists))
        .route("/user/password", patch(change_password))
        .route("/users", get(list_users))
        // WebAuthn
        .route("/webauthn/my-authenticators", get(my_authenticators))
        .route("/webauthn/register/begin", get(register_begin))
        .route("/webauthn/register/complete", post(register_complete))
        .route("/webauthn/login/begin", get(login_begin))
        .route("/webauthn/login/complete", post(login_complete))
        .route(
            "/webauthn/authenticators/{credential_id}",
            patch(update_authenticator),
        )
        // Storage
        .route("/storage/upload-avatar", get(upload_avatar))
        .route("/storage/confirm-new-avatar", post(confirm_new_avatar))
        .layer(middleware::from_fn_with_state(state.clone(), gate::authorize));

    Router::new()
        // Health endpoints stay outside the gate.
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest("/api/v1", api)
        .layer(request_id_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
