use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use webauthn_rs::prelude::*;

use crate::crypto::envelope::EnvelopeKey;
use crate::domain::repository::{CredentialRepository, UserRepository};
use crate::domain::types::{CEREMONY_TTL_SECS, CredentialRecord, User};
use crate::error::AccountServiceError;
use crate::usecase::token::{AuthOutput, TokenConfig, issue_token_pair};

/// Ceremony state handed to the client inside an AEAD envelope and echoed
/// back to the complete endpoint. Tamper-proof, so no server-side session
/// storage is needed; the challenge lives inside the serialized state.
#[derive(Serialize, Deserialize)]
struct SealedRegistration {
    expires: i64,
    user_id: Uuid,
    state: PasskeyRegistration,
}

#[derive(Serialize, Deserialize)]
struct SealedAuthentication {
    expires: i64,
    state: DiscoverableAuthentication,
}

/// The serialized `Passkey` nests the attestation counter under `cred.counter`.
fn initial_sign_count(passkey: &Passkey) -> i64 {
    serde_json::to_value(passkey)
        .ok()
        .and_then(|v| v.pointer("/cred/counter").and_then(|c| c.as_i64()))
        .unwrap_or(0)
}

// ── List credentials ─────────────────────────────────────────────────────────

pub struct ListCredentialsUseCase<C>
where
    C: CredentialRepository,
{
    pub credentials: C,
}

impl<C> ListCredentialsUseCase<C>
where
    C: CredentialRepository,
{
    pub async fn execute(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<CredentialRecord>, AccountServiceError> {
        self.credentials.list_by_user(user_id).await
    }
}

// ── Rename / disable a credential ────────────────────────────────────────────

pub struct UpdateCredentialUseCase<C>
where
    C: CredentialRepository,
{
    pub credentials: C,
}

impl<C> UpdateCredentialUseCase<C>
where
    C: CredentialRepository,
{
    /// Returns 404 if the credential does not exist or belongs to another user.
    pub async fn execute(
        &self,
        user_id: Uuid,
        credential_id: &str,
        name: Option<&str>,
        disabled: Option<bool>,
    ) -> Result<(), AccountServiceError> {
        if name.is_none() && disabled.is_none() {
            return Err(AccountServiceError::InvalidRequest("nothing to update"));
        }
        if let Some(name) = name {
            if name.is_empty() || name.len() > 64 {
                return Err(AccountServiceError::InvalidRequest("invalid authenticator name"));
            }
            let updated = self.credentials.set_name(credential_id, user_id, name).await?;
            if !updated {
                return Err(AccountServiceError::NotFound("credential"));
            }
        }
        if let Some(disabled) = disabled {
            let updated = self
                .credentials
                .set_disabled(credential_id, user_id, disabled)
                .await?;
            if !updated {
                return Err(AccountServiceError::NotFound("credential"));
            }
        }
        Ok(())
    }
}

// ── Start registration ───────────────────────────────────────────────────────

#[derive(Debug)]
pub struct StartRegistrationOutput {
    pub options: CreationChallengeResponse,
    /// Sealed ceremony state; echo back to the complete endpoint.
    pub state: String,
}

pub struct StartRegistrationUseCase<C>
where
    C: CredentialRepository,
{
    pub credentials: C,
    pub webauthn: Arc<Webauthn>,
    pub envelope: EnvelopeKey,
    pub max_credentials: u64,
}

impl<C> StartRegistrationUseCase<C>
where
    C: CredentialRepository,
{
    pub async fn execute(&self, user: &User) -> Result<StartRegistrationOutput, AccountServiceError> {
        let count = self.credentials.count_by_user(user.id).await?;
        if count >= self.max_credentials {
            return Err(AccountServiceError::TooManyCredentials);
        }

        // Exclude already-registered authenticators.
        let existing = self.credentials.list_by_user(user.id).await?;
        let exclude: Option<Vec<CredentialID>> = if existing.is_empty() {
            None
        } else {
            Some(
                existing
                    .iter()
                    .filter_map(|r| URL_SAFE_NO_PAD.decode(&r.credential_id).ok())
                    .map(CredentialID::from)
                    .collect(),
            )
        };

        // The user handle is the stable alternative ID, not the row ID.
        let handle = Uuid::parse_str(&user.alternative_id)
            .map_err(|e| AccountServiceError::Internal(anyhow::anyhow!("alternative_id: {e}")))?;

        let (ccr, reg_state) = self
            .webauthn
            .start_passkey_registration(handle, &user.username, &user.username, exclude)
            .map_err(|e| AccountServiceError::Internal(anyhow::anyhow!("{e}")))?;

        let sealed = self.envelope.seal_json(&SealedRegistration {
            expires: Utc::now().timestamp() + CEREMONY_TTL_SECS,
            user_id: user.id,
            state: reg_state,
        })?;

        Ok(StartRegistrationOutput {
            options: ccr,
            state: sealed,
        })
    }
}

// ── Finish registration ──────────────────────────────────────────────────────

pub struct FinishRegistrationUseCase<C>
where
    C: CredentialRepository,
{
    pub credentials: C,
    pub webauthn: Arc<Webauthn>,
    pub envelope: EnvelopeKey,
}

impl<C> FinishRegistrationUseCase<C>
where
    C: CredentialRepository,
{
    /// Verify-then-write: the credential row is persisted only after the
    /// attestation verifies; a failed ceremony persists nothing.
    pub async fn execute(
        &self,
        user: &User,
        sealed_state: &str,
        name: Option<String>,
        credential: &RegisterPublicKeyCredential,
    ) -> Result<CredentialRecord, AccountServiceError> {
        let sealed: SealedRegistration = self.envelope.open_json(sealed_state)?;
        if sealed.user_id != user.id {
            return Err(AccountServiceError::MismatchedBinding("registration session"));
        }
        if Utc::now().timestamp() > sealed.expires {
            return Err(AccountServiceError::Expired("registration session"));
        }

        let passkey = self
            .webauthn
            .finish_passkey_registration(credential, &sealed.state)
            .map_err(|e| {
                tracing::debug!(error = %e, "passkey registration verification failed");
                AccountServiceError::InvalidCredential
            })?;

        let credential_id = URL_SAFE_NO_PAD.encode(passkey.cred_id());
        let public_key = serde_json::to_vec(&passkey)
            .map_err(|e| AccountServiceError::Internal(e.into()))?;

        let record = CredentialRecord::new(
            credential_id,
            user.id,
            name,
            public_key,
            initial_sign_count(&passkey),
        );
        self.credentials.create(&record).await?;
        Ok(record)
    }
}

// ── Start authentication ─────────────────────────────────────────────────────

pub struct StartAuthenticationOutput {
    pub options: RequestChallengeResponse,
    pub state: String,
}

/// Usernameless flow: no identity is needed to begin — the credential the
/// client answers with identifies the user.
pub struct StartAuthenticationUseCase {
    pub webauthn: Arc<Webauthn>,
    pub envelope: EnvelopeKey,
}

impl StartAuthenticationUseCase {
    pub fn execute(&self) -> Result<StartAuthenticationOutput, AccountServiceError> {
        let (rcr, auth_state) = self
            .webauthn
            .start_discoverable_authentication()
            .map_err(|e| AccountServiceError::Internal(anyhow::anyhow!("{e}")))?;

        let sealed = self.envelope.seal_json(&SealedAuthentication {
            expires: Utc::now().timestamp() + CEREMONY_TTL_SECS,
            state: auth_state,
        })?;

        Ok(StartAuthenticationOutput {
            options: rcr,
            state: sealed,
        })
    }
}

// ── Finish authentication ────────────────────────────────────────────────────

pub struct FinishAuthenticationUseCase<U, C>
where
    U: UserRepository,
    C: CredentialRepository,
{
    pub users: U,
    pub credentials: C,
    pub webauthn: Arc<Webauthn>,
    pub envelope: EnvelopeKey,
    pub tokens: TokenConfig,
}

impl<U, C> FinishAuthenticationUseCase<U, C>
where
    U: UserRepository,
    C: CredentialRepository,
{
    pub async fn execute(
        &self,
        sealed_state: &str,
        credential: &PublicKeyCredential,
    ) -> Result<AuthOutput, AccountServiceError> {
        let sealed: SealedAuthentication = self.envelope.open_json(sealed_state)?;
        if Utc::now().timestamp() > sealed.expires {
            return Err(AccountServiceError::Expired("authentication session"));
        }

        let (_, cred_id) = self
            .webauthn
            .identify_discoverable_authentication(credential)
            .map_err(|_| AccountServiceError::InvalidCredential)?;
        let credential_id = URL_SAFE_NO_PAD.encode(cred_id);

        // Disabled credentials are invisible to authentication.
        let stored = self
            .credentials
            .find_active(&credential_id)
            .await?
            .ok_or(AccountServiceError::NotFound("credential"))?;

        let mut passkey: Passkey = serde_json::from_slice(&stored.public_key)
            .map_err(|e| AccountServiceError::Internal(anyhow::anyhow!("stored passkey: {e}")))?;
        let keys = [DiscoverableKey::from(&passkey)];

        let result = self
            .webauthn
            .finish_discoverable_authentication(credential, sealed.state, &keys)
            .map_err(|e| match e {
                WebauthnError::CredentialPossibleCompromise => {
                    clone_alarm(&stored, None);
                    AccountServiceError::CloneDetected
                }
                _ => AccountServiceError::InvalidCredential,
            })?;

        let new_count = i64::from(result.counter());
        if let Err(e) = ensure_counter_advanced(stored.sign_count, new_count) {
            clone_alarm(&stored, Some(new_count));
            return Err(e);
        }

        passkey.update_credential(&result);
        let public_key = serde_json::to_vec(&passkey)
            .map_err(|e| AccountServiceError::Internal(e.into()))?;
        let advanced = self
            .credentials
            .advance_sign_count(&stored.credential_id, stored.sign_count, new_count, &public_key)
            .await?;
        if !advanced {
            // A concurrent assertion advanced the counter between our read
            // and this write; only one of the two can be genuine.
            clone_alarm(&stored, Some(new_count));
            return Err(AccountServiceError::CloneDetected);
        }

        let user = self
            .users
            .find_by_id(stored.user_id)
            .await?
            .ok_or(AccountServiceError::NotFound("user"))?;

        issue_token_pair(user, &self.tokens)
    }
}

/// The reported counter must be strictly greater than the stored one; equal
/// or lower means a cloned authenticator replayed a captured response.
fn ensure_counter_advanced(stored: i64, reported: i64) -> Result<(), AccountServiceError> {
    if reported <= stored {
        return Err(AccountServiceError::CloneDetected);
    }
    Ok(())
}

/// Security event, distinct from a generic verification failure.
fn clone_alarm(stored: &CredentialRecord, reported: Option<i64>) {
    tracing::warn!(
        credential_id = %stored.credential_id,
        user_id = %stored.user_id,
        stored_count = stored.sign_count,
        reported_count = reported,
        kind = "CLONE_DETECTED",
        "signature counter regression",
    );
}
