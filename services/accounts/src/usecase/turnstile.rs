use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::envelope::EnvelopeKey;
use crate::domain::repository::OneTimeTokenStore;
use crate::error::AccountServiceError;

/// Payload sealed inside a bot-challenge envelope by the edge worker after it
/// validated the challenge with the upstream service.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChallengePayload {
    /// Action the challenge widget was rendered for ("register", "login").
    pub action: String,
    /// Client session fingerprint the widget was bound to.
    pub cdata: String,
    /// When the upstream service solved the challenge.
    pub challenge_ts: DateTime<Utc>,
}

/// Bot-challenge verification pipeline.
///
/// Checks run in a fixed order and stop at the first failure so a probing
/// client learns nothing about later checks: replay, envelope integrity,
/// action binding, fingerprint binding, expiry, then atomic consumption.
pub struct VerifyChallengeUseCase<S>
where
    S: OneTimeTokenStore,
{
    pub store: S,
    pub envelope: EnvelopeKey,
    pub expiration_secs: i64,
}

impl<S> VerifyChallengeUseCase<S>
where
    S: OneTimeTokenStore,
{
    pub async fn execute(
        &self,
        sealed_response: &str,
        fingerprint: &str,
        expected_action: Option<&str>,
    ) -> Result<(), AccountServiceError> {
        if self.store.get(sealed_response).await?.is_some() {
            return Err(AccountServiceError::Replayed("turnstile response"));
        }

        let payload: ChallengePayload = self.envelope.open_json(sealed_response)?;

        if let Some(expected) = expected_action {
            if payload.action != expected {
                return Err(AccountServiceError::MismatchedBinding("action"));
            }
        }

        if payload.cdata != fingerprint {
            return Err(AccountServiceError::MismatchedBinding("fingerprint"));
        }

        let age_secs = (Utc::now() - payload.challenge_ts).num_seconds();
        if age_secs > self.expiration_secs {
            return Err(AccountServiceError::Expired("turnstile response"));
        }

        // Consume the envelope for the rest of its window. The conditional
        // set is the replay barrier under concurrency: exactly one of two
        // simultaneous presentations wins the SETNX.
        let remaining = (self.expiration_secs - age_secs).clamp(1, self.expiration_secs) as u64;
        let consumed = self
            .store
            .set_if_absent(sealed_response, "used", remaining)
            .await?;
        if !consumed {
            tracing::warn!(kind = "REPLAYED", "concurrent turnstile replay attempt");
            return Err(AccountServiceError::Replayed("turnstile response"));
        }

        Ok(())
    }
}
