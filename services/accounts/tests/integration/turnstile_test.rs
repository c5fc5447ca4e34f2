use chrono::{Duration, Utc};

use dowdah_accounts::domain::repository::OneTimeTokenStore;
use dowdah_accounts::error::AccountServiceError;
use dowdah_accounts::usecase::turnstile::{ChallengePayload, VerifyChallengeUseCase};

use crate::helpers::{MemoryTokenStore, test_envelope_key};

const EXPIRATION_SECS: i64 = 300;

fn usecase(store: MemoryTokenStore) -> VerifyChallengeUseCase<MemoryTokenStore> {
    VerifyChallengeUseCase {
        store,
        envelope: test_envelope_key(),
        expiration_secs: EXPIRATION_SECS,
    }
}

fn sealed_challenge(action: &str, fingerprint: &str, age_secs: i64) -> String {
    let payload = ChallengePayload {
        action: action.to_owned(),
        cdata: fingerprint.to_owned(),
        challenge_ts: Utc::now() - Duration::seconds(age_secs),
    };
    test_envelope_key().seal_json(&payload).unwrap()
}

#[tokio::test]
async fn fresh_challenge_verifies_once() {
    let usecase = usecase(MemoryTokenStore::new());
    let sealed = sealed_challenge("login", "fp-1", 5);

    usecase.execute(&sealed, "fp-1", Some("login")).await.unwrap();

    // The very same envelope is dead on arrival the second time, even though
    // its window has not elapsed.
    let err = usecase.execute(&sealed, "fp-1", Some("login")).await.unwrap_err();
    assert!(matches!(err, AccountServiceError::Replayed(_)));
}

#[tokio::test]
async fn replay_marker_is_checked_before_decryption() {
    let store = MemoryTokenStore::new();
    store.set("garbage-envelope", "used", 300).await.unwrap();

    let err = usecase(store)
        .execute("garbage-envelope", "fp-1", None)
        .await
        .unwrap_err();
    // Replayed, not InvalidEnvelope: the pipeline stops at the first check.
    assert!(matches!(err, AccountServiceError::Replayed(_)));
}

#[tokio::test]
async fn tampered_envelope_is_invalid() {
    let err = usecase(MemoryTokenStore::new())
        .execute("bm90IGEgcmVhbCBlbnZlbG9wZQ==", "fp-1", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AccountServiceError::InvalidEnvelope));
}

#[tokio::test]
async fn action_binding_is_enforced() {
    let sealed = sealed_challenge("register", "fp-1", 5);
    let err = usecase(MemoryTokenStore::new())
        .execute(&sealed, "fp-1", Some("login"))
        .await
        .unwrap_err();
    assert!(matches!(err, AccountServiceError::MismatchedBinding("action")));
}

#[tokio::test]
async fn action_check_is_skipped_when_no_action_is_expected() {
    let sealed = sealed_challenge("register", "fp-1", 5);
    usecase(MemoryTokenStore::new())
        .execute(&sealed, "fp-1", None)
        .await
        .unwrap();
}

#[tokio::test]
async fn fingerprint_binding_is_enforced() {
    let sealed = sealed_challenge("login", "fp-1", 5);
    let err = usecase(MemoryTokenStore::new())
        .execute(&sealed, "fp-2", Some("login"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AccountServiceError::MismatchedBinding("fingerprint")
    ));
}

#[tokio::test]
async fn stale_challenge_is_expired() {
    let sealed = sealed_challenge("login", "fp-1", EXPIRATION_SECS + 10);
    let err = usecase(MemoryTokenStore::new())
        .execute(&sealed, "fp-1", Some("login"))
        .await
        .unwrap_err();
    assert!(matches!(err, AccountServiceError::Expired(_)));
}

#[tokio::test]
async fn failed_checks_do_not_consume_the_envelope() {
    let store = MemoryTokenStore::new();
    let sealed = sealed_challenge("login", "fp-1", 5);

    // A fingerprint mismatch must leave the envelope usable by its real owner.
    let err = usecase(store.clone())
        .execute(&sealed, "attacker-fp", Some("login"))
        .await
        .unwrap_err();
    assert!(matches!(err, AccountServiceError::MismatchedBinding(_)));

    usecase(store).execute(&sealed, "fp-1", Some("login")).await.unwrap();
}
