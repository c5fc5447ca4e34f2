use chrono::Utc;

use dowdah_accounts::error::AccountServiceError;
use dowdah_accounts::usecase::avatar::{
    ConfirmAvatarUseCase, StorageConfig, UploadAvatarUseCase, UploadParams,
};

use crate::helpers::{MockTaskQueue, MockUserRepo, test_envelope_key, test_user};

fn storage() -> StorageConfig {
    StorageConfig {
        public_url: "https://cdn.example.com".to_owned(),
        proxy: Some("https://upload.example.com".to_owned()),
        param_ttl_secs: 600,
    }
}

fn upload_usecase() -> UploadAvatarUseCase {
    UploadAvatarUseCase {
        envelope: test_envelope_key(),
        storage: storage(),
    }
}

// ── Upload params ────────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_params_are_sealed_and_scoped_to_the_user() {
    let user = test_user();
    let out = upload_usecase().execute(&user, "PNG").unwrap();

    let params: UploadParams = test_envelope_key().open_json(&out.params).unwrap();
    assert!(params.key.starts_with(&format!("{}/avatar_", user.storage_uuid)));
    assert!(params.key.ends_with(".png"));
    assert_eq!(params.mime_type, "image/png");
    assert_eq!(params.method, "avatar");
    assert_eq!(params.max_size, 5 * 1024 * 1024);
    assert!(params.expires > Utc::now().timestamp());
    assert_eq!(params.previous_avatar_key, None);

    assert_eq!(out.proxy.as_deref(), Some("https://upload.example.com"));
    assert_eq!(
        out.new_avatar_url,
        format!("https://cdn.example.com/{}", params.key)
    );
}

#[tokio::test]
async fn upload_params_name_the_previous_avatar_for_cleanup() {
    let mut user = test_user();
    user.avatar_filename = Some("avatar_1.gif".to_owned());

    let out = upload_usecase().execute(&user, "jpg").unwrap();
    let params: UploadParams = test_envelope_key().open_json(&out.params).unwrap();
    assert_eq!(
        params.previous_avatar_key,
        Some(format!("{}/avatar_1.gif", user.storage_uuid))
    );
    assert_eq!(params.mime_type, "image/jpeg");
}

#[tokio::test]
async fn upload_rejects_disallowed_extensions() {
    let user = test_user();
    for ext in ["svg", "webp", "exe", ""] {
        let err = upload_usecase().execute(&user, ext).unwrap_err();
        assert!(matches!(err, AccountServiceError::InvalidRequest(_)));
    }
}

// ── Confirm ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn confirm_sets_the_avatar_from_a_sealed_key() {
    let user = test_user();
    let users = MockUserRepo::new(vec![user.clone()]);
    let handle = users.handle();
    let tasks = MockTaskQueue::new();
    let submitted = tasks.handle();

    let sealed_key = test_envelope_key()
        .seal_str(&format!("{}/avatar_9.png", user.storage_uuid))
        .unwrap();

    let usecase = ConfirmAvatarUseCase {
        users,
        tasks,
        envelope: test_envelope_key(),
    };
    usecase.execute(&user, &sealed_key).await.unwrap();

    assert_eq!(
        handle.lock().unwrap()[0].avatar_filename,
        Some("avatar_9.png".to_owned())
    );
    // First avatar: nothing to clean up.
    assert!(submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn confirm_schedules_deletion_of_the_replaced_avatar() {
    let mut user = test_user();
    user.avatar_filename = Some("avatar_1.png".to_owned());
    let users = MockUserRepo::new(vec![user.clone()]);
    let tasks = MockTaskQueue::new();
    let submitted = tasks.handle();

    let sealed_key = test_envelope_key()
        .seal_str(&format!("{}/avatar_2.png", user.storage_uuid))
        .unwrap();

    let usecase = ConfirmAvatarUseCase {
        users,
        tasks,
        envelope: test_envelope_key(),
    };
    usecase.execute(&user, &sealed_key).await.unwrap();

    let submitted = submitted.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].0, "storage_delete");
    assert_eq!(
        submitted[0].1["key"],
        serde_json::json!(format!("{}/avatar_1.png", user.storage_uuid))
    );
}

#[tokio::test]
async fn confirm_rejects_a_key_from_another_namespace() {
    let user = test_user();
    let users = MockUserRepo::new(vec![user.clone()]);
    let handle = users.handle();

    let sealed_key = test_envelope_key()
        .seal_str("deadbeefdeadbeefdeadbeefdeadbeef/avatar_9.png")
        .unwrap();

    let usecase = ConfirmAvatarUseCase {
        users,
        tasks: MockTaskQueue::new(),
        envelope: test_envelope_key(),
    };
    let err = usecase.execute(&user, &sealed_key).await.unwrap_err();
    assert!(matches!(err, AccountServiceError::MismatchedBinding(_)));
    assert_eq!(handle.lock().unwrap()[0].avatar_filename, None);
}

#[tokio::test]
async fn confirm_rejects_unsealed_or_malformed_keys() {
    let user = test_user();
    let usecase = ConfirmAvatarUseCase {
        users: MockUserRepo::new(vec![user.clone()]),
        tasks: MockTaskQueue::new(),
        envelope: test_envelope_key(),
    };

    // Not an envelope at all.
    let err = usecase.execute(&user, "raw/key.png").await.unwrap_err();
    assert!(matches!(err, AccountServiceError::InvalidEnvelope));

    // Sealed, but not a "<prefix>/<filename>" key.
    let sealed = test_envelope_key().seal_str("no-slash-here").unwrap();
    let err = usecase.execute(&user, &sealed).await.unwrap_err();
    assert!(matches!(err, AccountServiceError::InvalidEnvelope));
}
