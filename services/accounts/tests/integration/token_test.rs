use jsonwebtoken::{EncodingKey, Header, encode};

use dowdah_accounts::error::AccountServiceError;
use dowdah_accounts::usecase::token::{
    TokenClaims, TokenType, issue_access_token, issue_refresh_token, issue_token_pair,
    validate_token,
};

use crate::helpers::{TEST_JWT_SECRET, test_token_config, test_user};

#[test]
fn access_token_round_trips_with_subject_and_type() {
    let user = test_user();
    let (token, exp) = issue_access_token(&user, &test_token_config()).unwrap();

    let claims = validate_token(&token, TEST_JWT_SECRET).unwrap();
    assert_eq!(claims.sub, user.alternative_id);
    assert_eq!(claims.token_type, TokenType::Access);
    assert_eq!(claims.exp, exp);
}

#[test]
fn refresh_token_carries_refresh_type() {
    let user = test_user();
    let token = issue_refresh_token(&user, &test_token_config()).unwrap();

    let claims = validate_token(&token, TEST_JWT_SECRET).unwrap();
    assert_eq!(claims.sub, user.alternative_id);
    assert_eq!(claims.token_type, TokenType::Refresh);
}

#[test]
fn subject_is_the_alternative_id_not_the_row_id() {
    let user = test_user();
    let (token, _) = issue_access_token(&user, &test_token_config()).unwrap();
    let claims = validate_token(&token, TEST_JWT_SECRET).unwrap();
    assert_ne!(claims.sub, user.id.to_string());
}

#[test]
fn wrong_secret_is_invalid() {
    let user = test_user();
    let (token, _) = issue_access_token(&user, &test_token_config()).unwrap();
    let err = validate_token(&token, "wrong-secret").unwrap_err();
    assert!(matches!(err, AccountServiceError::Unauthenticated(_)));
}

#[test]
fn garbage_is_invalid() {
    let err = validate_token("not-a-jwt", TEST_JWT_SECRET).unwrap_err();
    assert!(matches!(err, AccountServiceError::Unauthenticated(_)));
}

#[test]
fn expired_token_is_distinguished_from_invalid() {
    // Well past the validator's clock-skew leeway.
    let exp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
        - 600;
    let claims = TokenClaims {
        sub: test_user().alternative_id,
        token_type: TokenType::Access,
        exp,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap();

    let err = validate_token(&token, TEST_JWT_SECRET).unwrap_err();
    assert!(matches!(err, AccountServiceError::TokenExpired));
}

#[test]
fn refresh_flow_binds_the_new_access_token_to_the_same_subject() {
    let user = test_user();
    let config = test_token_config();
    let refresh = issue_refresh_token(&user, &config).unwrap();

    let claims = validate_token(&refresh, TEST_JWT_SECRET).unwrap();
    assert_eq!(claims.token_type, TokenType::Refresh);

    let (access, _) = issue_access_token(&user, &config).unwrap();
    let access_claims = validate_token(&access, TEST_JWT_SECRET).unwrap();
    assert_eq!(access_claims.sub, claims.sub);
    assert_eq!(access_claims.token_type, TokenType::Access);
}

#[test]
fn token_pair_shares_one_subject() {
    let user = test_user();
    let out = issue_token_pair(user, &test_token_config()).unwrap();

    let access = validate_token(&out.access_token, TEST_JWT_SECRET).unwrap();
    let refresh = validate_token(&out.refresh_token, TEST_JWT_SECRET).unwrap();
    assert_eq!(access.sub, refresh.sub);
    assert_eq!(access.sub, out.user.alternative_id);
}
