use rand::RngExt;
use serde_json::json;
use uuid::Uuid;

use crate::crypto::password;
use crate::domain::repository::{OneTimeTokenStore, RoleRepository, TaskQueue, UserRepository};
use crate::domain::types::{
    EMAIL_CODE_LEN, EMAIL_CODE_TTL_SECS, EMAIL_REGEX, TaskHandle, User,
};
use crate::error::AccountServiceError;
use crate::usecase::token::{AuthOutput, TokenConfig, issue_token_pair};

fn email_verification_key(email: &str) -> String {
    format!("email_verification_{email}")
}

fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..EMAIL_CODE_LEN)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

// ── Register ─────────────────────────────────────────────────────────────────

pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub struct RegisterUseCase<U, R>
where
    U: UserRepository,
    R: RoleRepository,
{
    pub users: U,
    pub roles: R,
    pub tokens: TokenConfig,
}

impl<U, R> RegisterUseCase<U, R>
where
    U: UserRepository,
    R: RoleRepository,
{
    pub async fn execute(&self, input: RegisterInput) -> Result<AuthOutput, AccountServiceError> {
        if input.username.is_empty() || input.username.len() > 64 {
            return Err(AccountServiceError::InvalidRequest("invalid username"));
        }
        if !EMAIL_REGEX.is_match(&input.email) {
            return Err(AccountServiceError::InvalidRequest("invalid email address"));
        }

        if self.users.find_by_username(&input.username).await?.is_some()
            || self.users.find_by_email(&input.email).await?.is_some()
        {
            return Err(AccountServiceError::Conflict);
        }

        let role = self
            .roles
            .default_role()
            .await?
            .ok_or_else(|| AccountServiceError::Internal(anyhow::anyhow!("no default role")))?;

        let password_hash = password::hash(input.password).await?;
        let user = User::new(input.username, input.email, password_hash, role);
        self.users.create(&user).await?;

        issue_token_pair(user, &self.tokens)
    }
}

// ── Login ────────────────────────────────────────────────────────────────────

pub struct LoginInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

pub struct LoginUseCase<U>
where
    U: UserRepository,
{
    pub users: U,
    pub tokens: TokenConfig,
}

impl<U> LoginUseCase<U>
where
    U: UserRepository,
{
    pub async fn execute(&self, input: LoginInput) -> Result<AuthOutput, AccountServiceError> {
        let user = match (&input.username, &input.email) {
            (None, None) => {
                return Err(AccountServiceError::InvalidRequest(
                    "no username or email provided",
                ));
            }
            (Some(_), Some(_)) => {
                return Err(AccountServiceError::InvalidRequest(
                    "both username and email provided",
                ));
            }
            (Some(username), None) => self.users.find_by_username(username).await?,
            (None, Some(email)) => self.users.find_by_email(email).await?,
        };

        // Unknown user and wrong password must be indistinguishable.
        let Some(user) = user else {
            return Err(AccountServiceError::Unauthenticated("incorrect credentials"));
        };
        let verified = password::verify(user.password_hash.clone(), input.password).await?;
        if !verified {
            return Err(AccountServiceError::Unauthenticated("incorrect credentials"));
        }

        issue_token_pair(user, &self.tokens)
    }
}

// ── Email verification ───────────────────────────────────────────────────────

pub struct SendVerificationUseCase<S, T>
where
    S: OneTimeTokenStore,
    T: TaskQueue,
{
    pub store: S,
    pub tasks: T,
}

impl<S, T> SendVerificationUseCase<S, T>
where
    S: OneTimeTokenStore,
    T: TaskQueue,
{
    /// Store a fresh code for the caller's own email (overwriting any earlier
    /// one) and hand the delivery off to the task worker.
    pub async fn execute(&self, user: &User) -> Result<TaskHandle, AccountServiceError> {
        let code = generate_code();
        self.store
            .set(&email_verification_key(&user.email), &code, EMAIL_CODE_TTL_SECS)
            .await?;

        let submission_id = Uuid::new_v4();
        self.tasks
            .submit(
                "send_email",
                json!({
                    "recipients": [user.email.clone()],
                    "subject": "Email verification code",
                    "template": "email/verification_code",
                    "code": code,
                }),
                &format!("send_email:{submission_id}"),
            )
            .await
    }
}

pub struct ConfirmEmailUseCase<U, S>
where
    U: UserRepository,
    S: OneTimeTokenStore,
{
    pub users: U,
    pub store: S,
}

impl<U, S> ConfirmEmailUseCase<U, S>
where
    U: UserRepository,
    S: OneTimeTokenStore,
{
    pub async fn execute(&self, user: &User, code: &str) -> Result<(), AccountServiceError> {
        let key = email_verification_key(&user.email);
        let stored = self
            .store
            .get(&key)
            .await?
            .ok_or(AccountServiceError::Expired("email verification code"))?;
        if stored != code {
            return Err(AccountServiceError::MismatchedBinding("email verification code"));
        }
        self.store.delete(&key).await?;
        self.users.set_email_verified(user.id).await?;
        Ok(())
    }
}

// ── Change password ──────────────────────────────────────────────────────────

pub struct ChangePasswordUseCase<U>
where
    U: UserRepository,
{
    pub users: U,
}

impl<U> ChangePasswordUseCase<U>
where
    U: UserRepository,
{
    /// Rotates the alternative ID along with the hash, which invalidates
    /// every token issued before the change.
    pub async fn execute(
        &self,
        user: &User,
        old_password: String,
        new_password: String,
    ) -> Result<(), AccountServiceError> {
        let verified = password::verify(user.password_hash.clone(), old_password).await?;
        if !verified {
            return Err(AccountServiceError::Unauthenticated("incorrect credentials"));
        }
        let password_hash = password::hash(new_password).await?;
        let alternative_id = crate::domain::types::generate_opaque_id();
        self.users
            .update_password(user.id, &password_hash, &alternative_id)
            .await
    }
}

// ── Existence probe ──────────────────────────────────────────────────────────

pub struct ExistsUseCase<U>
where
    U: UserRepository,
{
    pub users: U,
}

impl<U> ExistsUseCase<U>
where
    U: UserRepository,
{
    pub async fn execute(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<bool, AccountServiceError> {
        match (username, email) {
            (None, None) => Err(AccountServiceError::InvalidRequest(
                "neither email nor username provided",
            )),
            (Some(_), Some(_)) => Err(AccountServiceError::InvalidRequest(
                "both email and username provided",
            )),
            (Some(username), None) => {
                Ok(self.users.find_by_username(username).await?.is_some())
            }
            (None, Some(email)) => {
                if !EMAIL_REGEX.is_match(email) {
                    return Err(AccountServiceError::InvalidRequest("invalid email address"));
                }
                Ok(self.users.find_by_email(email).await?.is_some())
            }
        }
    }
}

// ── Admin listing ────────────────────────────────────────────────────────────

pub struct ListUsersUseCase<U>
where
    U: UserRepository,
{
    pub users: U,
}

impl<U> ListUsersUseCase<U>
where
    U: UserRepository,
{
    pub async fn execute(&self) -> Result<Vec<User>, AccountServiceError> {
        self.users.list().await
    }
}
