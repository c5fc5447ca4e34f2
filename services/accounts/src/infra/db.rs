use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, SqlErr,
};
use uuid::Uuid;

use dowdah_accounts_schema::{roles, users, webauthn_credentials};

use crate::domain::repository::{CredentialRepository, RoleRepository, UserRepository};
use crate::domain::types::{CredentialRecord, Role, User};
use crate::error::AccountServiceError;

// ── Role repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbRoleRepository {
    pub db: DatabaseConnection,
}

impl RoleRepository for DbRoleRepository {
    async fn default_role(&self) -> Result<Option<Role>, AccountServiceError> {
        let model = roles::Entity::find()
            .filter(roles::Column::Default.eq(true))
            .one(&self.db)
            .await
            .context("find default role")?;
        Ok(model.map(role_from_model))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Role>, AccountServiceError> {
        let model = roles::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find role by id")?;
        Ok(model.map(role_from_model))
    }
}

fn role_from_model(model: roles::Model) -> Role {
    Role {
        id: model.id,
        name: model.name,
        default: model.default,
        permissions: model.permissions,
    }
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl DbUserRepository {
    async fn find_one(
        &self,
        filter: sea_orm::Condition,
        context: &'static str,
    ) -> Result<Option<User>, AccountServiceError> {
        let result = users::Entity::find()
            .filter(filter)
            .find_also_related(roles::Entity)
            .one(&self.db)
            .await
            .context(context)?;
        result.map(user_from_models).transpose()
    }
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AccountServiceError> {
        self.find_one(
            sea_orm::Condition::all().add(users::Column::Id.eq(id)),
            "find user by id",
        )
        .await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AccountServiceError> {
        self.find_one(
            sea_orm::Condition::all().add(users::Column::Username.eq(username)),
            "find user by username",
        )
        .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountServiceError> {
        self.find_one(
            sea_orm::Condition::all().add(users::Column::Email.eq(email)),
            "find user by email",
        )
        .await
    }

    async fn find_by_alternative_id(
        &self,
        alternative_id: &str,
    ) -> Result<Option<User>, AccountServiceError> {
        self.find_one(
            sea_orm::Condition::all().add(users::Column::AlternativeId.eq(alternative_id)),
            "find user by alternative id",
        )
        .await
    }

    async fn create(&self, user: &User) -> Result<(), AccountServiceError> {
        let model = users::ActiveModel {
            id: Set(user.id),
            username: Set(user.username.clone()),
            email: Set(user.email.clone()),
            alternative_id: Set(user.alternative_id.clone()),
            storage_uuid: Set(user.storage_uuid.clone()),
            avatar_filename: Set(user.avatar_filename.clone()),
            password_hash: Set(user.password_hash.clone()),
            role_id: Set(user.role.id),
            email_verified: Set(user.email_verified),
            comments: Set(user.comments.clone()),
            created_at: Set(user.created_at),
            last_seen: Set(user.last_seen),
        };
        match model.insert(&self.db).await {
            Ok(_) => Ok(()),
            // A racing registration can slip past the pre-check; the unique
            // constraint is the authority.
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(AccountServiceError::Conflict)
            }
            Err(e) => Err(anyhow::Error::from(e).context("create user").into()),
        }
    }

    async fn list(&self) -> Result<Vec<User>, AccountServiceError> {
        let models = users::Entity::find()
            .find_also_related(roles::Entity)
            .all(&self.db)
            .await
            .context("list users")?;
        models.into_iter().map(user_from_models).collect()
    }

    async fn ping(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), AccountServiceError> {
        users::ActiveModel {
            id: Set(id),
            last_seen: Set(at),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("ping user")?;
        Ok(())
    }

    async fn set_email_verified(&self, id: Uuid) -> Result<(), AccountServiceError> {
        users::ActiveModel {
            id: Set(id),
            email_verified: Set(true),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("set email verified")?;
        Ok(())
    }

    async fn set_avatar(&self, id: Uuid, filename: &str) -> Result<(), AccountServiceError> {
        users::ActiveModel {
            id: Set(id),
            avatar_filename: Set(Some(filename.to_owned())),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("set avatar")?;
        Ok(())
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        alternative_id: &str,
    ) -> Result<(), AccountServiceError> {
        users::ActiveModel {
            id: Set(id),
            password_hash: Set(password_hash.to_owned()),
            alternative_id: Set(alternative_id.to_owned()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("update password")?;
        Ok(())
    }
}

fn user_from_models(
    (user, role): (users::Model, Option<roles::Model>),
) -> Result<User, AccountServiceError> {
    let role = role
        .ok_or_else(|| anyhow::anyhow!("user {} has no role row", user.id))
        .map(role_from_model)?;
    Ok(User {
        id: user.id,
        username: user.username,
        email: user.email,
        alternative_id: user.alternative_id,
        storage_uuid: user.storage_uuid,
        avatar_filename: user.avatar_filename,
        password_hash: user.password_hash,
        role,
        email_verified: user.email_verified,
        comments: user.comments,
        created_at: user.created_at,
        last_seen: user.last_seen,
    })
}

// ── Credential repository ────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCredentialRepository {
    pub db: DatabaseConnection,
}

impl CredentialRepository for DbCredentialRepository {
    async fn list_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<CredentialRecord>, AccountServiceError> {
        let models = webauthn_credentials::Entity::find()
            .filter(webauthn_credentials::Column::UserId.eq(user_id))
            .all(&self.db)
            .await
            .context("list credentials by user")?;
        Ok(models.into_iter().map(credential_from_model).collect())
    }

    async fn count_by_user(&self, user_id: Uuid) -> Result<u64, AccountServiceError> {
        let count = webauthn_credentials::Entity::find()
            .filter(webauthn_credentials::Column::UserId.eq(user_id))
            .count(&self.db)
            .await
            .context("count credentials by user")?;
        Ok(count)
    }

    async fn find_active(
        &self,
        credential_id: &str,
    ) -> Result<Option<CredentialRecord>, AccountServiceError> {
        let model = webauthn_credentials::Entity::find_by_id(credential_id.to_owned())
            .filter(webauthn_credentials::Column::Disabled.eq(false))
            .one(&self.db)
            .await
            .context("find active credential")?;
        Ok(model.map(credential_from_model))
    }

    async fn create(&self, record: &CredentialRecord) -> Result<(), AccountServiceError> {
        webauthn_credentials::ActiveModel {
            credential_id: Set(record.credential_id.clone()),
            user_id: Set(record.user_id),
            name: Set(record.name.clone()),
            public_key: Set(record.public_key.clone()),
            sign_count: Set(record.sign_count),
            disabled: Set(record.disabled),
            created_at: Set(record.created_at),
        }
        .insert(&self.db)
        .await
        .context("create credential")?;
        Ok(())
    }

    async fn advance_sign_count(
        &self,
        credential_id: &str,
        expected: i64,
        sign_count: i64,
        public_key: &[u8],
    ) -> Result<bool, AccountServiceError> {
        // Compare-and-set on the counter column: of two concurrent
        // assertions, exactly one update matches the expected value.
        let result = webauthn_credentials::Entity::update_many()
            .col_expr(webauthn_credentials::Column::SignCount, Expr::value(sign_count))
            .col_expr(
                webauthn_credentials::Column::PublicKey,
                Expr::value(public_key.to_vec()),
            )
            .filter(webauthn_credentials::Column::CredentialId.eq(credential_id))
            .filter(webauthn_credentials::Column::SignCount.eq(expected))
            .exec(&self.db)
            .await
            .context("advance credential sign count")?;
        Ok(result.rows_affected > 0)
    }

    async fn set_name(
        &self,
        credential_id: &str,
        user_id: Uuid,
        name: &str,
    ) -> Result<bool, AccountServiceError> {
        let result = webauthn_credentials::Entity::update_many()
            .col_expr(webauthn_credentials::Column::Name, Expr::value(name))
            .filter(webauthn_credentials::Column::CredentialId.eq(credential_id))
            .filter(webauthn_credentials::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .context("rename credential")?;
        Ok(result.rows_affected > 0)
    }

    async fn set_disabled(
        &self,
        credential_id: &str,
        user_id: Uuid,
        disabled: bool,
    ) -> Result<bool, AccountServiceError> {
        let result = webauthn_credentials::Entity::update_many()
            .col_expr(webauthn_credentials::Column::Disabled, Expr::value(disabled))
            .filter(webauthn_credentials::Column::CredentialId.eq(credential_id))
            .filter(webauthn_credentials::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .context("disable credential")?;
        Ok(result.rows_affected > 0)
    }
}

fn credential_from_model(model: webauthn_credentials::Model) -> CredentialRecord {
    CredentialRecord {
        credential_id: model.credential_id,
        user_id: model.user_id,
        name: model.name,
        public_key: model.public_key,
        sign_count: model.sign_count,
        disabled: model.disabled,
        created_at: model.created_at,
    }
}
