use sea_orm::entity::prelude::*;

/// Account record. Tokens are bound to `alternative_id`, never to `id`, so
/// regenerating `alternative_id` invalidates every outstanding token.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    /// Opaque 32-hex-char token subject.
    #[sea_orm(unique)]
    pub alternative_id: String,
    /// Per-user namespace prefix for object-storage keys.
    #[sea_orm(unique)]
    pub storage_uuid: String,
    pub avatar_filename: Option<String>,
    pub password_hash: String,
    pub role_id: i32,
    pub email_verified: bool,
    /// Admin-only notes, returned only in sensitive output.
    pub comments: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_seen: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::roles::Entity",
        from = "Column::RoleId",
        to = "super::roles::Column::Id"
    )]
    Role,
    #[sea_orm(has_many = "super::webauthn_credentials::Entity")]
    WebauthnCredentials,
}

impl Related<super::roles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl Related<super::webauthn_credentials::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WebauthnCredentials.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
