use sea_orm::entity::prelude::*;

/// WebAuthn passkey credential stored for a user.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "webauthn_credentials")]
pub struct Model {
    /// Credential ID in base64url form (primary key, as sent by the client).
    #[sea_orm(primary_key, auto_increment = false)]
    pub credential_id: String,
    pub user_id: Uuid,
    pub name: String,
    /// Serialized `webauthn_rs::Passkey` (opaque to the rest of the service).
    pub public_key: Vec<u8>,
    /// Server-tracked monotonic signature counter (clone detection).
    pub sign_count: i64,
    pub disabled: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
