use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WebauthnCredentials::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WebauthnCredentials::CredentialId)
                            .string_len(255)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WebauthnCredentials::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(WebauthnCredentials::Name)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WebauthnCredentials::PublicKey)
                            .binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WebauthnCredentials::SignCount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WebauthnCredentials::Disabled)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WebauthnCredentials::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_webauthn_credentials_user_id")
                            .from(WebauthnCredentials::Table, WebauthnCredentials::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(WebauthnCredentials::Table)
                    .col(WebauthnCredentials::UserId)
                    .name("idx_webauthn_credentials_user_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WebauthnCredentials::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum WebauthnCredentials {
    Table,
    CredentialId,
    UserId,
    Name,
    PublicKey,
    SignCount,
    Disabled,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
