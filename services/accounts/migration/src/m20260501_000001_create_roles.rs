use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Roles::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Roles::Name)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Roles::Default).boolean().not_null())
                    .col(ColumnDef::new(Roles::Permissions).integer().not_null())
                    .to_owned(),
            )
            .await?;

        // Seed the two built-in roles. "User" is the default role assigned to
        // new accounts: LOGIN | SELF_CHANGE_PASSWORD | SELF_CHANGE_EMAIL.
        let seed = Query::insert()
            .into_table(Roles::Table)
            .columns([Roles::Name, Roles::Default, Roles::Permissions])
            .values_panic(["User".into(), true.into(), 7.into()])
            .values_panic(["Administrator".into(), false.into(), 1024.into()])
            .to_owned();
        manager.exec_stmt(seed).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Roles::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Roles {
    Table,
    Id,
    Name,
    Default,
    Permissions,
}
