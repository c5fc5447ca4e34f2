use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OutboxTasks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(OutboxTasks::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(OutboxTasks::Kind).string_len(64).not_null())
                    .col(ColumnDef::new(OutboxTasks::Payload).json_binary().not_null())
                    .col(
                        ColumnDef::new(OutboxTasks::IdempotencyKey)
                            .string_len(128)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(OutboxTasks::Attempts).integer().not_null())
                    .col(ColumnDef::new(OutboxTasks::LastError).text())
                    .col(
                        ColumnDef::new(OutboxTasks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OutboxTasks::NextAttemptAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OutboxTasks::ProcessedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(OutboxTasks::FailedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(OutboxTasks::Table)
                    .col(OutboxTasks::NextAttemptAt)
                    .name("idx_outbox_tasks_next_attempt_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OutboxTasks::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum OutboxTasks {
    Table,
    Id,
    Kind,
    Payload,
    IdempotencyKey,
    Attempts,
    LastError,
    CreatedAt,
    NextAttemptAt,
    ProcessedAt,
    FailedAt,
}
