use sea_orm_migration::prelude::*;

mod m20260501_000001_create_roles;
mod m20260501_000002_create_users;
mod m20260501_000003_create_webauthn_credentials;
mod m20260501_000004_create_outbox_tasks;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260501_000001_create_roles::Migration),
            Box::new(m20260501_000002_create_users::Migration),
            Box::new(m20260501_000003_create_webauthn_credentials::Migration),
            Box::new(m20260501_000004_create_outbox_tasks::Migration),
        ]
    }
}
