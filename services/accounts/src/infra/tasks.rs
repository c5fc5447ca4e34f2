use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait};
use uuid::Uuid;

use dowdah_accounts_schema::outbox_tasks;

use crate::domain::repository::TaskQueue;
use crate::domain::types::{TaskHandle, TaskStatus};
use crate::error::AccountServiceError;

/// Task queue backed by the outbox table. The worker process drains rows by
/// `next_attempt_at`; submission here is fire-and-forget.
#[derive(Clone)]
pub struct DbTaskQueue {
    pub db: DatabaseConnection,
}

impl TaskQueue for DbTaskQueue {
    async fn submit(
        &self,
        kind: &str,
        payload: serde_json::Value,
        idempotency_key: &str,
    ) -> Result<TaskHandle, AccountServiceError> {
        let now = Utc::now();
        let id = Uuid::new_v4();
        outbox_tasks::ActiveModel {
            id: Set(id),
            kind: Set(kind.to_owned()),
            payload: Set(payload),
            idempotency_key: Set(idempotency_key.to_owned()),
            attempts: Set(0),
            last_error: Set(None),
            created_at: Set(now),
            next_attempt_at: Set(now),
            processed_at: Set(None),
            failed_at: Set(None),
        }
        .insert(&self.db)
        .await
        .context("submit task")?;
        Ok(TaskHandle(id))
    }

    async fn status(
        &self,
        handle: TaskHandle,
    ) -> Result<Option<TaskStatus>, AccountServiceError> {
        let model = outbox_tasks::Entity::find_by_id(handle.0)
            .one(&self.db)
            .await
            .context("task status")?;
        Ok(model.map(|m| {
            if m.processed_at.is_some() {
                TaskStatus::Processed
            } else if m.failed_at.is_some() {
                TaskStatus::Failed
            } else {
                TaskStatus::Pending
            }
        }))
    }
}
