//! Feedback repository for database operations.

use anyhow::Result;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::models::feedback::{self, Entity as Feedback};

/// Repository for feedback database operations
pub struct FeedbackRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> FeedbackRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, feedback: feedback::ActiveModel) -> Result<feedback::Model> {
        let created = feedback.insert(self.db).await?;
        Ok(created)
    }

    /// All feedback rows for a measurement, newest first.
    pub async fn list_for_measurement(&self, measurement_id: Uuid) -> Result<Vec<feedback::Model>> {
        let rows = Feedback::find()
            .filter(feedback::Column::MeasurementId.eq(measurement_id))
            .order_by_desc(feedback::Column::CreatedAt)
            .all(self.db)
            .await?;
        Ok(rows)
    }
}
