//! Network issue repository for database operations.

use anyhow::Result;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::models::network_issue::{self, Entity as NetworkIssue};

/// Repository for network issue database operations
pub struct NetworkIssueRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> NetworkIssueRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, issue: network_issue::ActiveModel) -> Result<network_issue::Model> {
        let created = issue.insert(self.db).await?;
        Ok(created)
    }

    /// Open issues in reverse chronological order of reporting.
    pub async fn list_unresolved(&self) -> Result<Vec<network_issue::Model>> {
        let issues = NetworkIssue::find()
            .filter(network_issue::Column::IsResolved.eq(false))
            .order_by_desc(network_issue::Column::ReportedAt)
            .all(self.db)
            .await?;
        Ok(issues)
    }

    /// Marks the given issues resolved and stamps the resolution time.
    ///
    /// Already-resolved and unknown ids are skipped; the count of rows
    /// actually flipped is returned.
    pub async fn resolve_many(&self, ids: &[Uuid]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = NetworkIssue::update_many()
            .col_expr(network_issue::Column::IsResolved, Expr::value(true))
            .col_expr(
                network_issue::Column::ResolvedAt,
                Expr::value(sea_orm::Value::ChronoDateTimeWithTimeZone(Some(Box::new(
                    Utc::now().into(),
                )))),
            )
            .filter(network_issue::Column::Id.is_in(ids.iter().copied()))
            .filter(network_issue::Column::IsResolved.eq(false))
            .exec(self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
