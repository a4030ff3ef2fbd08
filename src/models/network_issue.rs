//! Network issue entity model
//!
//! Public outage reports. Anyone may report; only the administrative bulk
//! action mutates rows, flipping `is_resolved` and stamping `resolved_at`.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "network_issues")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub service_name: String,

    /// `outage`, `slow` or `intermittent`
    pub issue_type: String,

    /// `low`, `medium` or `high`
    pub severity: String,

    pub reported_at: DateTimeWithTimeZone,

    pub resolved_at: Option<DateTimeWithTimeZone>,

    pub is_resolved: bool,
}

/// Issue type tags accepted by the report endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Outage,
    Slow,
    Intermittent,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::Outage => "outage",
            IssueType::Slow => "slow",
            IssueType::Intermittent => "intermittent",
        }
    }
}

/// Severity tags accepted by the report endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
