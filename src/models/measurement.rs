//! Measurement entity model
//!
//! One row per simulated speed test. Exactly one of `user_id` /
//! `session_token` is set in practice (not enforced as a hard constraint):
//! registered owners get `user_id`, anonymous owners get the session token.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "measurements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Option<Uuid>,

    pub session_token: Option<Uuid>,

    /// Nullable so a deleted provider leaves its measurements behind
    pub provider_id: Option<Uuid>,

    pub download_mbps: f64,

    pub upload_mbps: f64,

    pub ping_ms: i32,

    pub jitter_ms: Option<i32>,

    pub packet_loss_pct: f64,

    /// `multi` or `single`
    pub connection_type: String,

    pub ip_address: Option<String>,

    pub test_date: DateTimeWithTimeZone,
}

/// Quality tier derived from the average of download and upload speed.
///
/// Never persisted: always recomputed from the two speed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SpeedRating {
    Excellent,
    Good,
    Average,
    Poor,
}

impl SpeedRating {
    /// Classify an average speed in Mbps against the fixed thresholds.
    pub fn from_speeds(download_mbps: f64, upload_mbps: f64) -> Self {
        let avg = (download_mbps + upload_mbps) / 2.0;
        if avg >= 100.0 {
            SpeedRating::Excellent
        } else if avg >= 50.0 {
            SpeedRating::Good
        } else if avg >= 25.0 {
            SpeedRating::Average
        } else {
            SpeedRating::Poor
        }
    }
}

impl Model {
    /// Derived quality rating; a pure function of the stored speeds.
    pub fn rating(&self) -> SpeedRating {
        SpeedRating::from_speeds(self.download_mbps, self.upload_mbps)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::provider::Entity",
        from = "Column::ProviderId",
        to = "super::provider::Column::Id"
    )]
    Provider,
    #[sea_orm(has_many = "super::feedback::Entity")]
    Feedback,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::provider::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Provider.def()
    }
}

impl Related<super::feedback::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Feedback.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
