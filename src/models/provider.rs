//! Provider entity model
//!
//! A provider row represents a detected ISP and its approximate location.
//! Identity is informal: rows are matched by case-insensitive substring on
//! name, so near-duplicates can accumulate. Rows are created lazily by the
//! provider registry and never updated afterwards.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "providers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Display name derived from the geolocation ISP string
    pub name: String,

    /// "City, Region" string observed at creation time
    pub location: String,

    /// IP address that first resolved to this provider
    pub ip_address: String,

    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::measurement::Entity")]
    Measurement,
}

impl Related<super::measurement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Measurement.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
