//! # Measurement Repository
//!
//! Identity-scoped data access for speed-test measurements: creation,
//! owner-narrowed reads and deletes, filtered history with cursor
//! pagination, and the aggregate queries behind the statistics view.
//!
//! Ownership is implemented by narrowing every query with the owner
//! condition rather than by separate permission checks, so a foreign row is
//! indistinguishable from a missing one.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::auth::Identity;
use crate::cursor::CursorData;
use crate::models::measurement::{self, Entity as Measurement};

/// Optional filters for the history listing.
#[derive(Debug, Default, Clone)]
pub struct HistoryFilter {
    pub provider_id: Option<Uuid>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub connection_type: Option<String>,
}

/// Aggregates over a recent time window.
#[derive(Debug, Default, Clone, FromQueryResult)]
pub struct RecentStats {
    pub avg_download: Option<f64>,
    pub avg_upload: Option<f64>,
    pub avg_ping: Option<f64>,
    pub max_download: Option<f64>,
    pub max_upload: Option<f64>,
    pub min_ping: Option<f64>,
}

/// Per-provider aggregate row (only providers with at least one test).
#[derive(Debug, Clone, FromQueryResult)]
pub struct ProviderStatsRow {
    pub provider_id: Option<Uuid>,
    pub test_count: i64,
    pub avg_download: Option<f64>,
    pub avg_upload: Option<f64>,
    pub avg_ping: Option<f64>,
}

/// Repository for measurement database operations
pub struct MeasurementRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> MeasurementRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, measurement: measurement::ActiveModel) -> Result<measurement::Model> {
        let created = measurement.insert(self.db).await?;
        Ok(created)
    }

    /// Finds a measurement regardless of owner (feedback submission has no
    /// ownership check by design).
    pub async fn find_any(&self, id: Uuid) -> Result<Option<measurement::Model>> {
        let measurement = Measurement::find_by_id(id).one(self.db).await?;
        Ok(measurement)
    }

    /// Finds a measurement visible to the given identity.
    pub async fn find_owned(
        &self,
        id: Uuid,
        identity: &Identity,
    ) -> Result<Option<measurement::Model>> {
        let measurement = Measurement::find_by_id(id)
            .filter(owner_condition(identity))
            .one(self.db)
            .await?;
        Ok(measurement)
    }

    /// Deletes a measurement if and only if the identity owns it.
    ///
    /// Returns whether a row was deleted; a foreign or missing id deletes
    /// nothing.
    pub async fn delete_owned(&self, id: Uuid, identity: &Identity) -> Result<bool> {
        let result = Measurement::delete_many()
            .filter(measurement::Column::Id.eq(id))
            .filter(owner_condition(identity))
            .exec(self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// The identity's most recent measurements, newest first.
    pub async fn recent_for_identity(
        &self,
        identity: &Identity,
        limit: u64,
    ) -> Result<Vec<measurement::Model>> {
        let measurements = Measurement::find()
            .filter(owner_condition(identity))
            .order_by_desc(measurement::Column::TestDate)
            .order_by_desc(measurement::Column::Id)
            .limit(limit)
            .all(self.db)
            .await?;
        Ok(measurements)
    }

    /// Filtered, cursor-paginated history for the identity.
    ///
    /// Ordered by `test_date DESC, id DESC` for stability.
    pub async fn list_history(
        &self,
        identity: &Identity,
        filter: &HistoryFilter,
        cursor: Option<CursorData>,
        limit: u64,
    ) -> Result<Vec<measurement::Model>> {
        let mut query = Measurement::find().filter(owner_condition(identity));

        if let Some(provider_id) = filter.provider_id {
            query = query.filter(measurement::Column::ProviderId.eq(provider_id));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(measurement::Column::TestDate.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(measurement::Column::TestDate.lte(to));
        }
        if let Some(ref connection_type) = filter.connection_type {
            query = query.filter(measurement::Column::ConnectionType.eq(connection_type.clone()));
        }

        if let Some(cursor) = cursor {
            query = query.filter(
                Condition::any()
                    .add(measurement::Column::TestDate.lt(cursor.test_date))
                    .add(
                        Condition::all()
                            .add(measurement::Column::TestDate.eq(cursor.test_date))
                            .add(measurement::Column::Id.lt(cursor.id)),
                    ),
            );
        }

        let measurements = query
            .order_by_desc(measurement::Column::TestDate)
            .order_by_desc(measurement::Column::Id)
            .limit(limit)
            .all(self.db)
            .await?;
        Ok(measurements)
    }

    /// Total number of measurements owned by the identity.
    pub async fn count_for_identity(&self, identity: &Identity) -> Result<u64> {
        let count = Measurement::find()
            .filter(owner_condition(identity))
            .count(self.db)
            .await?;
        Ok(count)
    }

    /// Window aggregates (averages, maxima, minimum ping) over the
    /// identity's measurements since the given instant.
    pub async fn recent_stats(
        &self,
        identity: &Identity,
        since: DateTime<Utc>,
    ) -> Result<RecentStats> {
        let stats = Measurement::find()
            .select_only()
            .expr_as(
                Expr::cust("CAST(AVG(download_mbps) AS DOUBLE PRECISION)"),
                "avg_download",
            )
            .expr_as(
                Expr::cust("CAST(AVG(upload_mbps) AS DOUBLE PRECISION)"),
                "avg_upload",
            )
            .expr_as(
                Expr::cust("CAST(AVG(ping_ms) AS DOUBLE PRECISION)"),
                "avg_ping",
            )
            .expr_as(
                Expr::cust("CAST(MAX(download_mbps) AS DOUBLE PRECISION)"),
                "max_download",
            )
            .expr_as(
                Expr::cust("CAST(MAX(upload_mbps) AS DOUBLE PRECISION)"),
                "max_upload",
            )
            .expr_as(
                Expr::cust("CAST(MIN(ping_ms) AS DOUBLE PRECISION)"),
                "min_ping",
            )
            .filter(owner_condition(identity))
            .filter(measurement::Column::TestDate.gte(since))
            .into_model::<RecentStats>()
            .one(self.db)
            .await?;
        Ok(stats.unwrap_or_default())
    }

    /// Per-provider counts and averages over the identity's measurements.
    pub async fn provider_stats(&self, identity: &Identity) -> Result<Vec<ProviderStatsRow>> {
        let rows = Measurement::find()
            .select_only()
            .column(measurement::Column::ProviderId)
            .expr_as(Expr::cust("COUNT(*)"), "test_count")
            .expr_as(
                Expr::cust("CAST(AVG(download_mbps) AS DOUBLE PRECISION)"),
                "avg_download",
            )
            .expr_as(
                Expr::cust("CAST(AVG(upload_mbps) AS DOUBLE PRECISION)"),
                "avg_upload",
            )
            .expr_as(
                Expr::cust("CAST(AVG(ping_ms) AS DOUBLE PRECISION)"),
                "avg_ping",
            )
            .filter(owner_condition(identity))
            .filter(measurement::Column::ProviderId.is_not_null())
            .group_by(measurement::Column::ProviderId)
            .into_model::<ProviderStatsRow>()
            .all(self.db)
            .await?;
        Ok(rows)
    }

    /// Counts and averages across every measurement attributed to the
    /// provider, regardless of owner. Backs the detail view's provider
    /// comparison; `None` when the provider has no recorded tests.
    pub async fn stats_for_provider(&self, provider_id: Uuid) -> Result<Option<ProviderStatsRow>> {
        let row = Measurement::find()
            .select_only()
            .column(measurement::Column::ProviderId)
            .expr_as(Expr::cust("COUNT(*)"), "test_count")
            .expr_as(
                Expr::cust("CAST(AVG(download_mbps) AS DOUBLE PRECISION)"),
                "avg_download",
            )
            .expr_as(
                Expr::cust("CAST(AVG(upload_mbps) AS DOUBLE PRECISION)"),
                "avg_upload",
            )
            .expr_as(
                Expr::cust("CAST(AVG(ping_ms) AS DOUBLE PRECISION)"),
                "avg_ping",
            )
            .filter(measurement::Column::ProviderId.eq(provider_id))
            .group_by(measurement::Column::ProviderId)
            .into_model::<ProviderStatsRow>()
            .one(self.db)
            .await?;
        Ok(row)
    }

    /// Per-day test counts since the given instant, in date order.
    ///
    /// Bucketing happens in Rust to stay portable across Postgres and
    /// SQLite date functions.
    pub async fn daily_counts(
        &self,
        identity: &Identity,
        since: DateTime<Utc>,
    ) -> Result<Vec<(NaiveDate, i64)>> {
        let dates: Vec<sea_orm::prelude::DateTimeWithTimeZone> = Measurement::find()
            .select_only()
            .column(measurement::Column::TestDate)
            .filter(owner_condition(identity))
            .filter(measurement::Column::TestDate.gte(since))
            .into_tuple()
            .all(self.db)
            .await?;

        let mut buckets = std::collections::BTreeMap::new();
        for date in dates {
            *buckets.entry(date.date_naive()).or_insert(0i64) += 1;
        }
        Ok(buckets.into_iter().collect())
    }
}

/// Narrowing condition implementing ownership.
///
/// Registered owners match on user id; anonymous owners match on session
/// token with no user attached, so a user's history never mixes with
/// anonymous rows and vice versa.
pub fn owner_condition(identity: &Identity) -> Condition {
    match identity {
        Identity::User { user_id, .. } => {
            Condition::all().add(measurement::Column::UserId.eq(*user_id))
        }
        Identity::Anonymous { session } => Condition::all()
            .add(measurement::Column::SessionToken.eq(*session))
            .add(measurement::Column::UserId.is_null()),
    }
}
