//! # Statistics Endpoint Handler
//!
//! Owner-scoped aggregates: total test count, 30-day averages and extremes,
//! per-provider breakdown and a 7-day activity series.

use std::collections::HashMap;

use axum::{
    extract::State,
    http::HeaderMap,
    response::Json,
};
use chrono::{Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::resolve_identity;
use crate::error::ApiError;
use crate::repositories::{MeasurementRepository, ProviderRepository};
use crate::server::AppState;

/// Aggregates over the last 30 days of the caller's tests
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct RecentStatsInfo {
    pub avg_download_mbps: Option<f64>,
    pub avg_upload_mbps: Option<f64>,
    pub avg_ping_ms: Option<f64>,
    pub max_download_mbps: Option<f64>,
    pub max_upload_mbps: Option<f64>,
    pub min_ping_ms: Option<f64>,
}

/// Per-provider aggregate for the caller's tests
#[derive(Debug, Serialize, ToSchema)]
pub struct ProviderStatsInfo {
    pub provider_id: String,
    #[schema(example = "UZTELECOM")]
    pub provider_name: String,
    pub test_count: i64,
    pub avg_download_mbps: Option<f64>,
    pub avg_upload_mbps: Option<f64>,
    pub avg_ping_ms: Option<f64>,
}

/// One day of test activity
#[derive(Debug, Serialize, ToSchema)]
pub struct DailyCountInfo {
    /// Calendar date (UTC)
    #[schema(example = "2024-01-15")]
    pub date: String,
    pub count: i64,
}

/// Response payload for the statistics endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct StatisticsResponse {
    /// Total number of tests the caller owns
    pub total_tests: u64,
    /// Aggregates over the last 30 days
    pub recent: RecentStatsInfo,
    /// Per-provider breakdown (providers with at least one test)
    pub providers: Vec<ProviderStatsInfo>,
    /// Daily test counts over the last 7 days
    pub daily: Vec<DailyCountInfo>,
}

/// Aggregate statistics over the caller's test history
#[utoipa::path(
    get,
    path = "/api/statistics",
    responses(
        (status = 200, description = "Statistics computed successfully", body = StatisticsResponse),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "statistics"
)]
pub async fn get_statistics(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<StatisticsResponse>, ApiError> {
    // A caller with no session owns no tests; everything is empty.
    let Some(identity) = resolve_identity(&state.db, &headers).await? else {
        return Ok(Json(StatisticsResponse {
            total_tests: 0,
            recent: RecentStatsInfo::default(),
            providers: Vec::new(),
            daily: Vec::new(),
        }));
    };

    let repo = MeasurementRepository::new(&state.db);
    let now = Utc::now();

    let total_tests = repo.count_for_identity(&identity).await?;
    let recent = repo.recent_stats(&identity, now - Duration::days(30)).await?;
    let provider_rows = repo.provider_stats(&identity).await?;
    let daily_rows = repo.daily_counts(&identity, now - Duration::days(7)).await?;

    // Resolve provider names for the breakdown in one query.
    let provider_ids: Vec<_> = provider_rows.iter().filter_map(|row| row.provider_id).collect();
    let names: HashMap<_, _> = ProviderRepository::new(&state.db)
        .find_by_ids(&provider_ids)
        .await?
        .into_iter()
        .map(|provider| (provider.id, provider.name))
        .collect();

    let providers = provider_rows
        .into_iter()
        .filter_map(|row| {
            let provider_id = row.provider_id?;
            Some(ProviderStatsInfo {
                provider_id: provider_id.to_string(),
                provider_name: names
                    .get(&provider_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string()),
                test_count: row.test_count,
                avg_download_mbps: row.avg_download,
                avg_upload_mbps: row.avg_upload,
                avg_ping_ms: row.avg_ping,
            })
        })
        .collect();

    let daily = daily_rows
        .into_iter()
        .map(|(date, count)| DailyCountInfo {
            date: date.to_string(),
            count,
        })
        .collect();

    Ok(Json(StatisticsResponse {
        total_tests,
        recent: RecentStatsInfo {
            avg_download_mbps: recent.avg_download,
            avg_upload_mbps: recent.avg_upload,
            avg_ping_ms: recent.avg_ping,
            max_download_mbps: recent.max_download,
            max_upload_mbps: recent.max_upload,
            min_ping_ms: recent.min_ping,
        },
        providers,
        daily,
    }))
}
