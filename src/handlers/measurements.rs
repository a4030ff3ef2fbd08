//! # Speed Test Endpoint Handlers
//!
//! Handlers for running a simulated speed test and for the owner-scoped
//! detail, delete and history endpoints.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::{ensure_identity, resolve_identity};
use crate::cursor::{decode_cursor, encode_cursor};
use crate::error::{ApiError, not_found};
use crate::geo::classifier::identify_provider;
use crate::handlers::statistics::ProviderStatsInfo;
use crate::handlers::types::{FeedbackInfo, MeasurementInfo, ProviderInfo, client_ip};
use crate::models::measurement;
use crate::repositories::{FeedbackRepository, MeasurementRepository, ProviderRepository};
use crate::repositories::measurement::HistoryFilter;
use crate::server::AppState;
use crate::speedtest;

/// Connection modes a test can be run in.
const CONNECTION_TYPES: [&str; 2] = ["multi", "single"];

/// Request payload for running a speed test. The body is optional; an
/// absent body runs a multi-connection test.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RunTestRequest {
    /// `multi` (default) or `single`
    pub connection_type: Option<String>,
}

/// Response payload for a completed speed test
#[derive(Debug, Serialize, ToSchema)]
pub struct RunTestResponse {
    /// The recorded measurement, including its derived rating
    pub measurement: MeasurementInfo,
    /// The provider the test was attributed to
    pub provider: ProviderInfo,
    /// Canonical ISP name recognized from the geolocation record
    #[schema(example = "UZTELECOM")]
    pub isp_name: String,
}

/// Run a simulated speed test and record the result
#[utoipa::path(
    post,
    path = "/api/tests",
    request_body(content = RunTestRequest, description = "Optional test options"),
    responses(
        (status = 201, description = "Measurement recorded", body = RunTestResponse),
        (status = 400, description = "Invalid connection type", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "tests"
)]
pub async fn run_test(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RunTestRequest>>,
) -> Result<Response, ApiError> {
    let request = body.map(|Json(inner)| inner).unwrap_or_default();
    let connection_type = match request.connection_type {
        None => "multi".to_string(),
        Some(raw) => {
            let tag = raw.trim().to_lowercase();
            if !CONNECTION_TYPES.contains(&tag.as_str()) {
                return Err(ApiError::new(
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_FAILED",
                    "connection_type must be \"multi\" or \"single\"",
                ));
            }
            tag
        }
    };

    let (identity, set_cookie) = ensure_identity(&state.db, &headers).await?;

    let ip = client_ip(&headers);
    let geo = state.geo.resolve(&ip).await;
    let isp_name = identify_provider(&geo.isp);

    let provider = ProviderRepository::new(&state.db).find_or_create(&geo).await?;

    let generated = speedtest::generate();
    let session_token = match identity.user_id() {
        Some(_) => None,
        None => Some(identity.session_token()),
    };

    let created = MeasurementRepository::new(&state.db)
        .create(measurement::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(identity.user_id()),
            session_token: Set(session_token),
            provider_id: Set(Some(provider.id)),
            download_mbps: Set(generated.download_mbps),
            upload_mbps: Set(generated.upload_mbps),
            ping_ms: Set(generated.ping_ms),
            jitter_ms: Set(Some(generated.jitter_ms)),
            packet_loss_pct: Set(generated.packet_loss_pct),
            connection_type: Set(connection_type),
            ip_address: Set(Some(ip)),
            test_date: Set(Utc::now().into()),
        })
        .await?;

    tracing::info!(
        measurement = %created.id,
        provider = %provider.name,
        "Recorded speed test"
    );

    let body = RunTestResponse {
        measurement: created.into(),
        provider: provider.into(),
        isp_name,
    };

    let mut response = (StatusCode::CREATED, Json(body)).into_response();
    if let Some(cookie) = set_cookie {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(SET_COOKIE, value);
        }
    }
    Ok(response)
}

/// Response payload for the measurement detail endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct MeasurementDetailResponse {
    pub measurement: MeasurementInfo,
    /// The provider the test was attributed to, if still present
    pub provider: Option<ProviderInfo>,
    /// Aggregates across every recorded test for that provider, for
    /// comparison against this result
    pub provider_stats: Option<ProviderStatsInfo>,
    /// Feedback left on this measurement, newest first
    pub feedback: Vec<FeedbackInfo>,
}

/// Fetch a single measurement owned by the caller, with its provider
/// context and feedback
#[utoipa::path(
    get,
    path = "/api/tests/{id}",
    params(("id" = Uuid, Path, description = "Measurement ID")),
    responses(
        (status = 200, description = "Measurement found", body = MeasurementDetailResponse),
        (status = 404, description = "Measurement not found or owned by someone else", body = ApiError)
    ),
    tag = "tests"
)]
pub async fn get_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<MeasurementDetailResponse>, ApiError> {
    let Some(identity) = resolve_identity(&state.db, &headers).await? else {
        return Err(not_found(Some("Measurement not found")));
    };

    let repo = MeasurementRepository::new(&state.db);
    let measurement = repo
        .find_owned(id, &identity)
        .await?
        .ok_or_else(|| not_found(Some("Measurement not found")))?;

    let mut provider = None;
    let mut provider_stats = None;
    if let Some(provider_id) = measurement.provider_id {
        let model = ProviderRepository::new(&state.db)
            .find_by_id(provider_id)
            .await?;
        provider_stats = repo.stats_for_provider(provider_id).await?.map(|row| {
            ProviderStatsInfo {
                provider_id: provider_id.to_string(),
                provider_name: model
                    .as_ref()
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                test_count: row.test_count,
                avg_download_mbps: row.avg_download,
                avg_upload_mbps: row.avg_upload,
                avg_ping_ms: row.avg_ping,
            }
        });
        provider = model.map(ProviderInfo::from);
    }

    let feedback = FeedbackRepository::new(&state.db)
        .list_for_measurement(measurement.id)
        .await?
        .into_iter()
        .map(FeedbackInfo::from)
        .collect();

    Ok(Json(MeasurementDetailResponse {
        measurement: measurement.into(),
        provider,
        provider_stats,
        feedback,
    }))
}

/// Delete a measurement owned by the caller
#[utoipa::path(
    delete,
    path = "/api/tests/{id}",
    params(("id" = Uuid, Path, description = "Measurement ID")),
    responses(
        (status = 204, description = "Measurement deleted"),
        (status = 404, description = "Measurement not found or owned by someone else", body = ApiError)
    ),
    tag = "tests"
)]
pub async fn delete_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let Some(identity) = resolve_identity(&state.db, &headers).await? else {
        return Err(not_found(Some("Measurement not found")));
    };

    let deleted = MeasurementRepository::new(&state.db)
        .delete_owned(id, &identity)
        .await?;
    if !deleted {
        return Err(not_found(Some("Measurement not found")));
    }

    tracing::info!(measurement = %id, "Deleted measurement");
    Ok(StatusCode::NO_CONTENT)
}

/// Query parameters for listing test history
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct HistoryQuery {
    /// Filter by provider ID (UUID)
    pub provider_id: Option<String>,
    /// Filter for tests run after this timestamp (RFC3339)
    pub date_from: Option<String>,
    /// Filter for tests run before this timestamp (RFC3339)
    pub date_to: Option<String>,
    /// Filter by connection type
    pub connection_type: Option<String>,
    /// Maximum number of tests to return (default: 20, max: 100)
    pub limit: Option<i64>,
    /// Opaque cursor for pagination continuation
    pub cursor: Option<String>,
}

/// Response payload for the history endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryResponse {
    /// Tests matching the query, newest first
    pub tests: Vec<MeasurementInfo>,
    /// Opaque cursor for fetching the next page (null if this is the last page)
    pub next_cursor: Option<String>,
}

/// List the caller's test history with filters and cursor pagination
#[utoipa::path(
    get,
    path = "/api/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "History listed successfully", body = HistoryResponse),
        (status = 400, description = "Invalid query parameters", body = ApiError)
    ),
    tag = "tests"
)]
pub async fn list_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limit = query.limit.unwrap_or(20);
    if limit < 1 || limit > 100 {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "limit must be between 1 and 100",
        ));
    }

    let provider_id = match query.provider_id {
        Some(raw) => match Uuid::from_str(&raw) {
            Ok(uuid) => Some(uuid),
            Err(_) => {
                return Err(ApiError::new(
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_FAILED",
                    "provider_id must be a valid UUID",
                ));
            }
        },
        None => None,
    };

    let date_from = parse_timestamp(query.date_from.as_deref(), "date_from")?;
    let date_to = parse_timestamp(query.date_to.as_deref(), "date_to")?;

    let cursor_data = match query.cursor {
        Some(ref raw) => Some(decode_cursor(raw)?),
        None => None,
    };

    // A caller with no session owns no history.
    let Some(identity) = resolve_identity(&state.db, &headers).await? else {
        return Ok(Json(HistoryResponse {
            tests: Vec::new(),
            next_cursor: None,
        }));
    };

    let filter = HistoryFilter {
        provider_id,
        date_from,
        date_to,
        connection_type: query.connection_type,
    };

    // Fetch one extra row to determine whether there is a next page.
    let mut rows = MeasurementRepository::new(&state.db)
        .list_history(&identity, &filter, cursor_data, (limit + 1) as u64)
        .await?;

    let has_more = rows.len() > limit as usize;
    if has_more {
        rows.truncate(limit as usize);
    }

    let next_cursor = if has_more {
        rows.last()
            .map(|last| encode_cursor(&last.test_date.with_timezone(&Utc), &last.id))
    } else {
        None
    };

    let tests = rows.into_iter().map(MeasurementInfo::from).collect();
    Ok(Json(HistoryResponse { tests, next_cursor }))
}

fn parse_timestamp(raw: Option<&str>, field: &str) -> Result<Option<DateTime<Utc>>, ApiError> {
    match raw {
        None => Ok(None),
        Some(value) => DateTime::parse_from_rfc3339(value)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|_| {
                ApiError::new(
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_FAILED",
                    &format!("{} must be a valid RFC3339 timestamp", field),
                )
            }),
    }
}
