//! # Network Issue Board Handlers
//!
//! Public listing and reporting of service outages, plus the
//! operator-protected bulk resolve action.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, validation_error};
use crate::handlers::types::IssueInfo;
use crate::models::network_issue::{self, IssueType, Severity};
use crate::repositories::NetworkIssueRepository;
use crate::server::AppState;

/// Response payload for the issue board
#[derive(Debug, Serialize, ToSchema)]
pub struct IssuesResponse {
    /// Unresolved issues, most recently reported first
    pub issues: Vec<IssueInfo>,
}

/// List unresolved network issues
#[utoipa::path(
    get,
    path = "/api/issues",
    responses(
        (status = 200, description = "Issues listed successfully", body = IssuesResponse)
    ),
    tag = "issues"
)]
pub async fn list_issues(State(state): State<AppState>) -> Result<Json<IssuesResponse>, ApiError> {
    let issues = NetworkIssueRepository::new(&state.db)
        .list_unresolved()
        .await?
        .into_iter()
        .map(IssueInfo::from)
        .collect();
    Ok(Json(IssuesResponse { issues }))
}

/// Request payload for reporting an issue
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReportIssueRequest {
    /// Name of the affected service
    #[schema(example = "Internet banking")]
    pub service_name: String,
    /// One of `outage`, `slow`, `intermittent`
    pub issue_type: IssueType,
    /// One of `low`, `medium`, `high` (default: `medium`)
    pub severity: Option<Severity>,
}

/// Report a network issue
#[utoipa::path(
    post,
    path = "/api/issues",
    request_body = ReportIssueRequest,
    responses(
        (status = 201, description = "Issue recorded", body = IssueInfo),
        (status = 400, description = "Invalid issue report", body = ApiError)
    ),
    tag = "issues"
)]
pub async fn report_issue(
    State(state): State<AppState>,
    Json(request): Json<ReportIssueRequest>,
) -> Result<(StatusCode, Json<IssueInfo>), ApiError> {
    let service_name = request.service_name.trim();
    if service_name.is_empty() {
        return Err(validation_error(
            "Invalid issue report",
            json!({"service_name": "cannot be empty"}),
        ));
    }

    let severity = request.severity.unwrap_or(Severity::Medium);
    let created = NetworkIssueRepository::new(&state.db)
        .create(network_issue::ActiveModel {
            id: Set(Uuid::new_v4()),
            service_name: Set(service_name.to_string()),
            issue_type: Set(request.issue_type.as_str().to_string()),
            severity: Set(severity.as_str().to_string()),
            reported_at: Set(Utc::now().into()),
            resolved_at: Set(None),
            is_resolved: Set(false),
        })
        .await?;

    tracing::info!(
        service = %created.service_name,
        issue_type = %created.issue_type,
        "Reported network issue"
    );
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Request payload for the bulk resolve action
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveIssuesRequest {
    /// IDs of the issues to mark resolved
    pub ids: Vec<Uuid>,
}

/// Response payload for the bulk resolve action
#[derive(Debug, Serialize, ToSchema)]
pub struct ResolveIssuesResponse {
    /// Number of issues actually flipped to resolved
    pub resolved: u64,
}

/// Mark a batch of issues resolved (operator only)
#[utoipa::path(
    post,
    path = "/api/issues/resolve",
    security(("bearer_auth" = [])),
    request_body = ResolveIssuesRequest,
    responses(
        (status = 200, description = "Issues resolved", body = ResolveIssuesResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "issues"
)]
pub async fn resolve_issues(
    State(state): State<AppState>,
    Json(request): Json<ResolveIssuesRequest>,
) -> Result<Json<ResolveIssuesResponse>, ApiError> {
    let resolved = NetworkIssueRepository::new(&state.db)
        .resolve_many(&request.ids)
        .await?;

    tracing::info!(resolved, requested = request.ids.len(), "Resolved network issues");
    Ok(Json(ResolveIssuesResponse { resolved }))
}
