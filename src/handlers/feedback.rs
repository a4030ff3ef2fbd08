//! # Feedback Endpoint Handler
//!
//! Attaches a 0-10 rating and optional comment to a measurement. Any caller
//! may rate any measurement; only deletion is owner-scoped.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, not_found, validation_error};
use crate::handlers::types::FeedbackInfo;
use crate::models::feedback;
use crate::repositories::{FeedbackRepository, MeasurementRepository};
use crate::server::AppState;

/// Request payload for submitting feedback
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitFeedbackRequest {
    /// Rating from 0 to 10 inclusive
    #[schema(example = 8)]
    pub rating: i32,
    /// Optional free-form comment
    pub comment: Option<String>,
}

/// Submit feedback for a measurement
#[utoipa::path(
    post,
    path = "/api/tests/{id}/feedback",
    params(("id" = Uuid, Path, description = "Measurement ID")),
    request_body = SubmitFeedbackRequest,
    responses(
        (status = 201, description = "Feedback recorded", body = FeedbackInfo),
        (status = 400, description = "Invalid rating", body = ApiError),
        (status = 404, description = "Measurement not found", body = ApiError)
    ),
    tag = "feedback"
)]
pub async fn submit_feedback(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SubmitFeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackInfo>), ApiError> {
    if request.rating < 0 || request.rating > 10 {
        return Err(validation_error(
            "Invalid feedback",
            json!({"rating": "must be between 0 and 10"}),
        ));
    }

    let measurement = MeasurementRepository::new(&state.db)
        .find_any(id)
        .await?
        .ok_or_else(|| not_found(Some("Measurement not found")))?;

    let created = FeedbackRepository::new(&state.db)
        .create(feedback::ActiveModel {
            id: Set(Uuid::new_v4()),
            measurement_id: Set(measurement.id),
            rating: Set(request.rating),
            comment: Set(request.comment),
            created_at: Set(Utc::now().into()),
        })
        .await?;

    tracing::info!(measurement = %id, rating = created.rating, "Recorded feedback");
    Ok((StatusCode::CREATED, Json(created.into())))
}
