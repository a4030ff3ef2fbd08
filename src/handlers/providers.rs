//! # Providers Endpoint Handler

use axum::{extract::State, response::Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::handlers::types::ProviderInfo;
use crate::repositories::ProviderRepository;
use crate::server::AppState;

/// Response payload for the providers listing
#[derive(Debug, Serialize, ToSchema)]
pub struct ProvidersResponse {
    /// Active providers, most recently seen first
    pub providers: Vec<ProviderInfo>,
}

/// List active providers
#[utoipa::path(
    get,
    path = "/api/providers",
    responses(
        (status = 200, description = "Providers listed successfully", body = ProvidersResponse)
    ),
    tag = "providers"
)]
pub async fn list_providers(
    State(state): State<AppState>,
) -> Result<Json<ProvidersResponse>, ApiError> {
    let providers = ProviderRepository::new(&state.db)
        .list_active()
        .await?
        .into_iter()
        .map(ProviderInfo::from)
        .collect();
    Ok(Json(ProvidersResponse { providers }))
}
