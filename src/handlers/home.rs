//! # Home Endpoint Handler
//!
//! Landing payload: the caller's resolved location and provider, their most
//! recent tests and the active provider list, assembled in one response.

use axum::{
    extract::State,
    http::HeaderMap,
    response::Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::resolve_identity;
use crate::error::ApiError;
use crate::geo::GeoRecord;
use crate::geo::classifier::identify_provider;
use crate::handlers::types::{MeasurementInfo, ProviderInfo, client_ip};
use crate::repositories::{MeasurementRepository, ProviderRepository};
use crate::server::AppState;

const RECENT_TESTS: u64 = 5;

/// Response payload for the home endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct HomeResponse {
    /// Resolved location for the caller's IP
    pub location: GeoRecord,
    /// Canonical ISP name recognized from the geolocation record
    #[schema(example = "UZTELECOM")]
    pub isp_name: String,
    /// The provider the caller is currently attributed to
    pub provider: ProviderInfo,
    /// The caller's most recent tests (empty without a session)
    pub recent_tests: Vec<MeasurementInfo>,
    /// All active providers
    pub providers: Vec<ProviderInfo>,
}

/// Landing payload with location, provider and recent activity
#[utoipa::path(
    get,
    path = "/api/home",
    responses(
        (status = 200, description = "Home payload assembled", body = HomeResponse),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "home"
)]
pub async fn home(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<HomeResponse>, ApiError> {
    let ip = client_ip(&headers);
    let location = state.geo.resolve(&ip).await;
    let isp_name = identify_provider(&location.isp);

    let provider_repo = ProviderRepository::new(&state.db);
    let provider = provider_repo.find_or_create(&location).await?;

    let recent_tests = match resolve_identity(&state.db, &headers).await? {
        Some(identity) => MeasurementRepository::new(&state.db)
            .recent_for_identity(&identity, RECENT_TESTS)
            .await?
            .into_iter()
            .map(MeasurementInfo::from)
            .collect(),
        None => Vec::new(),
    };

    let providers = provider_repo
        .list_active()
        .await?
        .into_iter()
        .map(ProviderInfo::from)
        .collect();

    Ok(Json(HomeResponse {
        location,
        isp_name,
        provider: provider.into(),
        recent_tests,
        providers,
    }))
}
