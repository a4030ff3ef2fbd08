//! # API Handlers
//!
//! This module contains all the HTTP endpoint handlers for the tezlik API.

use crate::models::ServiceInfo;
use axum::response::Json;

pub mod auth;
pub mod feedback;
pub mod home;
pub mod issues;
pub mod measurements;
pub mod providers;
pub mod statistics;
pub mod types;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

#[cfg(test)]
mod tests;
