//! Shared API response types.
//!
//! Entity models are never serialized directly; these wrappers pin the wire
//! format (string ids, RFC3339 timestamps) independently of storage types.

use axum::http::HeaderMap;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::measurement::SpeedRating;
use crate::models::{feedback, measurement, network_issue, provider, user};

/// A recorded speed test in API form.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeasurementInfo {
    /// Unique identifier for the measurement
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: String,
    /// Identifier of the detected provider, if one was resolved
    pub provider_id: Option<String>,
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub ping_ms: i32,
    pub jitter_ms: Option<i32>,
    pub packet_loss_pct: f64,
    /// `multi` or `single`
    pub connection_type: String,
    pub ip_address: Option<String>,
    /// Quality tier derived from the average of download and upload speed
    pub rating: SpeedRating,
    /// Timestamp when the test ran
    #[schema(example = "2024-01-15T10:30:00Z")]
    pub test_date: String,
}

impl From<measurement::Model> for MeasurementInfo {
    fn from(model: measurement::Model) -> Self {
        let rating = model.rating();
        Self {
            id: model.id.to_string(),
            provider_id: model.provider_id.map(|id| id.to_string()),
            download_mbps: model.download_mbps,
            upload_mbps: model.upload_mbps,
            ping_ms: model.ping_ms,
            jitter_ms: model.jitter_ms,
            packet_loss_pct: model.packet_loss_pct,
            connection_type: model.connection_type,
            ip_address: model.ip_address,
            rating,
            test_date: model.test_date.to_rfc3339(),
        }
    }
}

/// A detected ISP in API form.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProviderInfo {
    pub id: String,
    #[schema(example = "UZTELECOM")]
    pub name: String,
    /// "City, Region" observed when the provider was first seen
    pub location: String,
    pub is_active: bool,
    pub created_at: String,
}

impl From<provider::Model> for ProviderInfo {
    fn from(model: provider::Model) -> Self {
        Self {
            id: model.id.to_string(),
            name: model.name,
            location: model.location,
            is_active: model.is_active,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// A registered account in API form. Never carries credential material.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: String,
}

impl From<user::Model> for UserInfo {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id.to_string(),
            username: model.username,
            email: model.email,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// A feedback row in API form.
#[derive(Debug, Serialize, ToSchema)]
pub struct FeedbackInfo {
    pub id: String,
    pub measurement_id: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: String,
}

impl From<feedback::Model> for FeedbackInfo {
    fn from(model: feedback::Model) -> Self {
        Self {
            id: model.id.to_string(),
            measurement_id: model.measurement_id.to_string(),
            rating: model.rating,
            comment: model.comment,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// A reported network issue in API form.
#[derive(Debug, Serialize, ToSchema)]
pub struct IssueInfo {
    pub id: String,
    #[schema(example = "Internet banking")]
    pub service_name: String,
    pub issue_type: String,
    pub severity: String,
    pub reported_at: String,
    pub resolved_at: Option<String>,
    pub is_resolved: bool,
}

impl From<network_issue::Model> for IssueInfo {
    fn from(model: network_issue::Model) -> Self {
        Self {
            id: model.id.to_string(),
            service_name: model.service_name,
            issue_type: model.issue_type,
            severity: model.severity,
            reported_at: model.reported_at.to_rfc3339(),
            resolved_at: model.resolved_at.map(|dt| dt.to_rfc3339()),
            is_resolved: model.is_resolved,
        }
    }
}

/// Client IP for geolocation: first `X-Forwarded-For` entry, falling back
/// to loopback when the header is absent or unreadable.
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| raw.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| "127.0.0.1".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn client_ip_takes_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers), "203.0.113.9");
    }

    #[test]
    fn client_ip_defaults_to_loopback() {
        assert_eq!(client_ip(&HeaderMap::new()), "127.0.0.1");

        let mut empty = HeaderMap::new();
        empty.insert("x-forwarded-for", HeaderValue::from_static(""));
        assert_eq!(client_ip(&empty), "127.0.0.1");
    }
}
