//! IP geolocation resolution.
//!
//! Resolves a client IP to a normalized location/ISP record by querying a
//! fixed chain of external lookup services. The resolver never fails: local
//! addresses and exhausted fallback chains both yield a pinned default
//! record, and every per-provider error is logged and swallowed.

pub mod classifier;

use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::GeoConfig;

/// Normalized geolocation record shared by every lookup provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoRecord {
    pub ip: String,
    pub city: String,
    pub region: String,
    pub country: String,
    pub country_code: String,
    pub isp: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: String,
    pub postal: String,
    pub connection_type: String,
}

/// Errors internal to a single provider attempt. Never escapes
/// [`GeoResolver::resolve`]; used only for logging.
#[derive(Debug, thiserror::Error)]
enum LookupError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),
    #[error("provider reported failure")]
    ProviderFailure,
}

/// Resolver that tries ipapi.co, then ip-api.com, then ipwhois.app.
#[derive(Debug, Clone)]
pub struct GeoResolver {
    client: reqwest::Client,
    cfg: GeoConfig,
}

impl GeoResolver {
    pub fn new(cfg: GeoConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .unwrap_or_default();
        Self { client, cfg }
    }

    /// Resolve an IP address to a geolocation record. Never fails.
    ///
    /// Local addresses short-circuit to the default record without any
    /// outbound call. Otherwise the provider chain is tried in order and the
    /// first successful, parseable response wins.
    pub async fn resolve(&self, ip: &str) -> GeoRecord {
        if is_local_address(ip) {
            return default_record(ip);
        }

        match self.lookup_ipapi(ip).await {
            Ok(record) => {
                tracing::debug!(ip, provider = "ipapi.co", "Geolocation resolved");
                return record;
            }
            Err(err) => tracing::warn!(ip, provider = "ipapi.co", %err, "Geolocation lookup failed"),
        }

        match self.lookup_ip_api(ip).await {
            Ok(record) => {
                tracing::debug!(ip, provider = "ip-api.com", "Geolocation resolved");
                return record;
            }
            Err(err) => {
                tracing::warn!(ip, provider = "ip-api.com", %err, "Geolocation lookup failed")
            }
        }

        match self.lookup_ipwhois(ip).await {
            Ok(record) => {
                tracing::debug!(ip, provider = "ipwhois.app", "Geolocation resolved");
                return record;
            }
            Err(err) => {
                tracing::warn!(ip, provider = "ipwhois.app", %err, "Geolocation lookup failed")
            }
        }

        tracing::warn!(ip, "All geolocation providers failed, using default record");
        default_record(ip)
    }

    async fn lookup_ipapi(&self, ip: &str) -> Result<GeoRecord, LookupError> {
        let url = format!("{}/{}/json/", self.cfg.ipapi_base, ip);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(LookupError::Status(response.status()));
        }

        let data: IpapiResponse = response.json().await?;
        if data.error.unwrap_or(false) {
            return Err(LookupError::ProviderFailure);
        }

        Ok(GeoRecord {
            ip: ip.to_string(),
            city: data.city.unwrap_or_else(unknown),
            region: data.region.unwrap_or_else(unknown),
            country: data.country_name.unwrap_or_else(unknown),
            country_code: data.country_code.unwrap_or_else(default_country_code),
            isp: data.org.unwrap_or_else(unknown_isp),
            latitude: data.latitude,
            longitude: data.longitude,
            timezone: data.timezone.unwrap_or_else(default_timezone),
            postal: data.postal.unwrap_or_default(),
            connection_type: "Unknown".to_string(),
        })
    }

    async fn lookup_ip_api(&self, ip: &str) -> Result<GeoRecord, LookupError> {
        let url = format!("{}/json/{}", self.cfg.ip_api_base, ip);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(LookupError::Status(response.status()));
        }

        let data: IpApiResponse = response.json().await?;
        if data.status.as_deref() != Some("success") {
            return Err(LookupError::ProviderFailure);
        }

        Ok(GeoRecord {
            ip: ip.to_string(),
            city: data.city.unwrap_or_else(unknown),
            region: data.region_name.unwrap_or_else(unknown),
            country: data.country.unwrap_or_else(unknown),
            country_code: data.country_code.unwrap_or_else(default_country_code),
            isp: data.isp.unwrap_or_else(unknown_isp),
            latitude: data.lat,
            longitude: data.lon,
            timezone: data.timezone.unwrap_or_else(default_timezone),
            postal: data.zip.unwrap_or_default(),
            connection_type: "Unknown".to_string(),
        })
    }

    async fn lookup_ipwhois(&self, ip: &str) -> Result<GeoRecord, LookupError> {
        let url = format!("{}/json/{}", self.cfg.ipwhois_base, ip);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(LookupError::Status(response.status()));
        }

        let data: IpwhoisResponse = response.json().await?;
        if !data.success.unwrap_or(false) {
            return Err(LookupError::ProviderFailure);
        }

        Ok(GeoRecord {
            ip: ip.to_string(),
            city: data.city.unwrap_or_else(unknown),
            region: data.region.unwrap_or_else(unknown),
            country: data.country.unwrap_or_else(unknown),
            country_code: data.country_code.unwrap_or_else(default_country_code),
            isp: data.isp.unwrap_or_else(unknown_isp),
            latitude: data.latitude,
            longitude: data.longitude,
            timezone: data.timezone.unwrap_or_else(default_timezone),
            postal: String::new(),
            connection_type: data
                .connection_type
                .unwrap_or_else(|| "Unknown".to_string()),
        })
    }
}

/// True for addresses that must never trigger an outbound lookup.
pub fn is_local_address(ip: &str) -> bool {
    if matches!(ip, "127.0.0.1" | "localhost" | "::1") {
        return true;
    }
    ip.parse::<IpAddr>()
        .map(|addr| addr.is_loopback())
        .unwrap_or(false)
}

/// Fixed record returned for local addresses and exhausted fallback chains.
pub fn default_record(ip: &str) -> GeoRecord {
    GeoRecord {
        ip: ip.to_string(),
        city: "Toshkent".to_string(),
        region: "Toshkent viloyati".to_string(),
        country: "O'zbekiston".to_string(),
        country_code: "UZ".to_string(),
        isp: "UZTELECOM".to_string(),
        latitude: Some(41.2995),
        longitude: Some(69.2401),
        timezone: "Asia/Tashkent".to_string(),
        postal: "100000".to_string(),
        connection_type: "Unknown".to_string(),
    }
}

fn unknown() -> String {
    "Unknown".to_string()
}

fn unknown_isp() -> String {
    "Unknown ISP".to_string()
}

fn default_country_code() -> String {
    "UZ".to_string()
}

fn default_timezone() -> String {
    "Asia/Tashkent".to_string()
}

#[derive(Debug, Deserialize)]
struct IpapiResponse {
    error: Option<bool>,
    city: Option<String>,
    region: Option<String>,
    country_name: Option<String>,
    country_code: Option<String>,
    org: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    timezone: Option<String>,
    postal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: Option<String>,
    city: Option<String>,
    #[serde(rename = "regionName")]
    region_name: Option<String>,
    country: Option<String>,
    #[serde(rename = "countryCode")]
    country_code: Option<String>,
    isp: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    timezone: Option<String>,
    zip: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IpwhoisResponse {
    success: Option<bool>,
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
    isp: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    timezone: Option<String>,
    connection_type: Option<String>,
}
