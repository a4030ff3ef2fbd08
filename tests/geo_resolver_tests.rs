//! Integration tests for the geolocation fallback chain, using wiremock
//! servers in place of the three lookup providers.

use serde_json::json;
use tezlik::config::GeoConfig;
use tezlik::geo::{GeoResolver, default_record};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct GeoMocks {
    ipapi: MockServer,
    ip_api: MockServer,
    ipwhois: MockServer,
}

impl GeoMocks {
    async fn start() -> Self {
        Self {
            ipapi: MockServer::start().await,
            ip_api: MockServer::start().await,
            ipwhois: MockServer::start().await,
        }
    }

    fn resolver(&self) -> GeoResolver {
        GeoResolver::new(GeoConfig {
            ipapi_base: self.ipapi.uri(),
            ip_api_base: self.ip_api.uri(),
            ipwhois_base: self.ipwhois.uri(),
            timeout_ms: 2_000,
        })
    }
}

#[tokio::test]
async fn loopback_addresses_make_no_outbound_calls() {
    let mocks = GeoMocks::start().await;

    // Any request at all would be a failure.
    for server in [&mocks.ipapi, &mocks.ip_api, &mocks.ipwhois] {
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(server)
            .await;
    }

    let resolver = mocks.resolver();
    for ip in ["127.0.0.1", "::1", "localhost"] {
        let record = resolver.resolve(ip).await;
        assert_eq!(record.city, "Toshkent");
        assert_eq!(record.isp, "UZTELECOM");
        assert_eq!(record.ip, ip);
    }
}

#[tokio::test]
async fn first_provider_wins_when_it_succeeds() {
    let mocks = GeoMocks::start().await;

    Mock::given(method("GET"))
        .and(path("/8.8.8.8/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "city": "Samarqand",
            "region": "Samarqand viloyati",
            "country_name": "O'zbekiston",
            "country_code": "UZ",
            "org": "AS64500 Sarkor Telekom LLC",
            "latitude": 39.6542,
            "longitude": 66.9597,
            "timezone": "Asia/Samarkand",
            "postal": "140100"
        })))
        .expect(1)
        .mount(&mocks.ipapi)
        .await;

    // The rest of the chain must not be consulted.
    for server in [&mocks.ip_api, &mocks.ipwhois] {
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(server)
            .await;
    }

    let record = mocks.resolver().resolve("8.8.8.8").await;
    assert_eq!(record.city, "Samarqand");
    assert_eq!(record.isp, "AS64500 Sarkor Telekom LLC");
    assert_eq!(record.latitude, Some(39.6542));
    assert_eq!(record.postal, "140100");
    assert_eq!(record.timezone, "Asia/Samarkand");
}

#[tokio::test]
async fn error_flag_from_first_provider_triggers_fallback() {
    let mocks = GeoMocks::start().await;

    // ipapi.co reports failures with HTTP 200 and an error flag in the body.
    Mock::given(method("GET"))
        .and(path("/8.8.8.8/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": true,
            "reason": "RateLimited"
        })))
        .expect(1)
        .mount(&mocks.ipapi)
        .await;

    Mock::given(method("GET"))
        .and(path("/json/8.8.8.8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "city": "Buxoro",
            "regionName": "Buxoro viloyati",
            "country": "O'zbekiston",
            "countryCode": "UZ",
            "isp": "Turon Telecom",
            "lat": 39.7747,
            "lon": 64.4286,
            "timezone": "Asia/Samarkand",
            "zip": "200100"
        })))
        .expect(1)
        .mount(&mocks.ip_api)
        .await;

    let record = mocks.resolver().resolve("8.8.8.8").await;
    assert_eq!(record.city, "Buxoro");
    assert_eq!(record.region, "Buxoro viloyati");
    assert_eq!(record.isp, "Turon Telecom");
    assert_eq!(record.longitude, Some(64.4286));
    assert_eq!(record.postal, "200100");
}

#[tokio::test]
async fn third_provider_is_the_last_resort() {
    let mocks = GeoMocks::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mocks.ipapi)
        .await;

    // ip-api.com reports failures with status != "success".
    Mock::given(method("GET"))
        .and(path("/json/8.8.8.8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "fail",
            "message": "quota"
        })))
        .mount(&mocks.ip_api)
        .await;

    Mock::given(method("GET"))
        .and(path("/json/8.8.8.8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "city": "Namangan",
            "region": "Namangan viloyati",
            "country": "O'zbekiston",
            "country_code": "UZ",
            "isp": "EVO",
            "latitude": 41.0058,
            "longitude": 71.6436,
            "timezone": "Asia/Tashkent",
            "connection_type": "Cellular"
        })))
        .expect(1)
        .mount(&mocks.ipwhois)
        .await;

    let record = mocks.resolver().resolve("8.8.8.8").await;
    assert_eq!(record.city, "Namangan");
    assert_eq!(record.isp, "EVO");
    assert_eq!(record.connection_type, "Cellular");
    // ipwhois.app has no postal field.
    assert_eq!(record.postal, "");
}

#[tokio::test]
async fn exhausted_chain_falls_back_to_default_record() {
    let mocks = GeoMocks::start().await;

    for server in [&mocks.ipapi, &mocks.ip_api, &mocks.ipwhois] {
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(server)
            .await;
    }

    let record = mocks.resolver().resolve("8.8.8.8").await;
    assert_eq!(record, default_record("8.8.8.8"));
}

#[tokio::test]
async fn missing_fields_are_normalized() {
    let mocks = GeoMocks::start().await;

    // A bare-bones success response still yields a fully populated record.
    Mock::given(method("GET"))
        .and(path("/8.8.8.8/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "city": "Toshkent"
        })))
        .mount(&mocks.ipapi)
        .await;

    let record = mocks.resolver().resolve("8.8.8.8").await;
    assert_eq!(record.city, "Toshkent");
    assert_eq!(record.region, "Unknown");
    assert_eq!(record.isp, "Unknown ISP");
    assert_eq!(record.country_code, "UZ");
    assert_eq!(record.timezone, "Asia/Tashkent");
    assert_eq!(record.latitude, None);
}
