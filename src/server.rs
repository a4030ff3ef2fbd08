//! # Server Configuration
//!
//! This module contains the router setup and server startup for the tezlik
//! speed-test API.

use std::sync::Arc;

use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::auth::operator_auth_middleware;
use crate::config::AppConfig;
use crate::geo::GeoResolver;
use crate::handlers;
use crate::telemetry::{TraceContext, with_trace_context};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub geo: Arc<GeoResolver>,
}

impl AppState {
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Self {
        let geo = Arc::new(GeoResolver::new(config.geo.clone()));
        Self {
            config: Arc::new(config),
            db,
            geo,
        }
    }
}

/// Assign every request a trace ID and run the handler inside its scope.
async fn trace_context_middleware(request: Request, next: Next) -> Response {
    let context = TraceContext {
        trace_id: Uuid::new_v4().to_string(),
    };
    with_trace_context(context, next.run(request)).await
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    // Bulk resolve is the only operator-protected route.
    let operator_routes = Router::new()
        .route("/api/issues/resolve", post(handlers::issues::resolve_issues))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            operator_auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/api/home", get(handlers::home::home))
        .route("/api/tests", post(handlers::measurements::run_test))
        .route(
            "/api/tests/{id}",
            get(handlers::measurements::get_result).delete(handlers::measurements::delete_result),
        )
        .route(
            "/api/tests/{id}/feedback",
            post(handlers::feedback::submit_feedback),
        )
        .route("/api/history", get(handlers::measurements::list_history))
        .route("/api/statistics", get(handlers::statistics::get_statistics))
        .route("/api/providers", get(handlers::providers::list_providers))
        .route(
            "/api/issues",
            get(handlers::issues::list_issues).post(handlers::issues::report_issue),
        )
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .merge(operator_routes)
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    // Resolve the configured bind address
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let state = AppState::new(config, db);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::home::home,
        crate::handlers::measurements::run_test,
        crate::handlers::measurements::get_result,
        crate::handlers::measurements::delete_result,
        crate::handlers::measurements::list_history,
        crate::handlers::statistics::get_statistics,
        crate::handlers::feedback::submit_feedback,
        crate::handlers::providers::list_providers,
        crate::handlers::issues::list_issues,
        crate::handlers::issues::report_issue,
        crate::handlers::issues::resolve_issues,
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::measurement::SpeedRating,
            crate::models::network_issue::IssueType,
            crate::models::network_issue::Severity,
            crate::geo::GeoRecord,
            crate::handlers::types::MeasurementInfo,
            crate::handlers::types::ProviderInfo,
            crate::handlers::types::UserInfo,
            crate::handlers::types::FeedbackInfo,
            crate::handlers::types::IssueInfo,
            crate::handlers::measurements::RunTestRequest,
            crate::handlers::measurements::RunTestResponse,
            crate::handlers::measurements::MeasurementDetailResponse,
            crate::handlers::measurements::HistoryResponse,
            crate::handlers::statistics::StatisticsResponse,
            crate::handlers::statistics::RecentStatsInfo,
            crate::handlers::statistics::ProviderStatsInfo,
            crate::handlers::statistics::DailyCountInfo,
            crate::handlers::feedback::SubmitFeedbackRequest,
            crate::handlers::home::HomeResponse,
            crate::handlers::providers::ProvidersResponse,
            crate::handlers::issues::IssuesResponse,
            crate::handlers::issues::ReportIssueRequest,
            crate::handlers::issues::ResolveIssuesRequest,
            crate::handlers::issues::ResolveIssuesResponse,
            crate::handlers::auth::RegisterRequest,
            crate::handlers::auth::LoginRequest,
            crate::error::ApiError,
        )
    ),
    info(
        title = "Tezlik Speed Test API",
        description = "API for running simulated speed tests and tracking results",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
