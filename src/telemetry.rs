//! Tracing setup and the request-scoped trace ID.
//!
//! Handlers never touch this module directly; the router's middleware opens
//! a trace scope per request and `ApiError` reads the ID back when building
//! an error body.

use std::sync::OnceLock;

use log::LevelFilter;
use thiserror::Error;
use tokio::task_local;
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

use crate::config::AppConfig;

/// Correlation data carried for the duration of one request.
#[derive(Debug, Clone)]
pub struct TraceContext {
    pub trace_id: String,
}

task_local! {
    static ACTIVE_TRACE_CONTEXT: TraceContext;
}

#[derive(Debug, Error)]
pub enum TelemetryInitError {
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(String),
}

static TELEMETRY_INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// Install the global subscriber once; later calls are no-ops.
///
/// `TEZLIK_LOG_LEVEL` sets the filter unless `RUST_LOG` is present, and
/// `TEZLIK_LOG_FORMAT=pretty` switches the JSON output to human-readable
/// lines for local runs.
pub fn init_tracing(config: &AppConfig) -> Result<(), TelemetryInitError> {
    TELEMETRY_INIT
        .get_or_init(|| install_subscriber(config).map_err(|err| err.to_string()))
        .clone()
        .map_err(TelemetryInitError::Subscriber)
}

fn install_subscriber(config: &AppConfig) -> Result<(), TryInitError> {
    // Route legacy log:: macros through tracing. A bridge installed earlier
    // in the process (tests set one up too) is fine as-is.
    let _ = LogTracer::builder()
        .with_max_level(LevelFilter::Trace)
        .init();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.log_format == "pretty" {
        registry.with(fmt::layer().pretty()).try_init()?;
    } else {
        registry.with(fmt::layer().json()).try_init()?;
    }
    Ok(())
}

/// Run `future` with the given trace context in scope.
pub async fn with_trace_context<Fut, R>(context: TraceContext, future: Fut) -> R
where
    Fut: std::future::Future<Output = R>,
{
    ACTIVE_TRACE_CONTEXT.scope(context, future).await
}

/// The trace ID of the current request, if one is in scope.
pub fn current_trace_id() -> Option<String> {
    ACTIVE_TRACE_CONTEXT
        .try_with(|ctx| ctx.trace_id.clone())
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trace_id_visible_inside_scope() {
        let ctx = TraceContext {
            trace_id: "trace-123".to_string(),
        };
        let seen = with_trace_context(ctx, async { current_trace_id() }).await;
        assert_eq!(seen.as_deref(), Some("trace-123"));
    }

    #[test]
    fn trace_id_absent_outside_scope() {
        assert!(current_trace_id().is_none());
    }

    #[tokio::test]
    async fn nested_scope_shadows_the_outer_trace_id() {
        let outer = TraceContext {
            trace_id: "outer".to_string(),
        };
        let seen = with_trace_context(outer, async {
            let inner = TraceContext {
                trace_id: "inner".to_string(),
            };
            with_trace_context(inner, async { current_trace_id() }).await
        })
        .await;
        assert_eq!(seen.as_deref(), Some("inner"));
    }
}
