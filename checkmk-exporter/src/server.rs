//! HTTP front end
//!
//! - `/check_mk?target=<name>[&port=][&user=][&identityFile=]` runs one scrape
//! - `/metrics` exposes the exporter's own counters
//! - `/` serves a landing page

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use checkmk_exporter_core::exposition::{self, CONTENT_TYPE};
use checkmk_exporter_core::{
    ExporterConfig, SampleSink, ScrapeError, ScrapeOrchestrator, TargetOverrides, drain_samples,
};
use prometheus::{IntCounterVec, Opts, Registry, TextEncoder};
use serde::Deserialize;
use tokio::net::TcpListener;

use crate::error::CliError;

const INDEX_HTML: &str = "<html>
<head><title>Check_MK Exporter</title></head>
<body>
<h1>Check_MK Exporter</h1>
<p><a href='/metrics'>Metrics</a></p>
<p><a href='/check_mk'>Scrape a target</a> (<code>/check_mk?target=&lt;name&gt;</code>)</p>
</body>
</html>
";

/// Counters about the exporter itself
pub struct ExporterMetrics {
    registry: Registry,
    scrapes: IntCounterVec,
    failures: IntCounterVec,
}

impl ExporterMetrics {
    /// Creates and registers the counters.
    ///
    /// # Errors
    ///
    /// Returns an error if a counter cannot be registered.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let scrapes = IntCounterVec::new(
            Opts::new(
                "check_mk_exporter_scrapes_total",
                "Scrapes started per target",
            ),
            &["target"],
        )?;
        let failures = IntCounterVec::new(
            Opts::new(
                "check_mk_exporter_scrape_failures_total",
                "Scrapes per target whose agent output could not be fetched",
            ),
            &["target"],
        )?;
        registry.register(Box::new(scrapes.clone()))?;
        registry.register(Box::new(failures.clone()))?;
        Ok(Self {
            registry,
            scrapes,
            failures,
        })
    }

    fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = String::new();
        TextEncoder::new().encode_utf8(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}

/// Shared state of all handlers
#[derive(Clone)]
pub struct AppState {
    config: Arc<ExporterConfig>,
    scraper: ScrapeOrchestrator,
    metrics: Arc<ExporterMetrics>,
}

impl AppState {
    /// Creates the handler state
    #[must_use]
    pub fn new(
        config: ExporterConfig,
        scraper: ScrapeOrchestrator,
        metrics: ExporterMetrics,
    ) -> Self {
        Self {
            config: Arc::new(config),
            scraper,
            metrics: Arc::new(metrics),
        }
    }
}

/// Query parameters of `/check_mk`
#[derive(Debug, Default, Deserialize)]
pub struct ScrapeQuery {
    target: Option<String>,
    port: Option<String>,
    user: Option<String>,
    #[serde(rename = "identityFile")]
    identity_file: Option<String>,
}

/// Builds the router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/metrics", get(handle_metrics))
        .route("/check_mk", get(handle_scrape))
        .with_state(state)
}

/// Serves on an already bound listener until Ctrl-C.
///
/// # Errors
///
/// Returns [`CliError::Server`] if the server stops with an I/O error.
pub async fn serve_on(listener: TcpListener, state: AppState) -> Result<(), CliError> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CliError::Server(e.to_string()))
}

/// Binds `addr` and serves until Ctrl-C.
///
/// # Errors
///
/// Returns [`CliError::Server`] if the address cannot be bound.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<(), CliError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| CliError::Server(format!("unable to listen on {addr}: {e}")))?;
    tracing::info!(%addr, "Start listening");
    serve_on(listener, state).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Unable to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn handle_metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => ([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(e) => internal_error(&e),
    }
}

async fn handle_scrape(
    State(state): State<AppState>,
    Query(query): Query<ScrapeQuery>,
) -> Response {
    let overrides = TargetOverrides::from_params(
        query.port.as_deref(),
        query.user.as_deref(),
        query.identity_file.as_deref(),
    );
    let target = match state.config.resolve_target(query.target.as_deref(), &overrides) {
        Ok(target) => target,
        Err(e) => {
            if matches!(e, ScrapeError::UnknownTarget(_)) {
                tracing::error!(error = %e, "Rejected scrape");
            }
            return (StatusCode::BAD_REQUEST, format!("{e}\n")).into_response();
        }
    };

    let name = query.target.as_deref().unwrap_or_default();
    state.metrics.scrapes.with_label_values(&[name]).inc();

    let (sink, mut rx) = SampleSink::channel();
    let report = state.scraper.collect(&target, &sink).await;
    drop(sink);
    let samples = drain_samples(&mut rx);

    if !report.is_success() {
        state.metrics.failures.with_label_values(&[name]).inc();
    }
    tracing::debug!(
        target_name = name,
        samples = samples.len(),
        success = report.is_success(),
        "Scrape served"
    );

    match exposition::render(&samples, &report) {
        Ok(body) => ([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(e) => internal_error(&e),
    }
}

fn internal_error(e: &prometheus::Error) -> Response {
    tracing::error!(error = %e, "Failed to encode metrics");
    (StatusCode::INTERNAL_SERVER_ERROR, format!("{e}\n")).into_response()
}
