use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use credit_wizard::config::AppConfig;
use credit_wizard::error::AppError;
use credit_wizard::telemetry;
use tracing::info;

use crate::cli::ServeArgs;
use crate::infra::{build_registry, spawn_session_sweeper, AppState};
use crate::routes::with_wizard_routes;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let registry = build_registry(&config.wizard)?;
    let _sweeper = spawn_session_sweeper(Arc::clone(&registry), config.wizard.session_ttl);

    let app = with_wizard_routes(registry)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        request_delay_ms = config.wizard.request_delay.as_millis() as u64,
        clarification_delay_ms = config.wizard.clarification_delay.as_millis() as u64,
        session_ttl_secs = config.wizard.session_ttl.as_secs(),
        "credit wizard service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
