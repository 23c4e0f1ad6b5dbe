use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use credit_wizard::config::WizardConfig;
use credit_wizard::error::AppError;
use credit_wizard::workflows::credit::{
    AllowList, ScoreReport, SessionRegistry, SimulatedGateway, WizardBlueprint,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::task::JoinHandle;
use tracing::{debug, info};

const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type WizardRegistry = SessionRegistry<SimulatedGateway>;

/// Configured report file, or the built-in demonstration report.
pub(crate) fn load_report(config: &WizardConfig) -> Result<ScoreReport, AppError> {
    match &config.report_path {
        Some(path) => {
            let report = ScoreReport::from_path(path)?;
            info!(path = %path.display(), status = ?report.status(), "loaded score report");
            Ok(report)
        }
        None => Ok(ScoreReport::standard()),
    }
}

pub(crate) fn build_registry(config: &WizardConfig) -> Result<Arc<WizardRegistry>, AppError> {
    let report = load_report(config)?;
    let gateway = Arc::new(SimulatedGateway::from_config(config, report));
    Ok(Arc::new(SessionRegistry::new(
        Arc::new(WizardBlueprint::standard()),
        gateway,
        AllowList::documents(),
    )))
}

/// Periodically drop sessions idle for longer than `ttl`.
pub(crate) fn spawn_session_sweeper(
    registry: Arc<WizardRegistry>,
    ttl: Duration,
) -> JoinHandle<()> {
    let period = ttl.min(MAX_SWEEP_INTERVAL).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let expired = registry.sweep_idle(ttl, chrono::Utc::now());
            if expired > 0 {
                debug!(expired, remaining = registry.len(), "swept idle wizard sessions");
            }
        }
    })
}

pub(crate) fn parse_millis(raw: &str) -> Result<Duration, String> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|err| format!("failed to parse '{raw}' as milliseconds ({err})"))
}
