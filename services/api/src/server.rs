use crate::cli::ServeArgs;
use crate::infra::{
    load_engine, sample_leads, AppState, InMemoryEventLog, InMemoryLeadStore,
    StaticUniversityDirectory,
};
use crate::routes::with_pipeline_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use loan_pipeline::config::{AppConfig, AppEnvironment};
use loan_pipeline::error::AppError;
use loan_pipeline::telemetry;
use loan_pipeline::workflows::eligibility::EligibilityService;
use loan_pipeline::workflows::leads::LeadLifecycleService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

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

    let (scorer, lenders) = load_engine(&config.engine)?;
    info!(
        bands_version = %scorer.bands().version,
        lenders = lenders.len(),
        "rules engine configured"
    );

    let seed = if config.environment == AppEnvironment::Development {
        sample_leads(Utc::now())
    } else {
        Vec::new()
    };
    let store = Arc::new(InMemoryLeadStore::with_leads(seed));
    let events = Arc::new(InMemoryEventLog::default());
    let lifecycle = Arc::new(LeadLifecycleService::new(store.clone(), store, events));
    let eligibility = Arc::new(EligibilityService::new(
        Arc::new(StaticUniversityDirectory::default()),
        Arc::new(lenders),
        scorer,
    ));

    let app = with_pipeline_routes(lifecycle, eligibility)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "loan pipeline service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
