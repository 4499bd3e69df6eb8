use crate::cli::ServeArgs;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::questionnaire::{DraftBackend, QuestionnaireService};
use crate::routes::{with_operational_routes, AppState};
use crate::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
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

    let drafts = DraftBackend::from_dir(config.questionnaire.draft_dir.as_deref())?;
    let draft_backend = match drafts {
        DraftBackend::Memory(_) => "memory",
        DraftBackend::File(_) => "file",
    };
    let service = QuestionnaireService::new(Arc::new(drafts), config.questionnaire.limits)
        .with_quiet_period(config.questionnaire.debounce);

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_operational_routes(Arc::new(service))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, draft_backend, "questionnaire validation service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
