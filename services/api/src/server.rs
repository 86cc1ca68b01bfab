use crate::cli::ServeArgs;
use crate::infra::{build_application_service, AppState};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use mod_intake::applications::{ReviewerAllowlist, ReviewerPolicy};
use mod_intake::config::AppConfig;
use mod_intake::error::AppError;
use mod_intake::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

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

    let application_service = Arc::new(build_application_service(
        &config.storage,
        &config.notifier,
    )?);

    let allowlist = ReviewerAllowlist::from_config(&config.review);
    if allowlist.is_empty() {
        warn!("APP_REVIEWERS is empty, review endpoints will refuse every caller");
    }
    if allowlist.owner_count() == 0 {
        warn!("APP_REVIEW_OWNER is unset, the reviewer list cannot change at runtime");
    }
    let reviewers: Arc<dyn ReviewerPolicy> = Arc::new(allowlist);

    let app = with_application_routes(application_service, reviewers)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "moderator application service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
