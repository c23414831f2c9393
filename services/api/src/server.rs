use crate::cli::ServeArgs;
use crate::infra::{open_data_dir, AppState};
use crate::routes::with_placement_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use placement::config::AppConfig;
use placement::error::AppError;
use placement::telemetry;
use placement::workflows::placement::PlacementService;
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
    if let Some(data_dir) = args.data_dir.take() {
        config.storage.data_dir = data_dir;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let data = open_data_dir(&config.storage.data_dir)?;
    if !data.report.is_clean() {
        warn!(
            adjusted = data.report.adjustments.len(),
            orphaned = data.report.orphaned.len(),
            "stored seat counts were corrected on load"
        );
    }
    let (students, representatives, staff) = data.directory.counts();
    info!(
        data_dir = %config.storage.data_dir.display(),
        students,
        representatives,
        staff,
        "placement records loaded"
    );

    let service = Arc::new(PlacementService::new(
        Arc::new(data.store),
        Arc::new(data.directory),
        config.policy.clone(),
    ));

    let app = with_placement_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "internship placement service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
