use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_session_routes;
use albert_score::config::AppConfig;
use albert_score::error::AppError;
use albert_score::scoring::{SessionRegistry, SystemClock};
use albert_score::telemetry;
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let registry = Arc::new(SessionRegistry::with_clock(
        config.scoring.clone(),
        SystemClock,
    ));

    let app = with_session_routes(registry)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        high_interest_threshold = config.scoring.high_interest_threshold,
        "albert score service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
