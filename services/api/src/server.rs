use crate::cli::ServeArgs;
use crate::infra::{load_config, load_dataset, AppState};
use crate::routes::with_framework_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use political_risk::error::AppError;
use political_risk::framework::evaluation::AnthropicEvaluator;
use political_risk::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = load_config(args.data.data_dir.take())?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let dataset = Arc::new(load_dataset(&config)?);
    if config.evaluator.api_key.is_none() {
        warn!("ANTHROPIC_API_KEY is not set; /evaluate-event will answer with an error");
    }
    let evaluator = Arc::new(AnthropicEvaluator::new(config.evaluator.clone())?);

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        dataset,
    };

    let app = with_framework_routes(evaluator)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        data_dir = %config.data.dir.display(),
        "political risk service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
