use crate::cli::ServeArgs;
use crate::infra::{
    AppState, DirectorySeed, DiskResumeStore, InMemoryApplicationRepository, InMemoryDirectory,
    LifecycleService,
};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use job_board::config::AppConfig;
use job_board::error::AppError;
use job_board::telemetry;
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
    if let Some(directory) = args.directory.take() {
        config.storage.directory_path = Some(directory);
    }

    telemetry::init(&config.telemetry)?;

    let seed = match &config.storage.directory_path {
        Some(path) => {
            let seed = DirectorySeed::load(path)?;
            info!(
                path = %path.display(),
                jobs = seed.jobs.len(),
                applicants = seed.applicants.len(),
                "directory seed loaded"
            );
            seed
        }
        None => {
            warn!("no directory seed configured; serving the sample catalogue");
            DirectorySeed::sample(Utc::now())
        }
    };

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let application_service: Arc<LifecycleService> = Arc::new(LifecycleService::new(
        Arc::new(InMemoryApplicationRepository::default()),
        Arc::new(InMemoryDirectory::from_seed(seed)),
        Arc::new(DiskResumeStore::new(&config.storage.upload_dir)),
        config.lifecycle.clone(),
    ));

    let app = with_application_routes(application_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        upload_dir = %config.storage.upload_dir.display(),
        transition_policy = %config.lifecycle.transition_policy,
        "job board application service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
