use std::sync::Arc;

use schoolhub_server::config::AppConfig;
use schoolhub_server::migrator::Migrator;
use schoolhub_server::notifications::DbNotificationSender;
use schoolhub_server::services::media::{GcsMediaStore, LocalMediaStore, MediaStore};
use schoolhub_server::services::Services;
use schoolhub_server::{app, metrics, telemetry};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    telemetry::init_telemetry("schoolhub-server").expect("failed to install OpenTelemetry tracer");
    let config = AppConfig::from_env().expect("invalid configuration");

    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    metrics::init_metrics(&db).await;

    let media: Arc<dyn MediaStore> = match &config.media.gcs_bucket {
        Some(bucket) => {
            let gcs_config = google_cloud_storage::client::ClientConfig::default()
                .with_auth()
                .await
                .expect("Failed to authenticate with Google Cloud Storage");
            let client = google_cloud_storage::client::Client::new(gcs_config);
            tracing::info!(bucket = %bucket, "storing media in Google Cloud Storage");
            Arc::new(GcsMediaStore::new(client, bucket.clone()))
        }
        None => {
            tracing::info!(root = %config.media.root.display(), "storing media on local disk");
            Arc::new(LocalMediaStore::new(
                config.media.root.clone(),
                config.media.base_url.clone(),
            ))
        }
    };

    let services = Services::new(
        db.clone(),
        &config,
        Arc::new(DbNotificationSender::new(db)),
        media,
    )
    .expect("Failed to compile notification templates");
    let shutdown = services.shutdown.clone();

    let app = app::with_metrics(
        app::router(services, &config),
        prometheus_layer,
        metric_handle,
    );

    tracing::info!("listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .expect("server error");
}

/// Waits for ctrl-c, then cancels in-flight uploads before the server drains.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
    shutdown.cancel();
}
