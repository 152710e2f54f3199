use sg_server::{build_router, build_state, logger, open_store};

use std::error::Error;

use log::{error, info};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // .env is optional
    dotenvy::dotenv().ok();

    // Load and validate configuration
    let config = sg_config::Config::load()?;
    config.validate()?;

    let log_file_path = match &config.logging.file {
        Some(filename) => {
            let log_dir = config.log_dir()?;
            std::fs::create_dir_all(&log_dir)?;
            Some(log_dir.join(filename))
        }
        None => None,
    };

    // Initialize logger (before any other logging)
    logger::initialize(config.logging.level, log_file_path, config.logging.colored)?;

    info!("Starting sg-server v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();

    let metrics = if config.server.metrics_enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| sg_server::ServerError::Metrics {
                message: e.to_string(),
            })?;
        info!("Prometheus metrics at /metrics");
        Some(handle)
    } else {
        None
    };

    let store = open_store(&config).await?;

    let app_state = build_state(&config, store)?;
    let app = build_router(app_state, config.server.max_connections, metrics);

    let listener = TcpListener::bind(config.bind_addr()).await?;
    // Actual bound address (port 0 means auto-assigned)
    let actual_addr = listener.local_addr()?;
    info!("Server listening on {}", actual_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received SIGINT (Ctrl+C), initiating graceful shutdown"),
                Err(e) => {
                    error!("Failed to listen for SIGINT: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        })
        .await?;

    info!("Graceful shutdown complete");
    Ok(())
}
