use std::sync::Arc;
use validator::Validate;
use vitals_predictor::{
    api::{build_router, AppState},
    config::Config,
    logging::init_tracing,
    service::PredictionService,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    init_tracing(&config.observability);

    tracing::info!("Starting vitals-predictor v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    // Model is loaded exactly once; a missing artifact aborts startup
    let service = match PredictionService::from_config(&config) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            tracing::error!(
                error_code = e.error_code(),
                model_path = %config.model.path.display(),
                "Failed to initialize prediction service: {}",
                e
            );
            return Err(e.into());
        }
    };
    tracing::info!("✅ Model loaded from {}", config.model.path.display());

    let app = build_router(AppState::new(service));

    // Start HTTP server
    let http_addr = format!("{}:{}", config.server.host, config.server.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;

    tracing::info!("🚀 HTTP API server listening on http://{}", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("   Prediction:   http://{}/predict", http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutdown signal received");
        })
        .await?;

    tracing::info!("Shutting down gracefully...");
    Ok(())
}
