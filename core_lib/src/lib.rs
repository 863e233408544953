//! Core library for the file storage service: configuration, storage
//! backend, validators, route handlers and the server runner.

pub mod config;
pub mod error;
pub mod extractors;
pub mod files;
pub mod handlers;
pub mod middleware;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use files::{FileStorage, StoredFile, UploadValidator};
pub use handlers::routes::create_routes;

use axum::{middleware as axum_middleware, Router};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing::{error, info};

use files::UploadValidationConfig;

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub version: String,
    pub config: Arc<AppConfig>,
    pub storage: FileStorage,
    pub validator: UploadValidator,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let storage = FileStorage::new(
            config.storage.upload_dir.clone(),
            config.storage.max_file_size_bytes,
        );
        let validator = UploadValidator::new(UploadValidationConfig::from(&config.storage));

        Self {
            app_name: "File Storage Service".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            config: Arc::new(config),
            storage,
            validator,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let router = create_routes(&state)
        .layer(axum_middleware::from_fn(middleware::errors::error_responder))
        .with_state(state);

    middleware::logging::with_request_logging(router)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let app = app.into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
