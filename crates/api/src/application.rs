use std::{path::Path, sync::Arc};

#[cfg(unix)]
use std::fs;

use actix_web::{guard, middleware::Logger, web, App, HttpServer};
use shiptrack_carriers::{AdapterError, AdapterFactory, ExecutionContext, TrackingAggregator};
use shiptrack_domain::config::{ApiConfig, ConfigError, TrackerConfig};
use shiptrack_domain::registry::{CarrierRegistry, RegistryError};
use shiptrack_domain::services::telemetry::{init_telemetry, TelemetryConfig, TelemetryError};
use thiserror::Error;
use tracing::info;

use crate::{
    handlers::{
        carriers_handler, fedex_route_handler, metrics_handler, track_by_path_handler,
        track_handler, ups_route_handler,
    },
    state::AppState,
};

pub async fn run() -> Result<(), BootstrapError> {
    // 1. configuration
    let config = ApiConfig::load_from_env()?;
    let tracker_config = TrackerConfig::load_from_env()?;

    // 2. telemetry
    let telemetry_config = TelemetryConfig::from_env("API");
    let telemetry = init_telemetry(&telemetry_config)?;

    // 3. carriers. The server holds the vendor secrets, so its adapters
    // always call the vendors directly even if a proxy base URL is set.
    let registry = Arc::new(CarrierRegistry::from_env()?);
    let factory = AdapterFactory::new(&tracker_config)?.with_context(ExecutionContext::Direct);
    let aggregator = Arc::new(TrackingAggregator::from_factory(registry, &factory));
    info!(
        carriers = ?aggregator.registry().carriers().collect::<Vec<_>>(),
        timeout_secs = tracker_config.request_timeout().as_secs(),
        "tracking aggregator ready"
    );

    let state = AppState::new(aggregator, telemetry.clone());

    // Metrics stay off the public listener when an internal one exists.
    let include_metrics_on_public = !config.has_internal_listener();
    let public_state = state.clone();

    let mut public_server = HttpServer::new(move || {
        let mut app = App::new()
            .app_data(web::Data::new(public_state.clone()))
            .wrap(Logger::default())
            .configure(tracking_routes)
            .route("/api/carriers", web::get().to(carriers_handler));

        if include_metrics_on_public {
            app = app.route("/metrics", web::get().to(metrics_handler));
        }

        app
    });

    #[cfg(unix)]
    {
        if let Some(socket) = config.api_unix_socket() {
            cleanup_socket(socket)?;
            public_server = public_server.bind_uds(socket)?;
        } else {
            public_server = public_server.bind(config.api_bind_address())?;
        }
    }

    #[cfg(not(unix))]
    {
        if let Some(socket) = config.api_unix_socket() {
            return Err(BootstrapError::Io(std::io::Error::other(format!(
                "unix socket '{socket}' requested but this platform does not support it"
            ))));
        }
        public_server = public_server.bind(config.api_bind_address())?;
    }

    let public_server = public_server.run();

    // Optional internal listener: metrics only.
    let internal_server = if config.has_internal_listener() {
        let internal_state = state.clone();
        let mut internal_server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(internal_state.clone()))
                .wrap(Logger::default())
                .route("/metrics", web::get().to(metrics_handler))
        });

        #[cfg(unix)]
        {
            if let Some(socket) = config.internal_unix_socket() {
                cleanup_socket(socket)?;
                internal_server = internal_server.bind_uds(socket)?;
            } else if let Some(addr) = config.internal_bind_address() {
                internal_server = internal_server.bind(addr)?;
            } else {
                return Err(BootstrapError::Io(std::io::Error::other(
                    "internal listener configured but no bind target provided",
                )));
            }
        }

        #[cfg(not(unix))]
        {
            if let Some(socket) = config.internal_unix_socket() {
                return Err(BootstrapError::Io(std::io::Error::other(format!(
                    "internal unix socket '{socket}' requested but this platform does not support it"
                ))));
            }
            if let Some(addr) = config.internal_bind_address() {
                internal_server = internal_server.bind(addr)?;
            } else {
                return Err(BootstrapError::Io(std::io::Error::other(
                    "internal listener configured but no bind target provided",
                )));
            }
        }

        Some(internal_server.run())
    } else {
        None
    };

    if let Some(internal) = internal_server {
        tokio::try_join!(public_server, internal)?;
    } else {
        public_server.await?;
    }

    Ok(())
}

/// Tracking routes. The vendor resources carry a POST guard so that
/// `GET /api/tracking/ups` falls through to the lookup-by-path resource
/// instead of answering 405.
pub(crate) fn tracking_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/tracking", web::post().to(track_handler))
        .service(
            web::resource("/api/tracking/ups")
                .guard(guard::Post())
                .route(web::post().to(ups_route_handler)),
        )
        .service(
            web::resource("/api/tracking/fedex")
                .guard(guard::Post())
                .route(web::post().to(fedex_route_handler)),
        )
        .route(
            "/api/tracking/{tracking_number}",
            web::get().to(track_by_path_handler),
        );
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("adapter setup failed: {0}")]
    Adapter(#[from] AdapterError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A stale socket file from an unclean shutdown makes `bind_uds` fail.
#[cfg(unix)]
fn cleanup_socket(path: &str) -> std::io::Result<()> {
    let socket_path = Path::new(path);
    if socket_path.exists() {
        fs::remove_file(socket_path)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn cleanup_socket(_path: &str) -> std::io::Result<()> {
    Ok(())
}
