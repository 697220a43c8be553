//! GIS shapefile server - main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use gis_shapefile_lib::api;
use gis_shapefile_lib::config::Config;
use gis_shapefile_lib::middleware::RequestLogger;
use gis_shapefile_lib::services::OutputStore;
use gis_shapefile_lib::services::output::SHAPEFILES_DIR;

/// Perform health check (for container healthchecks).
fn health_check() -> bool {
    Config::from_env().is_ok()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Check for --health-check flag (used by Docker HEALTHCHECK)
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|arg| arg == "--health-check") {
        dotenvy::dotenv().ok();
        std::process::exit(if health_check() { 0 } else { 1 });
    }

    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).map_err(std::io::Error::other)?;

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, CORS_ALLOWED_ORIGINS must be set");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  GIS Shapefile Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    tokio::fs::create_dir_all(config.media_root.join(SHAPEFILES_DIR)).await?;
    info!("Media root: {}", config.media_root.display());

    let bind_address = config.bind_address();
    let store = OutputStore::new(config.media_root.clone());
    let max_upload_size = config.max_upload_size;
    let api_prefix = config.api_prefix.clone();
    let allowed_origins = config.cors_allowed_origins.clone();
    let is_development = config.is_development();

    info!(
        "Upload limit: {}MB, routes mounted at '{}'",
        max_upload_size / 1024 / 1024,
        if api_prefix.is_empty() { "/" } else { api_prefix.as_str() }
    );

    let worker_count = if is_development { 4 } else { num_cpus::get() };
    info!(
        "Starting server at http://{} ({} workers)",
        bind_address, worker_count
    );

    let server = HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .max_age(3600);
        if is_development {
            cors = cors
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000");
        }
        for origin in &allowed_origins {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .wrap(cors)
            .wrap(RequestLogger)
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(max_upload_size))
            // Registered before the scope, which may have an empty prefix
            .configure(api::configure_media_routes)
            .configure(api::configure_openapi_routes)
            .service(
                web::scope(&api_prefix)
                    .configure(api::configure_health_routes)
                    .configure(api::configure_shapefile_routes),
            )
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
