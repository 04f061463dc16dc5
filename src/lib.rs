#[macro_use] extern crate rocket;

pub mod broadcast;
pub mod catchers;
pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod models;
pub mod registry;
pub mod routes;
pub mod session;

use std::sync::Arc;
use broadcast::Broadcaster;
use log::info;
use config::ServerConfig;
use registry::ConnectionRegistry;
use rocket::fs::{FileServer, Options};
use rocket::{Build, Rocket};
use rocket_cors::{AllowedOrigins, CorsOptions};

/// Composition root: one registry per process, shared by the stream route,
/// the broadcaster and the health check.
pub fn build_rocket(config: ServerConfig) -> Rocket<Build> {
    let registry = Arc::new(ConnectionRegistry::new());
    let broadcaster = Broadcaster::new(registry.clone());

    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .to_cors()
        .expect("CORS configuration failed");

    let figment = rocket::Config::figment()
        .merge(("port", config.port))
        .merge(("address", config.address));

    let static_dir = config.static_dir.clone();

    let mut build = rocket::custom(figment)
        .attach(cors)
        .manage(registry)
        .manage(broadcaster)
        .manage(config)
        .mount("/", routes![
            routes::sse,
            routes::broadcast,
            routes::health,
        ])
        .register("/", catchers![
            catchers::bad_request,
            catchers::not_found,
            catchers::unprocessable_entity,
            catchers::internal_error,
        ])
        .attach(rocket::fairing::AdHoc::on_liftoff("Banner", |rocket| {
            Box::pin(async move {
                let port = rocket.config().port;
                info!("🚀 Event stream server listening on http://localhost:{port}");
                info!("📊 Health check: http://localhost:{port}/health");
            })
        }));

    // Serve the home page if the directory exists
    if static_dir.is_dir() {
        info!("📦 Serving static files from: {}", static_dir.display());
        build = build.mount("/", FileServer::new(&static_dir, Options::Index));
    } else {
        info!(
            "⚠️  Static directory not found: {} (API-only mode)",
            static_dir.display()
        );
    }

    build
}
