use actix_web::{web, App, HttpServer, middleware::Logger};
use actix_cors::Cors;
use dotenv::dotenv;
use std::net::TcpListener;
use std::sync::Arc;

use memorym8_site_server::config::AppSettings;
use memorym8_site_server::handlers;
use memorym8_site_server::models::AppState;
use memorym8_site_server::routes::configure_site_api_routes;
use memorym8_site_server::services::mailer::email_sender_from_settings;
use memorym8_site_server::utils::clock::SystemClock;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Load application settings
    let app_settings = match AppSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Failed to load application settings: {}", e);
            log::error!("Cannot start server without valid settings");
            std::process::exit(1);
        }
    };

    let mailer = match email_sender_from_settings(&app_settings) {
        Ok(mailer) => mailer,
        Err(e) => {
            log::error!("Failed to initialize email transport: {}", e);
            std::process::exit(1);
        }
    };
    log::info!("Email transport initialized successfully");

    let host = app_settings.server.host.clone();
    let port = app_settings.server.port;
    let cors_origins = app_settings.server.cors_origins.clone();

    let app_state = match AppState::new(app_settings, mailer, Arc::new(SystemClock)) {
        Ok(state) => state,
        Err(e) => {
            log::error!("Failed to initialize application state: {}", e);
            std::process::exit(1);
        }
    };

    log::info!("Starting server at http://{}:{}", host, port);

    let server_addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(server_addr)?;

    HttpServer::new(move || {
        // Configure CORS using actix-cors
        let mut cors = Cors::default();

        if cors_origins.iter().any(|origin| origin == "*") {
            cors = cors.allow_any_origin();
        } else {
            for origin in &cors_origins {
                cors = cors.allowed_origin(origin);
            }
        }

        cors = cors
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(app_state.clone()))
            .service(
                web::resource("/health")
                    .route(web::get().to(handlers::health::health_check))
            )
            .service(
                web::scope("/api")
                    .configure(configure_site_api_routes)
            )
    })
    .listen(listener)?
    .run()
    .await
}
