use actix_web::web;
use crate::handlers;

// Form posts are tiny; anything larger is rejected before parsing
const MAX_FORM_BODY_BYTES: usize = 1024 * 1024;

/// Configures the site's form endpoints.
/// Mounted under the "/api" scope in main.rs.
pub fn configure_site_api_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_FORM_BODY_BYTES));

    cfg.service(
        web::resource("/subscribe")
            .route(web::post().to(handlers::subscribe_handlers::subscribe))
            .route(web::get().to(handlers::subscribe_handlers::subscribe_redirect))
            .default_service(web::to(handlers::subscribe_handlers::subscribe_method_not_allowed)),
    );

    cfg.service(
        web::resource("/confirm")
            .route(web::get().to(handlers::confirm_handlers::confirm)),
    );

    cfg.service(
        web::resource("/sponsor")
            .route(web::post().to(handlers::sponsor_handlers::sponsor))
            .default_service(web::to(handlers::sponsor_handlers::sponsor_method_not_allowed)),
    );

    cfg.service(
        web::resource("/smtp-verify")
            .route(web::get().to(handlers::diagnostics_handlers::smtp_verify)),
    );
}
