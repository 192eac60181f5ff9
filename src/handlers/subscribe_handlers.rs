use crate::error::AppError;
use crate::handlers::redirect_home;
use crate::models::runtime_config::AppState;
use crate::services::subscription_service::Signup;
use crate::utils::request_body::{accepts_html, is_form_post, parse_form_or_json, query_param};
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Result};
use log::{error, warn};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub org: Option<String>,
}

/// GET /api/subscribe - people browsing here directly go back home
pub async fn subscribe_redirect() -> HttpResponse {
    redirect_home("subscribed=0")
}

pub async fn subscribe_method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .append_header((header::ALLOW, "POST, GET"))
        .body("Method Not Allowed")
}

/// POST /api/subscribe - start a double opt-in subscription
///
/// Browsers get redirected back to the landing page with a banner flag; API
/// clients get JSON.
pub async fn subscribe(
    req: HttpRequest,
    body: web::Bytes,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let debug = app_state.debug_enabled(query_param(&req, "debug").as_deref());
    let wants_html = accepts_html(&req);

    let form: SubscribeRequest = parse_form_or_json(&req, &body).unwrap_or_else(|e| {
        warn!("Ignoring unparseable subscribe body: {}", e);
        SubscribeRequest::default()
    });

    let email = form
        .email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty());

    let Some(email) = email else {
        if debug {
            return Ok(HttpResponse::BadRequest().json(json!({ "ok": false, "error": "Email required" })));
        }
        if wants_html {
            return Ok(redirect_home("subscribed=missing_email"));
        }
        return Ok(HttpResponse::BadRequest().json(json!({ "error": "Email required" })));
    };

    let signup = Signup::new(email, form.name, form.role, form.org);

    match app_state.subscription_service.request_confirmation(&signup).await {
        Ok(confirm_url) => {
            if debug {
                return Ok(HttpResponse::Ok().json(json!({ "ok": true, "confirmUrl": confirm_url })));
            }
            if wants_html || is_form_post(&req) {
                return Ok(redirect_home("subscribed=1"));
            }
            Ok(HttpResponse::Ok().json(json!({ "ok": true })))
        }
        Err(e) => {
            error!("subscribe error: {}", e);
            if debug {
                return Ok(HttpResponse::InternalServerError().json(json!({ "ok": false, "error": e.to_string() })));
            }
            if wants_html {
                return Ok(redirect_home("subscribed=error"));
            }
            Ok(HttpResponse::InternalServerError().json(json!({ "error": "Internal error" })))
        }
    }
}
