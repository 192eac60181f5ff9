use crate::error::AppError;
use crate::handlers::redirect_home;
use crate::models::runtime_config::AppState;
use crate::services::sponsorship_service::Pledge;
use crate::utils::request_body::{accepts_html, parse_form_or_json, query_param};
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use log::{error, warn};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

const INVALID_PLEDGE: &str = "Email and valid amount required";

#[derive(Debug, Default, Deserialize)]
pub struct SponsorRequest {
    #[serde(default)]
    pub email: Option<String>,
    /// Forms send a string, API clients a number.
    #[serde(default)]
    pub amount: Option<JsonValue>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `None` when the amount is present but not a finite number.
fn parse_amount(raw: Option<&JsonValue>) -> Option<f64> {
    let amount = match raw {
        None | Some(JsonValue::Null) => 0.0,
        Some(JsonValue::Number(n)) => n.as_f64()?,
        Some(JsonValue::String(s)) if s.trim().is_empty() => 0.0,
        Some(JsonValue::String(s)) => s.trim().parse::<f64>().ok()?,
        Some(_) => return None,
    };
    amount.is_finite().then_some(amount)
}

pub async fn sponsor_method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .append_header((header::ALLOW, "POST"))
        .body("Method Not Allowed")
}

/// POST /api/sponsor - record a sponsorship pledge and thank the donor
pub async fn sponsor(
    req: HttpRequest,
    body: web::Bytes,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let debug = app_state.debug_enabled(query_param(&req, "debug").as_deref());
    let wants_html = accepts_html(&req);

    let form: SponsorRequest = parse_form_or_json(&req, &body).unwrap_or_else(|e| {
        warn!("Ignoring unparseable sponsor body: {}", e);
        SponsorRequest::default()
    });

    let email = form
        .email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty());

    let (Some(email), Some(amount)) = (email, parse_amount(form.amount.as_ref())) else {
        return Ok(HttpResponse::BadRequest().json(json!({ "ok": false, "error": INVALID_PLEDGE })));
    };

    let pledge = Pledge::new(email, amount, form.message);

    match app_state.sponsorship_service.record_pledge(&pledge).await {
        Ok(()) => {
            if wants_html {
                let flag = format!("pledged=1&amount={}", urlencoding::encode(&pledge.display_amount()));
                return Ok(redirect_home(&flag));
            }
            Ok(HttpResponse::Ok().json(json!({ "ok": true })))
        }
        Err(e) => {
            error!("sponsor error: {}", e);
            if debug {
                return Ok(HttpResponse::InternalServerError().json(json!({ "ok": false, "error": e.to_string() })));
            }
            if wants_html {
                return Ok(redirect_home("pledged=error"));
            }
            Ok(HttpResponse::InternalServerError().json(json!({ "ok": false, "error": "Internal error" })))
        }
    }
}
