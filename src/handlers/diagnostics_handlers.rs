use crate::config::AppSettings;
use crate::models::runtime_config::AppState;
use actix_web::{web, HttpResponse};
use log::{error, info};
use serde_json::{json, Value as JsonValue};

const SET: &str = "(set)";
const MISSING: &str = "(missing)";

fn value_or_missing(value: Option<&str>) -> &str {
    value.unwrap_or(MISSING)
}

fn set_or_missing(value: Option<&str>) -> &'static str {
    if value.is_some() { SET } else { MISSING }
}

/// Mail settings as reported by the diagnostics endpoint; credentials are
/// never echoed.
fn mail_environment(settings: &AppSettings) -> JsonValue {
    let smtp = &settings.smtp;
    let mail = &settings.mail;
    json!({
        "SMTP_HOST": value_or_missing(smtp.host.as_deref()),
        "SMTP_PORT": smtp.port.to_string(),
        "SMTP_SECURE": smtp.secure.to_string(),
        "SMTP_USER": set_or_missing(smtp.username.as_deref()),
        "SMTP_PASS": set_or_missing(smtp.password.as_deref()),
        "MAIL_FROM_UPDATES": if mail.from_updates_is_fallback {
            "(fallback to SMTP_USER)".to_string()
        } else {
            mail.from_updates.clone()
        },
        "MAIL_TO_JOIN": mail.to_join,
        "SITE_URL": settings.server.site_url,
    })
}

/// GET /api/smtp-verify - probe the mail transport
///
/// Hidden unless debug responses are enabled.
pub async fn smtp_verify(app_state: web::Data<AppState>) -> HttpResponse {
    if !app_state.settings.debug.allow_debug_responses {
        return HttpResponse::NotFound().finish();
    }

    match app_state.mailer.verify_connection().await {
        Ok(result) => {
            info!("SMTP connection check: {:?}", result);
            HttpResponse::Ok().json(json!({
                "ok": true,
                "verifyResult": result,
                "env": mail_environment(&app_state.settings),
            }))
        }
        Err(e) => {
            error!("SMTP connection check failed: {}", e);
            HttpResponse::InternalServerError().json(json!({ "ok": false, "error": e.to_string() }))
        }
    }
}
