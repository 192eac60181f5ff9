use crate::handlers::redirect_home;
use crate::models::runtime_config::AppState;
use crate::utils::request_body::query_param;
use actix_web::{web, HttpRequest, HttpResponse};
use log::{info, warn};
use serde_json::json;

/// GET /api/confirm?token=... - the link from the confirmation email
///
/// Every outcome is a redirect to the landing page so the link never shows
/// a raw error. The verifier rejects a missing token as malformed; when a
/// key repeats, its first value wins.
pub async fn confirm(req: HttpRequest, app_state: web::Data<AppState>) -> HttpResponse {
    let debug = app_state.debug_enabled(query_param(&req, "debug").as_deref());
    let token = query_param(&req, "token").unwrap_or_default();

    match app_state.subscription_service.confirm(&token) {
        Ok(subject) => {
            info!("Confirmed subscription for {}", subject.subject_id);
            if debug {
                return HttpResponse::Ok().json(json!({
                    "ok": true,
                    "email": subject.subject_id,
                    "name": subject.display_name,
                }));
            }
            redirect_home("confirmed=1")
        }
        Err(e) => {
            warn!("Rejected confirmation token: {}", e.kind());
            if debug {
                return HttpResponse::BadRequest().json(json!({ "ok": false, "error": e.to_string() }));
            }
            redirect_home("confirmed=0")
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{app_state, token_from_url};
    use crate::routes::configure_site_api_routes;
    use crate::services::mailer::RecordingEmailSender;
    use crate::services::subscription_service::Signup;
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, web, App};
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
        resp.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    fn confirm_uri(token: &str, extra: &str) -> String {
        format!("/api/confirm?token={}{}", urlencoding::encode(token), extra)
    }

    #[actix_web::test]
    async fn test_invalid_and_missing_tokens_redirect_with_failure() {
        let mailer = Arc::new(RecordingEmailSender::new());
        let (state, _) = app_state(&[], mailer);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(web::scope("/api").configure(configure_site_api_routes)),
        )
        .await;

        for uri in ["/api/confirm?token=garbage", "/api/confirm?token=a.b.c", "/api/confirm"] {
            let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{}", uri);
            assert_eq!(location(&resp), "/?confirmed=0", "{}", uri);
        }
    }

    #[actix_web::test]
    async fn test_valid_token_confirms_and_can_be_replayed() {
        let mailer = Arc::new(RecordingEmailSender::new());
        let (state, _) = app_state(&[], mailer.clone());
        let service = state.subscription_service.clone();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(web::scope("/api").configure(configure_site_api_routes)),
        )
        .await;

        let url = service
            .request_confirmation(&Signup::new("jane@example.com", Some("Jane".to_string()), None, None))
            .await
            .unwrap();
        let token = token_from_url(&url);

        for _ in 0..2 {
            let resp =
                test::call_service(&app, test::TestRequest::get().uri(&confirm_uri(&token, "")).to_request()).await;
            assert_eq!(location(&resp), "/?confirmed=1");
        }
    }

    #[actix_web::test]
    async fn test_trailing_newline_from_mail_client_is_ignored() {
        let mailer = Arc::new(RecordingEmailSender::new());
        let (state, _) = app_state(&[], mailer);
        let service = state.subscription_service.clone();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(web::scope("/api").configure(configure_site_api_routes)),
        )
        .await;

        let url = service
            .request_confirmation(&Signup::new("jane@example.com", None, None, None))
            .await
            .unwrap();
        let token = token_from_url(&url);

        let uri = format!("{}%0A", confirm_uri(&token, ""));
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(location(&resp), "/?confirmed=1");
    }

    #[actix_web::test]
    async fn test_repeated_query_keys_never_fail_the_request() {
        let mailer = Arc::new(RecordingEmailSender::new());
        let (state, _) = app_state(&[], mailer);
        let service = state.subscription_service.clone();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(web::scope("/api").configure(configure_site_api_routes)),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/confirm?token=a&token=b").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/?confirmed=0");

        let url = service
            .request_confirmation(&Signup::new("jane@example.com", None, None, None))
            .await
            .unwrap();
        let token = token_from_url(&url);

        let uri = confirm_uri(&token, &format!("&token={}&debug=1&debug=1", urlencoding::encode(&token)));
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/?confirmed=1");
    }

    #[actix_web::test]
    async fn test_expired_token_is_rejected() {
        let mailer = Arc::new(RecordingEmailSender::new());
        let (state, clock) = app_state(&[], mailer);
        let service = state.subscription_service.clone();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(web::scope("/api").configure(configure_site_api_routes)),
        )
        .await;

        let url = service
            .request_confirmation(&Signup::new("jane@example.com", None, None, None))
            .await
            .unwrap();
        let token = token_from_url(&url);

        clock.advance(172_800);
        let resp = test::call_service(&app, test::TestRequest::get().uri(&confirm_uri(&token, "")).to_request()).await;
        assert_eq!(location(&resp), "/?confirmed=1");

        clock.advance(1);
        let resp = test::call_service(&app, test::TestRequest::get().uri(&confirm_uri(&token, "")).to_request()).await;
        assert_eq!(location(&resp), "/?confirmed=0");
    }

    #[actix_web::test]
    async fn test_debug_responses() {
        let mailer = Arc::new(RecordingEmailSender::new());
        let (state, _) = app_state(&[("DEBUG_RESPONSES", "1")], mailer);
        let service = state.subscription_service.clone();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(web::scope("/api").configure(configure_site_api_routes)),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/confirm?token=a.b.c&debug=1").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "ok": false, "error": "Bad signature" }));

        let url = service
            .request_confirmation(&Signup::new("jane@example.com", Some("Jane".to_string()), None, None))
            .await
            .unwrap();
        let token = token_from_url(&url);
        let req = test::TestRequest::get().uri(&confirm_uri(&token, "&debug=1")).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "ok": true, "email": "jane@example.com", "name": "Jane" }));
    }
}
