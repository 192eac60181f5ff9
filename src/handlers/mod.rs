pub mod health;
pub mod confirm_handlers;
pub mod diagnostics_handlers;
pub mod sponsor_handlers;
pub mod subscribe_handlers;

use actix_web::http::header;
use actix_web::HttpResponse;

/// 303 back to the landing page; `flag` is the banner query string.
pub(crate) fn redirect_home(flag: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header((header::LOCATION, format!("/?{}", flag)))
        .finish()
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::AppSettings;
    use crate::models::AppState;
    use crate::services::mailer::{OutgoingEmail, RecordingEmailSender};
    use crate::utils::clock::ManualClock;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    pub fn settings(pairs: &[(&str, &str)]) -> AppSettings {
        let mut vars: HashMap<String, String> = HashMap::from([
            ("SIGNING_SECRET".to_string(), "handler-test-secret".to_string()),
            ("SITE_URL".to_string(), "https://memorym8.test".to_string()),
            ("TEMPLATES_DIR".to_string(), "does-not-exist/templates".to_string()),
        ]);
        for (key, value) in pairs {
            vars.insert(key.to_string(), value.to_string());
        }
        AppSettings::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    pub fn app_state(
        pairs: &[(&str, &str)],
        mailer: Arc<RecordingEmailSender>,
    ) -> (AppState, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()));
        let state = AppState::new(settings(pairs), mailer, clock.clone()).unwrap();
        (state, clock)
    }

    /// Background notifications land shortly after the response.
    pub async fn wait_for_emails(mailer: &RecordingEmailSender, count: usize) -> Vec<OutgoingEmail> {
        for _ in 0..100 {
            if mailer.sent().len() >= count {
                break;
            }
            actix_rt::time::sleep(Duration::from_millis(10)).await;
        }
        mailer.sent()
    }

    /// Pulls the raw token out of a confirmation URL.
    pub fn token_from_url(url: &str) -> String {
        let start = url.find("token=").map(|i| i + "token=".len()).unwrap_or(url.len());
        let rest = &url[start..];
        let end = rest.find(['"', '&']).unwrap_or(rest.len());
        urlencoding::decode(&rest[..end]).unwrap().into_owned()
    }
}
