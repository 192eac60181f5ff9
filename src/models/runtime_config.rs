use std::sync::Arc;

use crate::config::AppSettings;
use crate::error::AppError;
use crate::services::auth::confirmation_token::confirmation_tokens;
use crate::services::mailer::EmailSender;
use crate::services::sponsorship_service::SponsorshipService;
use crate::services::subscription_service::SubscriptionService;
use crate::utils::clock::Clock;

/// Application state shared across request handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<AppSettings>,
    pub mailer: Arc<dyn EmailSender>,
    pub subscription_service: Arc<SubscriptionService>,
    pub sponsorship_service: Arc<SponsorshipService>,
}

impl AppState {
    /// Builds every service from settings loaded once at startup.
    pub fn new(
        settings: AppSettings,
        mailer: Arc<dyn EmailSender>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        let (issuer, verifier) = confirmation_tokens(&settings.signing, clock)?;

        let subscription_service = SubscriptionService::new(
            issuer,
            verifier,
            mailer.clone(),
            settings.mail.clone(),
            settings.server.site_url.clone(),
        );
        let sponsorship_service = SponsorshipService::new(mailer.clone(), settings.mail.clone());

        Ok(Self {
            settings: Arc::new(settings),
            mailer,
            subscription_service: Arc::new(subscription_service),
            sponsorship_service: Arc::new(sponsorship_service),
        })
    }

    /// `?debug=1` only counts when debug responses are enabled.
    pub fn debug_enabled(&self, requested: Option<&str>) -> bool {
        self.settings.debug.allow_debug_responses && matches!(requested, Some("1") | Some("true"))
    }
}
