use crate::config::settings::MailConfig;
use crate::error::{AppError, TokenError};
use crate::services::auth::confirmation_token::{TokenIssuer, TokenVerifier, VerifiedSubject};
use crate::services::email_templates::{self, CONFIRM_TEMPLATE, DEFAULT_CONFIRM_TEMPLATE};
use crate::services::mailer::{EmailBody, EmailSender, InlineImage, OutgoingEmail};
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;

pub const CONFIRM_SUBJECT: &str = "Please confirm your Memory M8 subscription";
pub const LOGO_CONTENT_ID: &str = "mm8logo";

/// A mailing-list sign-up as submitted by the site form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signup {
    pub email: String,
    pub name: Option<String>,
    pub role: Option<String>,
    pub org: Option<String>,
}

impl Signup {
    /// Trims every field; blank optional fields become `None`.
    pub fn new(email: &str, name: Option<String>, role: Option<String>, org: Option<String>) -> Self {
        let clean = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            email: email.trim().to_string(),
            name: clean(name),
            role: clean(role),
            org: clean(org),
        }
    }

    /// Body of the internal sign-up notification.
    pub fn notification_text(&self) -> String {
        let mut text = format!("{} signed up", self.name.as_deref().unwrap_or("Someone"));
        if let Some(role) = &self.role {
            text.push_str(&format!(" as {}", role));
        }
        if let Some(org) = &self.org {
            text.push_str(&format!(" ({})", org));
        }
        text
    }
}

/// Double opt-in flow: issue a signed link, email it, verify it on return.
pub struct SubscriptionService {
    issuer: TokenIssuer,
    verifier: TokenVerifier,
    mailer: Arc<dyn EmailSender>,
    mail: MailConfig,
    site_url: String,
}

impl SubscriptionService {
    pub fn new(
        issuer: TokenIssuer,
        verifier: TokenVerifier,
        mailer: Arc<dyn EmailSender>,
        mail: MailConfig,
        site_url: String,
    ) -> Self {
        Self {
            issuer,
            verifier,
            mailer,
            mail,
            site_url,
        }
    }

    pub fn confirm_url(&self, token: &str) -> String {
        format!("{}/api/confirm?token={}", self.site_url, urlencoding::encode(token))
    }

    /// Sends the confirmation email and returns the link it contains.
    ///
    /// The team notification is sent in the background and its failure is
    /// only logged; a failure to reach the subscriber is returned.
    pub async fn request_confirmation(&self, signup: &Signup) -> Result<String, AppError> {
        let token = self.issuer.issue(&signup.email, signup.name.as_deref(), None)?;
        let confirm_url = self.confirm_url(&token);

        self.notify_team(signup);

        let template = email_templates::load_template(
            &self.mail.templates_dir,
            CONFIRM_TEMPLATE,
            DEFAULT_CONFIRM_TEMPLATE,
        )
        .await;
        let html = email_templates::render(
            &template,
            &[
                ("name", signup.name.as_deref().unwrap_or("")),
                ("confirmUrl", &confirm_url),
            ],
        )?;

        self.mailer
            .send(OutgoingEmail {
                from: self.mail.from_updates.clone(),
                to: signup.email.clone(),
                subject: CONFIRM_SUBJECT.to_string(),
                body: EmailBody::Html(html),
                inline_image: Some(InlineImage {
                    content_id: LOGO_CONTENT_ID.to_string(),
                    path: PathBuf::from(&self.mail.logo_path),
                }),
            })
            .await?;

        info!("Sent confirmation email to {}", signup.email);
        Ok(confirm_url)
    }

    pub fn confirm(&self, token: &str) -> Result<VerifiedSubject, TokenError> {
        self.verifier.verify(token)
    }

    fn notify_team(&self, signup: &Signup) {
        let mailer = self.mailer.clone();
        let email = OutgoingEmail {
            from: self.mail.from_updates.clone(),
            to: self.mail.to_join.clone(),
            subject: format!("New sign-up: {}", signup.email),
            body: EmailBody::Text(signup.notification_text()),
            inline_image: None,
        };

        actix_rt::spawn(async move {
            if let Err(e) = mailer.send(email).await {
                error!("Failed to send sign-up notification: {}", e);
            }
        });
    }
}
