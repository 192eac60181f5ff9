use crate::config::settings::MailConfig;
use crate::error::AppError;
use crate::services::email_templates::{self, DEFAULT_SPONSOR_TEMPLATE, SPONSOR_TEMPLATE};
use crate::services::mailer::{EmailBody, EmailSender, InlineImage, OutgoingEmail};
use crate::services::subscription_service::LOGO_CONTENT_ID;
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;

pub const THANK_YOU_SUBJECT: &str = "Thank you for your sponsorship pledge";

// One month of access costs 29.99, roughly 1 per day
const MONTHLY_PRICE: f64 = 29.99;
const DAYS_PER_MONTH: f64 = 30.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Pledge {
    pub email: String,
    /// Never negative.
    pub amount: f64,
    pub message: Option<String>,
}

impl Pledge {
    pub fn new(email: &str, amount: f64, message: Option<String>) -> Self {
        Self {
            email: email.trim().to_string(),
            amount: amount.max(0.0),
            message: message
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
        }
    }

    pub fn days_of_reassurance(&self) -> i64 {
        (self.amount / (MONTHLY_PRICE / DAYS_PER_MONTH)).round() as i64
    }

    /// Amount as shown to people: no trailing `.0` for whole numbers.
    pub fn display_amount(&self) -> String {
        format!("{}", self.amount)
    }
}

pub struct SponsorshipService {
    mailer: Arc<dyn EmailSender>,
    mail: MailConfig,
}

impl SponsorshipService {
    pub fn new(mailer: Arc<dyn EmailSender>, mail: MailConfig) -> Self {
        Self { mailer, mail }
    }

    /// Notifies the sponsorship team in the background and thanks the donor.
    pub async fn record_pledge(&self, pledge: &Pledge) -> Result<(), AppError> {
        let amount = pledge.display_amount();
        let days = pledge.days_of_reassurance().to_string();

        self.notify_team(pledge);

        let template = email_templates::load_template(
            &self.mail.templates_dir,
            SPONSOR_TEMPLATE,
            DEFAULT_SPONSOR_TEMPLATE,
        )
        .await;
        let html = email_templates::render(&template, &[("amount", &amount), ("days", &days)])?;

        self.mailer
            .send(OutgoingEmail {
                from: self.mail.from_sponsor.clone(),
                to: pledge.email.clone(),
                subject: THANK_YOU_SUBJECT.to_string(),
                body: EmailBody::Html(html),
                inline_image: Some(InlineImage {
                    content_id: LOGO_CONTENT_ID.to_string(),
                    path: PathBuf::from(&self.mail.logo_path),
                }),
            })
            .await?;

        info!("Recorded sponsorship pledge of {} from {}", amount, pledge.email);
        Ok(())
    }

    fn notify_team(&self, pledge: &Pledge) {
        let mailer = self.mailer.clone();
        let amount = pledge.display_amount();
        let email = OutgoingEmail {
            from: self.mail.from_sponsor.clone(),
            to: self.mail.to_sponsor.clone(),
            subject: format!("New sponsorship pledge: £{}", amount),
            body: EmailBody::Text(format!(
                "Donor: {}\nMessage: {}\nAmount: £{}\nEst. days of reassurance: {}",
                pledge.email,
                pledge.message.as_deref().unwrap_or("—"),
                amount,
                pledge.days_of_reassurance()
            )),
            inline_image: None,
        };

        actix_rt::spawn(async move {
            if let Err(e) = mailer.send(email).await {
                error!("Failed to send sponsorship notification: {}", e);
            }
        });
    }
}
