use crate::config::settings::{AppSettings, SmtpConfig};
use crate::error::AppError;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
#[cfg(test)]
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailBody {
    Text(String),
    Html(String),
}

/// An image embedded in an HTML body and referenced as `cid:{content_id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub content_id: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: EmailBody,
    pub inline_image: Option<InlineImage>,
}

/// Result of probing the mail transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConnectionCheck {
    Verified(bool),
    Unsupported(String),
}

/// Outbound email transport.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError>;

    async fn verify_connection(&self) -> Result<ConnectionCheck, AppError>;
}

/// Picks the transport for the configured environment.
///
/// Production requires `SMTP_HOST`; elsewhere a missing host falls back to
/// logging messages instead of sending them.
pub fn email_sender_from_settings(settings: &AppSettings) -> Result<Arc<dyn EmailSender>, AppError> {
    match settings.smtp.host {
        Some(_) => Ok(Arc::new(SmtpEmailSender::new(&settings.smtp)?)),
        None if settings.app.is_production() => Err(AppError::Configuration(
            "SMTP_HOST must be set in production".to_string(),
        )),
        None => {
            warn!("SMTP_HOST is not set; outgoing email will only be logged");
            Ok(Arc::new(LoggingEmailSender))
        }
    }
}

pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailSender {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let host = config
            .host
            .as_deref()
            .ok_or_else(|| AppError::Configuration("SMTP_HOST must be set".to_string()))?;

        if config.accept_invalid_certs {
            warn!("SMTP transport accepts invalid TLS certificates (non-production only)");
        }

        let tls_parameters = TlsParameters::builder(host.to_string())
            .dangerous_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| AppError::Configuration(format!("Invalid SMTP TLS configuration: {}", e)))?;

        let tls = if config.secure {
            Tls::Wrapper(tls_parameters)
        } else {
            Tls::Opportunistic(tls_parameters)
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(config.port)
            .tls(tls);

        match (&config.username, &config.password) {
            (Some(username), Some(password)) => {
                builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
            }
            (None, None) => {}
            _ => {
                return Err(AppError::Configuration(
                    "SMTP_USER and SMTP_PASS must both be set or both be empty".to_string(),
                ));
            }
        }

        info!("SMTP transport configured for {}:{}", host, config.port);
        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError> {
        let message = build_message(&email).await?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::External(format!("Failed to send email: {}", e)))?;

        info!("Email sent to {} with subject: {}", email.to, email.subject);
        Ok(())
    }

    async fn verify_connection(&self) -> Result<ConnectionCheck, AppError> {
        let connected = self
            .transport
            .test_connection()
            .await
            .map_err(|e| AppError::External(format!("SMTP connection check failed: {}", e)))?;

        if connected {
            Ok(ConnectionCheck::Verified(true))
        } else {
            Err(AppError::External("SMTP server rejected the connection".to_string()))
        }
    }
}

async fn build_message(email: &OutgoingEmail) -> Result<Message, AppError> {
    let from: Mailbox = email
        .from
        .parse()
        .map_err(|e| AppError::Configuration(format!("Invalid from address: {}", e)))?;
    let to: Mailbox = email
        .to
        .parse()
        .map_err(|e| AppError::Validation(format!("Invalid recipient email: {}", e)))?;

    let builder = Message::builder()
        .from(from)
        .to(to)
        .subject(email.subject.clone());

    let inline = match (&email.body, &email.inline_image) {
        (EmailBody::Html(_), Some(image)) => load_inline_image(image).await,
        _ => None,
    };

    let message = match (&email.body, inline) {
        (EmailBody::Text(text), _) => builder.singlepart(SinglePart::plain(text.clone())),
        (EmailBody::Html(html), None) => builder.singlepart(SinglePart::html(html.clone())),
        (EmailBody::Html(html), Some(image)) => builder.multipart(
            MultiPart::related()
                .singlepart(SinglePart::html(html.clone()))
                .singlepart(image),
        ),
    };

    message.map_err(|e| AppError::Internal(format!("Failed to build email message: {}", e)))
}

/// A missing or unreadable image is skipped so the message still goes out.
async fn load_inline_image(image: &InlineImage) -> Option<SinglePart> {
    let bytes = match tokio::fs::read(&image.path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Skipping inline image {}: {}", image.path.display(), e);
            return None;
        }
    };

    let content_type = match ContentType::parse(image_mime_type(&image.path)) {
        Ok(content_type) => content_type,
        Err(e) => {
            warn!("Skipping inline image {}: {}", image.path.display(), e);
            return None;
        }
    };

    Some(Attachment::new_inline(image.content_id.clone()).body(bytes, content_type))
}

fn image_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Development transport: logs messages instead of delivering them.
#[derive(Debug, Default)]
pub struct LoggingEmailSender;

#[async_trait]
impl EmailSender for LoggingEmailSender {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError> {
        info!("Would send email via SMTP:");
        info!("  From: {}", email.from);
        info!("  To: {}", email.to);
        info!("  Subject: {}", email.subject);
        match &email.body {
            EmailBody::Text(text) => debug!("  Text: {}", text),
            EmailBody::Html(html) => debug!("  Html: {}", html),
        }
        Ok(())
    }

    async fn verify_connection(&self) -> Result<ConnectionCheck, AppError> {
        Ok(ConnectionCheck::Unsupported(
            "verify() not supported by this transport".to_string(),
        ))
    }
}

/// Test transport that records every message and can fail on demand.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail_for: Option<String>,
}

#[cfg(test)]
impl RecordingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every send addressed to `recipient`.
    pub fn failing_for(recipient: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_for: Some(recipient.to_string()),
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[cfg(test)]
#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError> {
        if self.fail_for.as_deref() == Some(email.to.as_str()) {
            warn!("RecordingEmailSender: simulating failure for {}", email.to);
            return Err(AppError::External("Mock email send failure".to_string()));
        }

        match self.sent.lock() {
            Ok(mut sent) => sent.push(email),
            Err(poisoned) => poisoned.into_inner().push(email),
        }
        Ok(())
    }

    async fn verify_connection(&self) -> Result<ConnectionCheck, AppError> {
        Ok(ConnectionCheck::Verified(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn settings_from(pairs: &[(&str, &str)]) -> AppSettings {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppSettings::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    fn html_email(to: &str, inline_image: Option<InlineImage>) -> OutgoingEmail {
        OutgoingEmail {
            from: "Memory M8 <updates@memorym8.com>".to_string(),
            to: to.to_string(),
            subject: "Hello".to_string(),
            body: EmailBody::Html("<p>Hi</p><img src=\"cid:mm8logo\" />".to_string()),
            inline_image,
        }
    }

    #[test]
    fn test_production_requires_smtp_host() {
        let settings = settings_from(&[("ENVIRONMENT", "production"), ("SIGNING_SECRET", "s")]);
        assert!(matches!(
            email_sender_from_settings(&settings),
            Err(AppError::Configuration(_))
        ));
    }

    #[test]
    fn test_development_falls_back_to_logging() {
        let settings = settings_from(&[]);
        assert!(email_sender_from_settings(&settings).is_ok());
    }

    #[test]
    fn test_smtp_credentials_must_be_paired() {
        let config = SmtpConfig {
            host: Some("smtp.example.com".to_string()),
            port: 587,
            secure: false,
            username: Some("user".to_string()),
            password: None,
            accept_invalid_certs: true,
        };
        assert!(matches!(SmtpEmailSender::new(&config), Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_image_mime_type() {
        assert_eq!(image_mime_type(Path::new("public/logo-email.png")), "image/png");
        assert_eq!(image_mime_type(Path::new("logo.JPG")), "image/jpeg");
        assert_eq!(image_mime_type(Path::new("logo")), "application/octet-stream");
    }

    #[actix_web::test]
    async fn test_build_message_with_inline_image() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"\x89PNG fake").unwrap();

        let email = html_email(
            "jane@example.com",
            Some(InlineImage {
                content_id: "mm8logo".to_string(),
                path: file.path().to_path_buf(),
            }),
        );
        let formatted = String::from_utf8(build_message(&email).await.unwrap().formatted()).unwrap();
        assert!(formatted.contains("multipart/related"));
        assert!(formatted.contains("<mm8logo>"));
    }

    #[actix_web::test]
    async fn test_build_message_skips_missing_image() {
        let email = html_email(
            "jane@example.com",
            Some(InlineImage {
                content_id: "mm8logo".to_string(),
                path: PathBuf::from("definitely/not/here.png"),
            }),
        );
        let formatted = String::from_utf8(build_message(&email).await.unwrap().formatted()).unwrap();
        assert!(!formatted.contains("multipart/related"));
        assert!(formatted.contains("text/html"));
    }

    #[actix_web::test]
    async fn test_build_message_rejects_bad_recipient() {
        let email = html_email("not an address", None);
        assert!(matches!(build_message(&email).await, Err(AppError::Validation(_))));
    }

    #[actix_web::test]
    async fn test_recording_sender_records_and_fails_on_demand() {
        let sender = RecordingEmailSender::failing_for("ops@memorym8.com");
        sender.send(html_email("jane@example.com", None)).await.unwrap();
        assert!(sender.send(html_email("ops@memorym8.com", None)).await.is_err());

        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "jane@example.com");
    }
}
