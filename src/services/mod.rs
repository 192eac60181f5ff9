pub mod auth;
pub mod email_templates;
pub mod mailer;
pub mod sponsorship_service;
pub mod subscription_service;
