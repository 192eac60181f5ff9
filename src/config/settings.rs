use std::env;
use crate::error::AppError;
use log::warn;
use serde::{Deserialize, Serialize};

// Default confirmation link lifetime (48 hours)
pub const DEFAULT_CONFIRM_TOKEN_TTL_SECONDS: i64 = 48 * 60 * 60;

// Only ever used outside production
const DEVELOPMENT_SIGNING_SECRET: &str = "dev-secret";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppSettings {
    pub app: AppConfig,
    pub server: ServerConfig,
    pub signing: SigningConfig,
    pub smtp: SmtpConfig,
    pub mail: MailConfig,
    pub debug: DebugConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub environment: String,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    /// Public base URL of the site, without a trailing slash.
    pub site_url: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SigningConfig {
    pub secret: String,
    pub token_ttl_seconds: i64,
}

impl std::fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningConfig")
            .field("secret", &"(redacted)")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    /// `true` for implicit TLS (port 465), `false` for STARTTLS.
    pub secure: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub accept_invalid_certs: bool,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "(set)"))
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MailConfig {
    pub from_updates: String,
    pub from_updates_is_fallback: bool,
    pub to_join: String,
    pub from_sponsor: String,
    pub to_sponsor: String,
    pub templates_dir: String,
    pub logo_path: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Allows `?debug=1` JSON responses and the SMTP diagnostics endpoint.
    pub allow_debug_responses: bool,
}

impl AppSettings {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        // App config
        let app_name = var("APP_NAME").unwrap_or_else(|| "memorym8-site".to_string());
        let environment = var("ENVIRONMENT").unwrap_or_else(|| "development".to_string());
        let app = AppConfig { name: app_name, environment };

        // Server config
        let server_host = var("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let server_port = var("SERVER_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| AppError::Configuration("SERVER_PORT must be a valid port number".to_string()))?;

        // CORS origins
        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let site_url = var("SITE_URL")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        // Signing config
        let secret = match var("SIGNING_SECRET") {
            Some(secret) => secret,
            None if app.is_production() => {
                return Err(AppError::Configuration(
                    "SIGNING_SECRET must be set in production".to_string(),
                ));
            }
            None => {
                warn!("SIGNING_SECRET is not set; using the development signing secret");
                DEVELOPMENT_SIGNING_SECRET.to_string()
            }
        };

        let token_ttl_seconds = match var("CONFIRM_TOKEN_TTL_SECONDS") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|ttl| *ttl > 0)
                .ok_or_else(|| AppError::Configuration(
                    "CONFIRM_TOKEN_TTL_SECONDS must be a positive integer".to_string(),
                ))?,
            None => DEFAULT_CONFIRM_TOKEN_TTL_SECONDS,
        };

        // SMTP config
        let smtp_port = var("SMTP_PORT")
            .unwrap_or_else(|| "587".to_string())
            .parse::<u16>()
            .map_err(|_| AppError::Configuration("SMTP_PORT must be a valid port number".to_string()))?;
        let smtp_username = var("SMTP_USER");

        let smtp = SmtpConfig {
            host: var("SMTP_HOST"),
            port: smtp_port,
            secure: var("SMTP_SECURE").is_some_and(|v| v.trim() == "true"),
            username: smtp_username.clone(),
            password: var("SMTP_PASS"),
            accept_invalid_certs: !app.is_production(),
        };

        // Mail addresses
        let (from_updates, from_updates_is_fallback) = match var("MAIL_FROM_UPDATES") {
            Some(from) => (from, false),
            None => (
                format!("Memory M8 <{}>", smtp_username.as_deref().unwrap_or("")),
                true,
            ),
        };

        let mail = MailConfig {
            from_updates,
            from_updates_is_fallback,
            to_join: var("MAIL_TO_JOIN").unwrap_or_else(|| "join@memorym8.com".to_string()),
            from_sponsor: var("FROM_SPONSOR")
                .unwrap_or_else(|| "Memory M8 Sponsorship <sponsor@memorym8.com>".to_string()),
            to_sponsor: var("SPONSOR_OPS").unwrap_or_else(|| "sponsor@memorym8.com".to_string()),
            templates_dir: var("TEMPLATES_DIR").unwrap_or_else(|| "templates".to_string()),
            logo_path: var("EMAIL_LOGO_PATH").unwrap_or_else(|| "public/logo-email.png".to_string()),
        };

        let allow_debug_responses = var("DEBUG_RESPONSES")
            .is_some_and(|v| matches!(v.trim(), "1" | "true"));
        if allow_debug_responses && app.is_production() {
            warn!("DEBUG_RESPONSES is enabled in production; diagnostic responses expose internal errors");
        }

        Ok(Self {
            app,
            server: ServerConfig {
                host: server_host,
                port: server_port,
                cors_origins,
                site_url,
            },
            signing: SigningConfig {
                secret,
                token_ttl_seconds,
            },
            smtp,
            mail,
            debug: DebugConfig { allow_debug_responses },
        })
    }
}
