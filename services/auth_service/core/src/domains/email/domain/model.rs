use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A message handed to a mail transport
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub from: String,
    pub from_name: Option<String>,
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
}

/// Configured email provider row
///
/// `config` holds the provider-specific settings (API key, SMTP host, ...)
/// parsed by the matching transport variant.
#[derive(Debug, Clone, FromRow)]
pub struct EmailProvider {
    pub id: Uuid,
    /// One of: sendgrid, postmark, mailgun, resend, smtp
    pub provider_type: String,
    pub config: sqlx::types::Json<serde_json::Value>,
    pub from_email: String,
    pub from_name: Option<String>,
    pub is_default: bool,
    pub is_fallback: bool,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const PROVIDER_TYPES: &[&str] = &["sendgrid", "postmark", "mailgun", "resend", "smtp"];

/// Stored email template
///
/// System defaults have `project_id = NULL`; a per-project row with the same
/// `template_type` overrides the system one.
#[derive(Debug, Clone, FromRow)]
pub struct EmailTemplate {
    pub id: Uuid,
    pub project_id: Option<String>,
    /// One of: confirmation, password_reset, welcome, magic_link,
    /// email_change, otp
    pub template_type: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const TEMPLATE_TYPES: &[&str] = &[
    "confirmation",
    "password_reset",
    "welcome",
    "magic_link",
    "email_change",
    "otp",
];

/// Typed provider configs; the union tag is the provider row's `type` column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendGridConfig {
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostmarkConfig {
    pub server_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailgunConfig {
    pub api_key: String,
    pub domain: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResendConfig {
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_use_tls")]
    pub use_tls: bool,
}

fn default_use_tls() -> bool {
    true
}
