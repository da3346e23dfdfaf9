use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domains::email::domain::model::{
    EmailProvider, EmailTemplate, PROVIDER_TYPES, TEMPLATE_TYPES,
};

fn validate_provider_type(provider_type: &str) -> Result<(), ValidationError> {
    if PROVIDER_TYPES.contains(&provider_type) {
        Ok(())
    } else {
        Err(ValidationError::new("provider_type"))
    }
}

fn validate_template_type(template_type: &str) -> Result<(), ValidationError> {
    if TEMPLATE_TYPES.contains(&template_type) {
        Ok(())
    } else {
        Err(ValidationError::new("template_type"))
    }
}

/// Register an email provider
#[derive(Serialize, Deserialize, ToSchema, Validate)]
pub struct EmailProviderReq {
    /// sendgrid, postmark, mailgun, resend or smtp
    #[validate(custom(function = "validate_provider_type"))]
    #[schema(example = "sendgrid")]
    pub provider_type: String,

    /// Provider-specific settings (API key, SMTP host, ...)
    #[schema(value_type = Object)]
    pub config: serde_json::Value,

    #[validate(email)]
    pub from_email: String,

    pub from_name: Option<String>,

    #[serde(default)]
    pub is_default: bool,

    #[serde(default)]
    pub is_fallback: bool,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Provider as returned to admins (config redacted to its keys)
#[derive(Serialize, Deserialize, ToSchema)]
pub struct EmailProviderResp {
    pub id: Uuid,
    pub provider_type: String,
    pub from_email: String,
    pub from_name: Option<String>,
    pub is_default: bool,
    pub is_fallback: bool,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EmailProvider> for EmailProviderResp {
    fn from(p: EmailProvider) -> Self {
        Self {
            id: p.id,
            provider_type: p.provider_type,
            from_email: p.from_email,
            from_name: p.from_name,
            is_default: p.is_default,
            is_fallback: p.is_fallback,
            enabled: p.enabled,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Create or replace an email template
#[derive(Serialize, Deserialize, ToSchema, Validate)]
pub struct EmailTemplateReq {
    /// confirmation, password_reset, welcome, magic_link, email_change or otp
    #[validate(custom(function = "validate_template_type"))]
    #[schema(example = "confirmation")]
    pub template_type: String,

    #[validate(length(min = 1))]
    pub subject: String,

    #[validate(length(min = 1))]
    pub html_body: String,

    pub text_body: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct EmailTemplateResp {
    pub id: Uuid,
    pub project_id: Option<String>,
    pub template_type: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EmailTemplate> for EmailTemplateResp {
    fn from(t: EmailTemplate) -> Self {
        Self {
            id: t.id,
            project_id: t.project_id,
            template_type: t.template_type,
            subject: t.subject,
            html_body: t.html_body,
            text_body: t.text_body,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}
