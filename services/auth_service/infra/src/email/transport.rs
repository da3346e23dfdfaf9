//! Provider transports
//!
//! A sealed set of variants sharing the `Mailer` capability. HTTP providers
//! go through reqwest with a bounded timeout; SMTP goes through lettre. Each
//! variant parses its own config record out of the provider row's JSON.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde_json::json;
use shared_error::AppError;
use std::time::Duration;

use auth_service_core::domains::email::domain::{
    model::{
        EmailMessage, EmailProvider, MailgunConfig, PostmarkConfig, ResendConfig, SendGridConfig,
        SmtpConfig,
    },
    service::Mailer,
};

/// One constructed transport per provider row
pub enum ProviderTransport {
    SendGrid { http: reqwest::Client, config: SendGridConfig },
    Postmark { http: reqwest::Client, config: PostmarkConfig },
    Mailgun { http: reqwest::Client, config: MailgunConfig },
    Resend { http: reqwest::Client, config: ResendConfig },
    Smtp { transport: AsyncSmtpTransport<Tokio1Executor> },
}

impl ProviderTransport {
    /// Build the transport for a provider row
    pub fn from_provider(
        provider: &EmailProvider,
        outbound_timeout: Duration,
    ) -> Result<Self, AppError> {
        let http = || {
            reqwest::Client::builder()
                .timeout(outbound_timeout)
                .build()
                .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))
        };

        let config_value = provider.config.0.clone();

        match provider.provider_type.as_str() {
            "sendgrid" => Ok(Self::SendGrid {
                http: http()?,
                config: serde_json::from_value(config_value).map_err(|e| {
                    AppError::Validation(format!("Invalid sendgrid config: {}", e))
                })?,
            }),
            "postmark" => Ok(Self::Postmark {
                http: http()?,
                config: serde_json::from_value(config_value).map_err(|e| {
                    AppError::Validation(format!("Invalid postmark config: {}", e))
                })?,
            }),
            "mailgun" => Ok(Self::Mailgun {
                http: http()?,
                config: serde_json::from_value(config_value).map_err(|e| {
                    AppError::Validation(format!("Invalid mailgun config: {}", e))
                })?,
            }),
            "resend" => Ok(Self::Resend {
                http: http()?,
                config: serde_json::from_value(config_value).map_err(|e| {
                    AppError::Validation(format!("Invalid resend config: {}", e))
                })?,
            }),
            "smtp" => {
                let config: SmtpConfig = serde_json::from_value(config_value)
                    .map_err(|e| AppError::Validation(format!("Invalid smtp config: {}", e)))?;
                Ok(Self::Smtp {
                    transport: build_smtp_transport(&config)?,
                })
            },
            other => Err(AppError::Validation(format!("Unknown provider type: {}", other))),
        }
    }

    fn format_from(message: &EmailMessage) -> String {
        match &message.from_name {
            Some(name) => format!("{} <{}>", name, message.from),
            None => message.from.clone(),
        }
    }
}

fn build_smtp_transport(
    config: &SmtpConfig,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, AppError> {
    let mut builder = if config.use_tls {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host).map_err(|e| {
            AppError::Internal(format!("Failed to create SMTP transport: {}", e))
        })?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
    };

    builder = builder.port(config.port);

    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
    }

    Ok(builder.build())
}

fn build_smtp_message(message: &EmailMessage) -> Result<Message, AppError> {
    let from_mailbox: Mailbox = ProviderTransport::format_from(message)
        .parse()
        .map_err(|e| AppError::Validation(format!("Invalid from address: {}", e)))?;
    let to_mailbox: Mailbox = message
        .to
        .parse()
        .map_err(|e| AppError::Validation(format!("Invalid to address: {}", e)))?;

    let text = message
        .text
        .clone()
        .unwrap_or_else(|| message.html.clone());

    Message::builder()
        .from(from_mailbox)
        .to(to_mailbox)
        .subject(&message.subject)
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(text),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(message.html.clone()),
                ),
        )
        .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))
}

/// Map a non-2xx provider response into EmailSendFailed
async fn check_response(provider: &str, response: reqwest::Response) -> Result<(), AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    tracing::error!(provider = %provider, status = %status, body = %body, "Email provider rejected send");
    Err(AppError::EmailSendFailed(format!(
        "{} returned {}",
        provider, status
    )))
}

#[async_trait]
impl Mailer for ProviderTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        match self {
            Self::SendGrid { http, config } => {
                let mut from = json!({"email": message.from});
                if let Some(name) = &message.from_name {
                    from["name"] = json!(name);
                }
                let mut content = vec![];
                if let Some(text) = &message.text {
                    content.push(json!({"type": "text/plain", "value": text}));
                }
                content.push(json!({"type": "text/html", "value": message.html}));

                let body = json!({
                    "personalizations": [{"to": [{"email": message.to}]}],
                    "from": from,
                    "subject": message.subject,
                    "content": content,
                });

                let response = http
                    .post("https://api.sendgrid.com/v3/mail/send")
                    .bearer_auth(&config.api_key)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| AppError::EmailSendFailed(format!("sendgrid: {}", e)))?;
                check_response("sendgrid", response).await
            },
            Self::Postmark { http, config } => {
                let body = json!({
                    "From": Self::format_from(message),
                    "To": message.to,
                    "Subject": message.subject,
                    "HtmlBody": message.html,
                    "TextBody": message.text,
                });

                let response = http
                    .post("https://api.postmarkapp.com/email")
                    .header("X-Postmark-Server-Token", &config.server_token)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| AppError::EmailSendFailed(format!("postmark: {}", e)))?;
                check_response("postmark", response).await
            },
            Self::Mailgun { http, config } => {
                let mut form = vec![
                    ("from", Self::format_from(message)),
                    ("to", message.to.clone()),
                    ("subject", message.subject.clone()),
                    ("html", message.html.clone()),
                ];
                if let Some(text) = &message.text {
                    form.push(("text", text.clone()));
                }

                let response = http
                    .post(format!(
                        "https://api.mailgun.net/v3/{}/messages",
                        config.domain
                    ))
                    .basic_auth("api", Some(&config.api_key))
                    .form(&form)
                    .send()
                    .await
                    .map_err(|e| AppError::EmailSendFailed(format!("mailgun: {}", e)))?;
                check_response("mailgun", response).await
            },
            Self::Resend { http, config } => {
                let body = json!({
                    "from": Self::format_from(message),
                    "to": [message.to],
                    "subject": message.subject,
                    "html": message.html,
                    "text": message.text,
                });

                let response = http
                    .post("https://api.resend.com/emails")
                    .bearer_auth(&config.api_key)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| AppError::EmailSendFailed(format!("resend: {}", e)))?;
                check_response("resend", response).await
            },
            Self::Smtp { transport } => {
                let smtp_message = build_smtp_message(message)?;
                transport
                    .send(smtp_message)
                    .await
                    .map(|_| ())
                    .map_err(|e| AppError::EmailSendFailed(format!("smtp: {}", e)))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn provider(provider_type: &str, config: serde_json::Value) -> EmailProvider {
        EmailProvider {
            id: Uuid::new_v4(),
            provider_type: provider_type.to_string(),
            config: sqlx::types::Json(config),
            from_email: "noreply@example.com".into(),
            from_name: Some("Example".into()),
            is_default: true,
            is_fallback: false,
            enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_build_each_http_variant() {
        let timeout = Duration::from_secs(10);
        assert!(ProviderTransport::from_provider(
            &provider("sendgrid", json!({"api_key": "sg-key"})),
            timeout
        )
        .is_ok());
        assert!(ProviderTransport::from_provider(
            &provider("postmark", json!({"server_token": "pm-token"})),
            timeout
        )
        .is_ok());
        assert!(ProviderTransport::from_provider(
            &provider("mailgun", json!({"api_key": "mg-key", "domain": "mg.example.com"})),
            timeout
        )
        .is_ok());
        assert!(ProviderTransport::from_provider(
            &provider("resend", json!({"api_key": "re-key"})),
            timeout
        )
        .is_ok());
    }

    #[test]
    fn test_smtp_variant_parses_config() {
        let result = ProviderTransport::from_provider(
            &provider(
                "smtp",
                json!({"host": "smtp.example.com", "port": 587, "username": "u", "password": "p"}),
            ),
            Duration::from_secs(10),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_bad_config_rejected() {
        let result = ProviderTransport::from_provider(
            &provider("sendgrid", json!({"wrong_key": "x"})),
            Duration::from_secs(10),
        );
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = ProviderTransport::from_provider(
            &provider("carrier_pigeon", json!({})),
            Duration::from_secs(10),
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_from_formatting() {
        let message = EmailMessage {
            to: "user@example.com".into(),
            from: "noreply@example.com".into(),
            from_name: Some("Example".into()),
            subject: "Hi".into(),
            html: "<p>Hi</p>".into(),
            text: None,
        };
        assert_eq!(
            ProviderTransport::format_from(&message),
            "Example <noreply@example.com>"
        );

        let bare = EmailMessage {
            from_name: None,
            ..message
        };
        assert_eq!(ProviderTransport::format_from(&bare), "noreply@example.com");
    }
}
